use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, Api, BankMsg, Coin, CosmosMsg, MessageInfo, QuerierWrapper, StdResult,
    Uint128, WasmMsg,
};
use cw20::Cw20ExecuteMsg;
use cw_utils::PaymentError;

use crate::pool::ContractError;
use crate::querier::{query_balance, query_token_balance};

/// This enum describes a token account the pool trades, before address validation.
#[cw_serde]
pub enum AssetInfo {
    /// CW20 token contract address
    Cw20Token(String),
    /// Native bank denom
    NativeToken(String),
}

impl AssetInfo {
    /// Returns [`AssetInfoValidated`] with the CW20 address checked against the chain's bech32 rules.
    pub fn validate(&self, api: &dyn Api) -> Result<AssetInfoValidated, ContractError> {
        match self {
            AssetInfo::Cw20Token(contract_addr) => {
                if contract_addr.is_empty() {
                    return Err(ContractError::InvalidZeroAddress {});
                }
                Ok(AssetInfoValidated::Cw20Token(
                    api.addr_validate(contract_addr)?,
                ))
            }
            AssetInfo::NativeToken(denom) => {
                if denom.is_empty() {
                    return Err(ContractError::InvalidZeroAddress {});
                }
                Ok(AssetInfoValidated::NativeToken(denom.clone()))
            }
        }
    }
}

/// A validated token account. This is what the pool stores.
#[cw_serde]
pub enum AssetInfoValidated {
    Cw20Token(Addr),
    NativeToken(String),
}

impl fmt::Display for AssetInfoValidated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetInfoValidated::Cw20Token(addr) => write!(f, "{addr}"),
            AssetInfoValidated::NativeToken(denom) => write!(f, "{denom}"),
        }
    }
}

impl AssetInfoValidated {
    /// Returns the balance `account` holds of this asset.
    pub fn query_balance(&self, querier: &QuerierWrapper, account: &Addr) -> StdResult<Uint128> {
        match self {
            AssetInfoValidated::Cw20Token(contract_addr) => {
                query_token_balance(querier, contract_addr, account)
            }
            AssetInfoValidated::NativeToken(denom) => query_balance(querier, account, denom),
        }
    }

    /// Message pushing `amount` of this asset from the pool to `recipient`.
    pub fn transfer_msg(&self, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
        Ok(match self {
            AssetInfoValidated::Cw20Token(contract_addr) => CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr: contract_addr.to_string(),
                msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                    recipient: recipient.to_string(),
                    amount,
                })?,
                funds: vec![],
            }),
            AssetInfoValidated::NativeToken(denom) => CosmosMsg::Bank(BankMsg::Send {
                to_address: recipient.to_string(),
                amount: vec![Coin {
                    denom: denom.clone(),
                    amount,
                }],
            }),
        })
    }

    /// Message pulling `amount` of this asset from `owner` into `pool`.
    ///
    /// CW20 tokens are pulled with a `TransferFrom`, which needs a prior allowance.
    /// Native tokens travel with the call itself (see [`assert_sent_native_funds`]),
    /// so no message is produced for them.
    pub fn collect_msg(
        &self,
        owner: &Addr,
        pool: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<CosmosMsg>> {
        match self {
            AssetInfoValidated::Cw20Token(contract_addr) => {
                Ok(Some(CosmosMsg::Wasm(WasmMsg::Execute {
                    contract_addr: contract_addr.to_string(),
                    msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
                        owner: owner.to_string(),
                        recipient: pool.to_string(),
                        amount,
                    })?,
                    funds: vec![],
                })))
            }
            AssetInfoValidated::NativeToken(_) => Ok(None),
        }
    }
}

/// Checks that the native funds attached to `info` are exactly the native legs of `expected`.
///
/// Any attached denom that is not expected fails with [`PaymentError::ExtraDenom`];
/// a native leg whose attached amount differs fails with [`ContractError::AssetMismatch`].
/// CW20 legs in `expected` are ignored.
pub fn assert_sent_native_funds(
    info: &MessageInfo,
    expected: &[(&AssetInfoValidated, Uint128)],
) -> Result<(), ContractError> {
    let expected_native = || {
        expected.iter().filter_map(|(asset, amount)| match asset {
            AssetInfoValidated::NativeToken(denom) => Some((denom, *amount)),
            AssetInfoValidated::Cw20Token(_) => None,
        })
    };

    if let Some(stray) = info
        .funds
        .iter()
        .find(|coin| !expected_native().any(|(denom, _)| *denom == coin.denom))
    {
        return Err(PaymentError::ExtraDenom(stray.denom.clone()).into());
    }

    for (denom, amount) in expected_native() {
        let sent: Uint128 = info
            .funds
            .iter()
            .filter(|coin| coin.denom == *denom)
            .map(|coin| coin.amount)
            .sum();
        if sent != amount {
            return Err(ContractError::AssetMismatch {
                expected: amount,
                sent,
            });
        }
    }

    Ok(())
}
