use anyhow::Result as AnyResult;

use cosmwasm_std::{coin, to_json_binary, Addr, Coin, Empty, Uint128, Uint256};
use cw20::{BalanceResponse, Cw20Coin, Cw20ExecuteMsg, Cw20QueryMsg};
use cw20_base::msg::InstantiateMsg as Cw20BaseInstantiateMsg;
use cw_multi_test::{App, AppResponse, Contract, ContractWrapper, Executor};

use subnet_dex::{
    asset::AssetInfo,
    pool::{
        Cw20HookMsg, ExecuteMsg, InstantiateMsg, LargeTradeWarningResponse, Mechanism,
        PoolHealthResponse, PoolInfoResponse, QueryMsg, SlippageResponse, StatisticsResponse,
        SwapDirection, SwapPreviewResponse, UserStatsResponse, VerifyReservesResponse,
    },
};

use super::hostile;

pub const BASE_DENOM: &str = "utao";
pub const CONTROLLER: &str = "controller";
pub const OWNER_CONTRACT: &str = "ownercontract";
pub const CREATOR: &str = "creator";
pub const ADMIN: &str = "admin";

pub(super) fn contract_pool() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        crate::contract::execute,
        crate::contract::instantiate,
        crate::contract::query,
    )
    .with_reply(crate::contract::reply)
    .with_migrate(crate::contract::migrate);

    Box::new(contract)
}

fn contract_cw20() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );

    Box::new(contract)
}

#[derive(Debug)]
pub struct SuiteBuilder {
    mechanism: Mechanism,
    minimum_pool_liquidity: Uint128,
    native_balances: Vec<(Addr, Vec<Coin>)>,
    quote_balances: Vec<Cw20Coin>,
    hostile_quote: bool,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self {
            mechanism: Mechanism::ConstantProduct {},
            minimum_pool_liquidity: Uint128::new(1_000),
            native_balances: vec![],
            quote_balances: vec![],
            hostile_quote: false,
        }
    }

    pub fn with_mechanism(mut self, mechanism: Mechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    pub fn with_minimum_pool_liquidity(mut self, amount: u128) -> Self {
        self.minimum_pool_liquidity = amount.into();
        self
    }

    pub fn with_base_balance(mut self, addr: &str, amount: u128) -> Self {
        self.native_balances
            .push((Addr::unchecked(addr), vec![coin(amount, BASE_DENOM)]));
        self
    }

    pub fn with_quote_balance(mut self, addr: &str, amount: u128) -> Self {
        self.quote_balances.push(Cw20Coin {
            address: addr.to_owned(),
            amount: amount.into(),
        });
        self
    }

    /// The quote token calls back into the pool whenever it moves tokens, once armed.
    pub fn with_hostile_quote(mut self) -> Self {
        self.hostile_quote = true;
        self
    }

    #[track_caller]
    pub fn build(self) -> Suite {
        let mut app = App::default();

        let native_balances = self.native_balances;
        app.init_modules(|router, _, storage| -> AnyResult<()> {
            for (addr, coins) in native_balances {
                router.bank.init_balance(storage, &addr, coins)?;
            }
            Ok(())
        })
        .unwrap();

        let quote_token = if self.hostile_quote {
            let code_id = app.store_code(hostile::contract_hostile());
            app.instantiate_contract(
                code_id,
                Addr::unchecked(ADMIN),
                &Empty {},
                &[],
                "Hostile token",
                None,
            )
            .unwrap()
        } else {
            let code_id = app.store_code(contract_cw20());
            app.instantiate_contract(
                code_id,
                Addr::unchecked(ADMIN),
                &Cw20BaseInstantiateMsg {
                    name: "Subnet Alpha".to_owned(),
                    symbol: "ALPHA".to_owned(),
                    decimals: 9,
                    initial_balances: self.quote_balances,
                    mint: None,
                    marketing: None,
                },
                &[],
                "Alpha token",
                None,
            )
            .unwrap()
        };

        let pool_code_id = app.store_code(contract_pool());
        let pool = app
            .instantiate_contract(
                pool_code_id,
                Addr::unchecked(CREATOR),
                &InstantiateMsg {
                    netuid: 1,
                    mechanism: self.mechanism,
                    base: AssetInfo::NativeToken(BASE_DENOM.to_owned()),
                    quote: AssetInfo::Cw20Token(quote_token.to_string()),
                    minimum_pool_liquidity: self.minimum_pool_liquidity,
                    controller: CONTROLLER.to_owned(),
                    owner_contract: OWNER_CONTRACT.to_owned(),
                },
                &[],
                "Subnet pool",
                Some(ADMIN.to_owned()),
            )
            .unwrap();

        Suite {
            app,
            pool,
            pool_code_id,
            quote_token,
        }
    }
}

pub struct Suite {
    pub app: App,
    pub pool: Addr,
    pub pool_code_id: u64,
    pub quote_token: Addr,
}

impl Suite {
    pub fn next_block(&mut self, blocks: u64) {
        self.app.update_block(|block| {
            block.height += blocks;
            block.time = block.time.plus_seconds(6 * blocks);
        });
    }

    pub fn block_height(&self) -> u64 {
        self.app.block_info().height
    }

    fn increase_allowance(&mut self, owner: &str, amount: u128) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(owner),
            self.quote_token.clone(),
            &Cw20ExecuteMsg::IncreaseAllowance {
                spender: self.pool.to_string(),
                amount: amount.into(),
                expires: None,
            },
            &[],
        )
    }

    fn base_funds(amount: u128) -> Vec<Coin> {
        if amount == 0 {
            vec![]
        } else {
            vec![coin(amount, BASE_DENOM)]
        }
    }

    /// Grants the pool an allowance for the quote leg and attaches the base leg.
    pub fn inject_liquidity(
        &mut self,
        sender: &str,
        base_amount: u128,
        quote_amount: u128,
    ) -> AnyResult<AppResponse> {
        if quote_amount > 0 {
            self.increase_allowance(sender, quote_amount)?;
        }
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.pool.clone(),
            &ExecuteMsg::InjectLiquidity {
                base_amount: base_amount.into(),
                quote_amount: quote_amount.into(),
            },
            &Self::base_funds(base_amount),
        )
    }

    pub fn withdraw_liquidity(
        &mut self,
        sender: &str,
        base_amount: u128,
        quote_amount: u128,
        recipient: &str,
    ) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.pool.clone(),
            &ExecuteMsg::WithdrawLiquidity {
                base_amount: base_amount.into(),
                quote_amount: quote_amount.into(),
                recipient: recipient.to_owned(),
            },
            &[],
        )
    }

    pub fn swap_base_for_quote(
        &mut self,
        sender: &str,
        amount_in: u128,
        min_amount_out: u128,
        recipient: &str,
    ) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.pool.clone(),
            &ExecuteMsg::SwapBaseForQuote {
                amount_in: amount_in.into(),
                min_amount_out: min_amount_out.into(),
                recipient: recipient.to_owned(),
            },
            &Self::base_funds(amount_in),
        )
    }

    pub fn swap_quote_for_base(
        &mut self,
        sender: &str,
        amount_in: u128,
        min_amount_out: u128,
        recipient: &str,
    ) -> AnyResult<AppResponse> {
        self.increase_allowance(sender, amount_in)?;
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.pool.clone(),
            &ExecuteMsg::SwapQuoteForBase {
                amount_in: amount_in.into(),
                min_amount_out: min_amount_out.into(),
                recipient: recipient.to_owned(),
            },
            &[],
        )
    }

    /// Sells quote tokens through the CW20 `Send` hook.
    pub fn send_quote_for_base(
        &mut self,
        sender: &str,
        amount: u128,
        min_amount_out: u128,
        recipient: Option<&str>,
    ) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.quote_token.clone(),
            &Cw20ExecuteMsg::Send {
                contract: self.pool.to_string(),
                amount: amount.into(),
                msg: to_json_binary(&Cw20HookMsg::Swap {
                    min_amount_out: min_amount_out.into(),
                    recipient: recipient.map(str::to_owned),
                })?,
            },
            &[],
        )
    }

    /// Transfers quote tokens to the pool without going through any pool message.
    pub fn transfer_quote_to_pool(&mut self, sender: &str, amount: u128) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.quote_token.clone(),
            &Cw20ExecuteMsg::Transfer {
                recipient: self.pool.to_string(),
                amount: amount.into(),
            },
            &[],
        )
    }

    pub fn refresh_moving_average_price(&mut self, sender: &str) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.pool.clone(),
            &ExecuteMsg::RefreshMovingAveragePrice {},
            &[],
        )
    }

    pub fn arm_hostile_quote(&mut self) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(ADMIN),
            self.quote_token.clone(),
            &hostile::ExecuteMsg::Arm {},
            &[],
        )
    }

    pub fn query_base_balance(&self, address: &str) -> AnyResult<u128> {
        let balance = self.app.wrap().query_balance(address, BASE_DENOM)?;
        Ok(balance.amount.u128())
    }

    pub fn query_quote_balance(&self, address: &str) -> AnyResult<u128> {
        let balance: BalanceResponse = self.app.wrap().query_wasm_smart(
            self.quote_token.clone(),
            &Cw20QueryMsg::Balance {
                address: address.to_owned(),
            },
        )?;
        Ok(balance.balance.u128())
    }

    pub fn query_pool_info(&self) -> AnyResult<PoolInfoResponse> {
        Ok(self
            .app
            .wrap()
            .query_wasm_smart(self.pool.clone(), &QueryMsg::PoolInfo {})?)
    }

    pub fn query_swap_preview(
        &self,
        direction: SwapDirection,
        amount_in: u128,
    ) -> AnyResult<SwapPreviewResponse> {
        Ok(self.app.wrap().query_wasm_smart(
            self.pool.clone(),
            &QueryMsg::SwapPreview {
                direction,
                amount_in: amount_in.into(),
            },
        )?)
    }

    pub fn query_large_trade_warning(
        &self,
        direction: SwapDirection,
        amount_in: u128,
    ) -> AnyResult<LargeTradeWarningResponse> {
        Ok(self.app.wrap().query_wasm_smart(
            self.pool.clone(),
            &QueryMsg::LargeTradeWarning {
                direction,
                amount_in: amount_in.into(),
            },
        )?)
    }

    pub fn query_slippage(
        &self,
        direction: SwapDirection,
        amount_in: u128,
    ) -> AnyResult<SlippageResponse> {
        Ok(self.app.wrap().query_wasm_smart(
            self.pool.clone(),
            &QueryMsg::Slippage {
                direction,
                amount_in: amount_in.into(),
            },
        )?)
    }

    pub fn query_pool_health(&self) -> AnyResult<PoolHealthResponse> {
        Ok(self
            .app
            .wrap()
            .query_wasm_smart(self.pool.clone(), &QueryMsg::PoolHealth {})?)
    }

    pub fn query_statistics(&self) -> AnyResult<StatisticsResponse> {
        Ok(self
            .app
            .wrap()
            .query_wasm_smart(self.pool.clone(), &QueryMsg::Statistics {})?)
    }

    pub fn query_user_stats(&self, address: &str) -> AnyResult<UserStatsResponse> {
        Ok(self.app.wrap().query_wasm_smart(
            self.pool.clone(),
            &QueryMsg::UserStats {
                address: address.to_owned(),
            },
        )?)
    }

    pub fn query_verify_reserves(&self) -> AnyResult<VerifyReservesResponse> {
        Ok(self
            .app
            .wrap()
            .query_wasm_smart(self.pool.clone(), &QueryMsg::VerifyReserves {})?)
    }

    pub fn query_constant_product_k(&self) -> AnyResult<Uint256> {
        Ok(self
            .app
            .wrap()
            .query_wasm_smart(self.pool.clone(), &QueryMsg::ConstantProductK {})?)
    }
}
