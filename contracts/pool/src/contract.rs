use cosmwasm_std::{
    attr, entry_point, from_json, to_json_binary, Addr, Binary, CosmosMsg, Deps, DepsMut, Env,
    Event, MessageInfo, Reply, Response, StdError, StdResult, Uint128, Uint256,
};
use cw2::{get_contract_version, set_contract_version};
use cw20::Cw20ReceiveMsg;
use cw_utils::nonpayable;
use semver::Version;

use subnet_dex::{
    asset::{assert_sent_native_funds, AssetInfoValidated},
    pool::{
        ContractError, Cw20HookMsg, ExecuteMsg, InstantiateMsg, LargeTradeWarningResponse,
        MigrateMsg, PoolHealthResponse, PoolInfoResponse, QueryMsg, SlippageResponse,
        StatisticsResponse, SwapDirection, SwapPreviewResponse, SwapResponse, UserStatsResponse,
        VerifyReservesResponse,
    },
};

use crate::{
    guard::{
        acquire_lock, pool_health, release_lock, transfers_releasing_lock, Controllers,
        RELEASE_LOCK_REPLY_ID,
    },
    math::{classify_trade, slippage},
    state::{Pool, POOL, USER_STATS},
};

/// Contract name that is used for migration.
const CONTRACT_NAME: &str = "subnet-pool";
/// Contract version that is used for migration.
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new contract with the specified parameters in the [`InstantiateMsg`].
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    if msg.minimum_pool_liquidity.is_zero() {
        return Err(ContractError::InvalidZeroAmount {});
    }
    if msg.controller.is_empty() || msg.owner_contract.is_empty() {
        return Err(ContractError::InvalidZeroAddress {});
    }

    let base = msg.base.validate(deps.api)?;
    let quote = msg.quote.validate(deps.api)?;
    if base == quote {
        return Err(ContractError::DoublingAssets {});
    }

    let controllers = Controllers {
        controller: deps.api.addr_validate(&msg.controller)?,
        owner_contract: deps.api.addr_validate(&msg.owner_contract)?,
    };

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let pool = Pool {
        netuid: msg.netuid,
        mechanism: msg.mechanism,
        base,
        quote,
        base_reserve: Uint128::zero(),
        quote_reserve_in: Uint128::zero(),
        quote_reserve_out: Uint128::zero(),
        minimum_pool_liquidity: msg.minimum_pool_liquidity,
        price: Default::default(),
        total_volume: Uint128::zero(),
        swap_count: 0,
        controllers,
        creator: info.sender,
    };
    POOL.save(deps.storage, &pool)?;
    release_lock(deps.storage)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "instantiate"),
        attr("netuid", pool.netuid.to_string()),
        attr("mechanism", pool.mechanism.to_string()),
        attr("base", pool.base.to_string()),
        attr("quote", pool.quote.to_string()),
        attr("creator", pool.creator.as_str()),
    ]))
}

/// Exposes all the execute functions available in the contract.
///
/// ## Variants
/// * **ExecuteMsg::Receive(msg)** Receives a message of type [`Cw20ReceiveMsg`] and swaps
/// the received tokens.
///
/// * **ExecuteMsg::InjectLiquidity { base_amount, quote_amount }** Adds reserves. Controller only.
///
/// * **ExecuteMsg::WithdrawLiquidity { base_amount, quote_amount, recipient }** Removes reserves.
/// Controller only.
///
/// * **ExecuteMsg::SwapBaseForQuote { .. }** and **ExecuteMsg::SwapQuoteForBase { .. }**
/// Swap tokens pulled from the sender.
///
/// * **ExecuteMsg::RefreshMovingAveragePrice {}** Blends the current price into the average.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Receive(msg) => receive_cw20(deps, env, info, msg),
        ExecuteMsg::InjectLiquidity {
            base_amount,
            quote_amount,
        } => inject_liquidity(deps, env, info, base_amount, quote_amount),
        ExecuteMsg::WithdrawLiquidity {
            base_amount,
            quote_amount,
            recipient,
        } => withdraw_liquidity(deps, env, info, base_amount, quote_amount, recipient),
        ExecuteMsg::SwapBaseForQuote {
            amount_in,
            min_amount_out,
            recipient,
        } => {
            let sender = info.sender.clone();
            swap(
                deps,
                env,
                sender,
                SwapDirection::BaseToQuote {},
                amount_in,
                min_amount_out,
                recipient,
                Payment::Pull(&info),
            )
        }
        ExecuteMsg::SwapQuoteForBase {
            amount_in,
            min_amount_out,
            recipient,
        } => {
            let sender = info.sender.clone();
            swap(
                deps,
                env,
                sender,
                SwapDirection::QuoteToBase {},
                amount_in,
                min_amount_out,
                recipient,
                Payment::Pull(&info),
            )
        }
        ExecuteMsg::RefreshMovingAveragePrice {} => refresh_moving_average_price(deps, env, info),
    }
}

/// Runs `operation` while holding the pool lock.
///
/// The token transfers it returns are dispatched so that the lock is only released after
/// the last one has settled. On error the lock is released right away.
fn locked<F>(mut deps: DepsMut, operation: F) -> Result<Response, ContractError>
where
    F: FnOnce(DepsMut) -> Result<(Response, Vec<CosmosMsg>), ContractError>,
{
    acquire_lock(deps.storage)?;

    match operation(deps.branch()) {
        Ok((response, transfers)) => {
            let submsgs = transfers_releasing_lock(deps.storage, transfers)?;
            Ok(response.add_submessages(submsgs))
        }
        Err(err) => {
            release_lock(deps.storage)?;
            Err(err)
        }
    }
}

/// Receives a message of type [`Cw20ReceiveMsg`] and processes it depending on the received template.
///
/// The tokens already sit in the pool's balance when this is called, so nothing is pulled.
pub fn receive_cw20(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    match from_json(&cw20_msg.msg)? {
        Cw20HookMsg::Swap {
            min_amount_out,
            recipient,
        } => {
            // Only one of the pool's own token contracts can execute this message
            let pool = POOL.load(deps.storage)?;
            let token = AssetInfoValidated::Cw20Token(info.sender.clone());
            let direction = if token == pool.base {
                SwapDirection::BaseToQuote {}
            } else if token == pool.quote {
                SwapDirection::QuoteToBase {}
            } else {
                return Err(ContractError::InvalidAsset(info.sender.to_string()));
            };

            let sender = deps.api.addr_validate(&cw20_msg.sender)?;
            let recipient = recipient.unwrap_or_else(|| sender.to_string());
            swap(
                deps,
                env,
                sender,
                direction,
                cw20_msg.amount,
                min_amount_out,
                recipient,
                Payment::Received,
            )
        }
    }
}

/// Adds reserves. CW20 legs are pulled from the sender, who must have granted an allowance;
/// native legs must be attached to the message.
pub fn inject_liquidity(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    base_amount: Uint128,
    quote_amount: Uint128,
) -> Result<Response, ContractError> {
    if base_amount.is_zero() && quote_amount.is_zero() {
        return Err(ContractError::InvalidZeroAmount {});
    }

    locked(deps, |deps| {
        let mut pool = POOL.load(deps.storage)?;
        let controller = pool.controllers.authorize(&info.sender)?;
        assert_sent_native_funds(
            &info,
            &[(&pool.base, base_amount), (&pool.quote, quote_amount)],
        )?;

        pool.inject(&controller, base_amount, quote_amount)?;
        let averaged = pool.refresh_price(env.block.height)?;
        POOL.save(deps.storage, &pool)?;

        let mut transfers = vec![];
        for (asset, amount) in [(&pool.base, base_amount), (&pool.quote, quote_amount)] {
            if amount.is_zero() {
                continue;
            }
            if let Some(msg) = asset.collect_msg(&info.sender, &env.contract.address, amount)? {
                transfers.push(msg);
            }
        }

        let response = Response::new()
            .add_attribute("action", "inject_liquidity")
            .add_event(
                Event::new("liquidity_injected")
                    .add_attribute("sender", info.sender.as_str())
                    .add_attribute("base_amount", base_amount)
                    .add_attribute("quote_amount", quote_amount),
            )
            .add_event(reserves_event(&pool))
            .add_event(price_event(&pool, averaged));

        Ok((response, transfers))
    })
}

/// Removes reserves and sends them to `recipient`.
pub fn withdraw_liquidity(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    base_amount: Uint128,
    quote_amount: Uint128,
    recipient: String,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;
    if base_amount.is_zero() && quote_amount.is_zero() {
        return Err(ContractError::InvalidZeroAmount {});
    }
    if recipient.is_empty() {
        return Err(ContractError::InvalidZeroAddress {});
    }
    let recipient = deps.api.addr_validate(&recipient)?;

    locked(deps, |deps| {
        let mut pool = POOL.load(deps.storage)?;
        let controller = pool.controllers.authorize(&info.sender)?;

        pool.withdraw(&controller, base_amount, quote_amount)?;
        let averaged = pool.refresh_price(env.block.height)?;
        POOL.save(deps.storage, &pool)?;

        let mut transfers = vec![];
        for (asset, amount) in [(&pool.base, base_amount), (&pool.quote, quote_amount)] {
            if !amount.is_zero() {
                transfers.push(asset.transfer_msg(&recipient, amount)?);
            }
        }

        let response = Response::new()
            .add_attribute("action", "withdraw_liquidity")
            .add_event(
                Event::new("liquidity_withdrawn")
                    .add_attribute("sender", info.sender.as_str())
                    .add_attribute("recipient", recipient.as_str())
                    .add_attribute("base_amount", base_amount)
                    .add_attribute("quote_amount", quote_amount),
            )
            .add_event(reserves_event(&pool))
            .add_event(price_event(&pool, averaged));

        Ok((response, transfers))
    })
}

/// How the input of a swap reaches the pool.
enum Payment<'a> {
    /// CW20 input is pulled from the sender with `TransferFrom`; native input is attached
    Pull(&'a MessageInfo),
    /// CW20 input already arrived through a `Send` hook
    Received,
}

/// Sells `amount_in` of one pool asset for the other and sends the output to `recipient`.
#[allow(clippy::too_many_arguments)]
fn swap(
    deps: DepsMut,
    env: Env,
    sender: Addr,
    direction: SwapDirection,
    amount_in: Uint128,
    min_amount_out: Uint128,
    recipient: String,
    payment: Payment,
) -> Result<Response, ContractError> {
    if amount_in.is_zero() {
        return Err(ContractError::InvalidZeroAmount {});
    }
    if recipient.is_empty() {
        return Err(ContractError::InvalidZeroAddress {});
    }
    let recipient = deps.api.addr_validate(&recipient)?;

    locked(deps, |deps| {
        let mut pool = POOL.load(deps.storage)?;
        let (asset_in, asset_out) = pool.assets(direction);
        let (asset_in, asset_out) = (asset_in.clone(), asset_out.clone());

        let mut transfers = vec![];
        match payment {
            Payment::Pull(info) => {
                assert_sent_native_funds(info, &[(&asset_in, amount_in)])?;
                if let Some(msg) = asset_in.collect_msg(&sender, &env.contract.address, amount_in)? {
                    transfers.push(msg);
                }
            }
            Payment::Received => {}
        }

        let amount_out = pool.quote(direction, amount_in)?;
        if amount_out < min_amount_out {
            return Err(ContractError::SlippageExceeded {
                amount_out,
                min_amount_out,
            });
        }

        let volume = pool.apply_swap(direction, amount_in, amount_out)?;
        let averaged = pool.refresh_price(env.block.height)?;
        POOL.save(deps.storage, &pool)?;

        let mut stats = USER_STATS
            .may_load(deps.storage, &sender)?
            .unwrap_or_default();
        stats.record(volume)?;
        USER_STATS.save(deps.storage, &sender, &stats)?;

        transfers.push(asset_out.transfer_msg(&recipient, amount_out)?);

        let response = Response::new()
            .add_attribute("action", "swap")
            .add_event(
                Event::new("swap_executed")
                    .add_attribute("direction", direction.to_string())
                    .add_attribute("sender", sender.as_str())
                    .add_attribute("recipient", recipient.as_str())
                    .add_attribute("amount_in", amount_in)
                    .add_attribute("amount_out", amount_out)
                    .add_attribute("price", pool.price.current_price.to_string()),
            )
            .add_event(reserves_event(&pool))
            .add_event(price_event(&pool, averaged))
            .set_data(to_json_binary(&SwapResponse { amount_out })?);

        Ok((response, transfers))
    })
}

/// Blends the current price into the moving average. Anyone may call this.
pub fn refresh_moving_average_price(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    locked(deps, |deps| {
        let mut pool = POOL.load(deps.storage)?;
        let averaged = pool.refresh_price(env.block.height)?;
        POOL.save(deps.storage, &pool)?;

        let response = Response::new()
            .add_attribute("action", "refresh_moving_average_price")
            .add_attribute("updated", averaged.to_string())
            .add_event(price_event(&pool, averaged));

        Ok((response, vec![]))
    })
}

fn reserves_event(pool: &Pool) -> Event {
    Event::new("reserves_updated")
        .add_attribute("base_reserve", pool.base_reserve)
        .add_attribute("quote_reserve_in", pool.quote_reserve_in)
        .add_attribute("quote_reserve_out", pool.quote_reserve_out)
}

/// Emitted on every reserve change. `averaged` tells whether the moving average moved too.
fn price_event(pool: &Pool, averaged: bool) -> Event {
    let moving_average = pool
        .price
        .moving_average_price
        .map(|price| price.to_string())
        .unwrap_or_default();

    Event::new("price_updated")
        .add_attribute("current_price", pool.price.current_price.to_string())
        .add_attribute("moving_average_price", moving_average)
        .add_attribute("averaged", averaged.to_string())
        .add_attribute("height", pool.price.last_update_height.to_string())
}

/// The entry point to the contract for processing replies from submessages.
///
/// The only reply the pool asks for comes after the last token transfer of a locked call.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.id {
        RELEASE_LOCK_REPLY_ID => {
            release_lock(deps.storage)?;
            Ok(Response::new().add_attribute("action", "release_lock"))
        }
        id => Err(ContractError::UnknownReply(id)),
    }
}

/// Exposes all the queries available in the contract.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::PoolInfo {} => to_json_binary(&query_pool_info(deps)?),
        QueryMsg::SwapPreview {
            direction,
            amount_in,
        } => to_json_binary(&query_swap_preview(deps, direction, amount_in)?),
        QueryMsg::LargeTradeWarning {
            direction,
            amount_in,
        } => to_json_binary(&query_large_trade_warning(deps, direction, amount_in)?),
        QueryMsg::Slippage {
            direction,
            amount_in,
        } => to_json_binary(&query_slippage(deps, direction, amount_in)?),
        QueryMsg::PoolHealth {} => to_json_binary(&query_pool_health(deps)?),
        QueryMsg::Statistics {} => to_json_binary(&query_statistics(deps)?),
        QueryMsg::UserStats { address } => to_json_binary(&query_user_stats(deps, address)?),
        QueryMsg::VerifyReserves {} => to_json_binary(&query_verify_reserves(deps, env)?),
        QueryMsg::ConstantProductK {} => to_json_binary(&query_constant_product_k(deps)?),
    }
}

pub fn query_pool_info(deps: Deps) -> StdResult<PoolInfoResponse> {
    let pool = POOL.load(deps.storage)?;

    Ok(PoolInfoResponse {
        netuid: pool.netuid,
        mechanism: pool.mechanism,
        base: pool.base,
        quote: pool.quote,
        base_reserve: pool.base_reserve,
        quote_reserve_in: pool.quote_reserve_in,
        quote_reserve_out: pool.quote_reserve_out,
        minimum_pool_liquidity: pool.minimum_pool_liquidity,
        current_price: pool.price.current_price,
        moving_average_price: pool.price.moving_average_price,
        last_price_update_height: pool.price.last_update_height,
        controller: pool.controllers.controller,
        owner_contract: pool.controllers.owner_contract,
        creator: pool.creator,
    })
}

/// Returns what a swap would pay right now. A rejected trade previews as zero output
/// together with the reason.
pub fn query_swap_preview(
    deps: Deps,
    direction: SwapDirection,
    amount_in: Uint128,
) -> StdResult<SwapPreviewResponse> {
    let pool = POOL.load(deps.storage)?;

    let (amount_out, rejection) = match pool.quote(direction, amount_in) {
        Ok(amount_out) => (amount_out, None),
        Err(rejection) => (Uint128::zero(), Some(rejection)),
    };

    Ok(SwapPreviewResponse {
        direction,
        amount_in,
        amount_out,
        rejection,
    })
}

pub fn query_large_trade_warning(
    deps: Deps,
    direction: SwapDirection,
    amount_in: Uint128,
) -> StdResult<LargeTradeWarningResponse> {
    let pool = POOL.load(deps.storage)?;
    let (input_reserve, _) = pool.reserves().sides(direction);
    let (size, reserve_share) = classify_trade(amount_in, input_reserve);

    Ok(LargeTradeWarningResponse {
        size,
        reserve_share,
    })
}

pub fn query_slippage(
    deps: Deps,
    direction: SwapDirection,
    amount_in: Uint128,
) -> StdResult<SlippageResponse> {
    let pool = POOL.load(deps.storage)?;
    slippage(pool.mechanism, &pool.reserves(), direction, amount_in)
}

pub fn query_pool_health(deps: Deps) -> StdResult<PoolHealthResponse> {
    let pool = POOL.load(deps.storage)?;
    Ok(pool_health(&pool))
}

pub fn query_statistics(deps: Deps) -> StdResult<StatisticsResponse> {
    let pool = POOL.load(deps.storage)?;

    Ok(StatisticsResponse {
        total_volume: pool.total_volume,
        swap_count: pool.swap_count,
    })
}

pub fn query_user_stats(deps: Deps, address: String) -> StdResult<UserStatsResponse> {
    let address = deps.api.addr_validate(&address)?;
    let stats = USER_STATS
        .may_load(deps.storage, &address)?
        .unwrap_or_default();

    Ok(UserStatsResponse {
        volume: stats.volume,
        swap_count: stats.swap_count,
    })
}

/// Compares the recorded reserves with the balances the pool actually holds.
///
/// Tokens sent to the pool outside of inject and swap show up here as a mismatch.
pub fn query_verify_reserves(deps: Deps, env: Env) -> StdResult<VerifyReservesResponse> {
    let pool = POOL.load(deps.storage)?;
    let actual_base = pool
        .base
        .query_balance(&deps.querier, &env.contract.address)?;
    let actual_quote = pool
        .quote
        .query_balance(&deps.querier, &env.contract.address)?;

    Ok(VerifyReservesResponse {
        recorded_base: pool.base_reserve,
        actual_base,
        recorded_quote: pool.quote_reserve_in,
        actual_quote,
        base_matches: pool.base_reserve == actual_base,
        quote_matches: pool.quote_reserve_in == actual_quote,
    })
}

pub fn query_constant_product_k(deps: Deps) -> StdResult<Uint256> {
    let pool = POOL.load(deps.storage)?;
    Ok(pool.base_reserve.full_mul(pool.quote_reserve_in))
}

/// Manages the contract migration.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::CannotMigrate {
            previous_contract: stored.contract,
            previous_version: stored.version,
        });
    }

    let parse = |version: &str| {
        version
            .parse::<Version>()
            .map_err(|err| StdError::generic_err(err.to_string()))
    };
    if parse(&stored.version)? > parse(CONTRACT_VERSION)? {
        return Err(ContractError::CannotMigrate {
            previous_contract: stored.contract,
            previous_version: stored.version,
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "migrate"),
        attr("previous_version", stored.version),
        attr("new_version", CONTRACT_VERSION),
    ]))
}
