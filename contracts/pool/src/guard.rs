use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, CosmosMsg, StdResult, Storage, SubMsg};
use cw_storage_plus::Item;

use subnet_dex::pool::{ContractError, PoolHealthResponse};

use crate::state::Pool;

/// Set while a reserve-changing call is in flight, including its token transfers.
pub const LOCK: Item<bool> = Item::new("lock");

/// A `reply` call code ID used to release [`LOCK`] after the last token transfer settled.
pub const RELEASE_LOCK_REPLY_ID: u64 = 1;

/// The two addresses allowed to move reserves. Fixed at instantiation.
#[cw_serde]
pub struct Controllers {
    pub controller: Addr,
    pub owner_contract: Addr,
}

/// Proof that the sender of the current message is one of the [`Controllers`].
///
/// Only [`Controllers::authorize`] can create it, and every reserve-changing
/// method on [`Pool`] takes one.
#[derive(Debug)]
pub struct ControllerHandle {
    _private: (),
}

impl Controllers {
    pub fn authorize(&self, sender: &Addr) -> Result<ControllerHandle, ContractError> {
        if *sender == self.controller || *sender == self.owner_contract {
            Ok(ControllerHandle { _private: () })
        } else {
            Err(ContractError::Unauthorized {})
        }
    }
}

pub fn acquire_lock(storage: &mut dyn Storage) -> Result<(), ContractError> {
    if LOCK.may_load(storage)?.unwrap_or_default() {
        return Err(ContractError::Reentrancy {});
    }
    LOCK.save(storage, &true)?;
    Ok(())
}

pub fn release_lock(storage: &mut dyn Storage) -> StdResult<()> {
    LOCK.save(storage, &false)
}

/// Turns the token transfers of a locked call into sub-messages.
///
/// The last transfer replies with [`RELEASE_LOCK_REPLY_ID`], so the lock stays held
/// until every transfer has executed. A call without transfers releases it right away.
pub fn transfers_releasing_lock(
    storage: &mut dyn Storage,
    transfers: Vec<CosmosMsg>,
) -> StdResult<Vec<SubMsg>> {
    if transfers.is_empty() {
        release_lock(storage)?;
        return Ok(vec![]);
    }

    let last = transfers.len() - 1;
    Ok(transfers
        .into_iter()
        .enumerate()
        .map(|(i, msg)| {
            if i == last {
                SubMsg::reply_on_success(msg, RELEASE_LOCK_REPLY_ID)
            } else {
                SubMsg::new(msg)
            }
        })
        .collect())
}

/// A pool is healthy while both reserves are at or above the minimum pool liquidity.
pub fn pool_health(pool: &Pool) -> PoolHealthResponse {
    let base_healthy = pool.base_reserve >= pool.minimum_pool_liquidity;
    let quote_healthy = pool.quote_reserve_in >= pool.minimum_pool_liquidity;

    PoolHealthResponse {
        healthy: base_healthy && quote_healthy,
        base_healthy,
        quote_healthy,
        base_reserve: pool.base_reserve,
        quote_reserve_in: pool.quote_reserve_in,
        minimum_pool_liquidity: pool.minimum_pool_liquidity,
    }
}
