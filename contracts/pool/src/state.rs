use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal256, Uint128, Uint256};
use cw_storage_plus::{Item, Map};

use subnet_dex::{
    asset::AssetInfoValidated,
    oracle::PriceTracker,
    pool::{ContractError, Mechanism, Rejection, SwapDirection},
};

use crate::{
    guard::{ControllerHandle, Controllers},
    math::{quote_output, Reserves},
};

/// The whole state of one subnet pool.
#[cw_serde]
pub struct Pool {
    pub netuid: u16,
    pub mechanism: Mechanism,
    pub base: AssetInfoValidated,
    pub quote: AssetInfoValidated,
    pub base_reserve: Uint128,
    /// Quote tokens held by the pool
    pub quote_reserve_in: Uint128,
    /// Quote tokens the pool paid out and that were not sold back yet
    pub quote_reserve_out: Uint128,
    pub minimum_pool_liquidity: Uint128,
    pub price: PriceTracker,
    /// Base token equivalent of every swap so far
    pub total_volume: Uint128,
    pub swap_count: u64,
    pub controllers: Controllers,
    pub creator: Addr,
}

/// Stores the pool record
pub const POOL: Item<Pool> = Item::new("pool");

#[cw_serde]
#[derive(Default)]
pub struct UserStats {
    pub volume: Uint128,
    pub swap_count: u64,
}

/// Swap statistics per trader
pub const USER_STATS: Map<&Addr, UserStats> = Map::new("user_stats");

impl Pool {
    pub fn reserves(&self) -> Reserves {
        Reserves {
            base: self.base_reserve,
            quote: self.quote_reserve_in,
            floor: self.minimum_pool_liquidity,
        }
    }

    /// Returns `(asset paid in, asset paid out)` for a trade in `direction`.
    pub fn assets(&self, direction: SwapDirection) -> (&AssetInfoValidated, &AssetInfoValidated) {
        match direction {
            SwapDirection::BaseToQuote {} => (&self.base, &self.quote),
            SwapDirection::QuoteToBase {} => (&self.quote, &self.base),
        }
    }

    /// What the pool would pay for `amount_in` right now.
    pub fn quote(&self, direction: SwapDirection, amount_in: Uint128) -> Result<Uint128, Rejection> {
        quote_output(self.mechanism, &self.reserves(), direction, amount_in)
    }

    /// Adds to both reserves. Afterwards both must be at or above the minimum pool liquidity,
    /// so the first injection has to seed both sides.
    pub fn inject(
        &mut self,
        _controller: &ControllerHandle,
        base_amount: Uint128,
        quote_amount: Uint128,
    ) -> Result<(), ContractError> {
        if base_amount.is_zero() && quote_amount.is_zero() {
            return Err(ContractError::InvalidZeroAmount {});
        }

        let base_reserve = self.base_reserve.checked_add(base_amount)?;
        let quote_reserve_in = self.quote_reserve_in.checked_add(quote_amount)?;
        if base_reserve < self.minimum_pool_liquidity
            || quote_reserve_in < self.minimum_pool_liquidity
        {
            return Err(ContractError::BelowMinimumLiquidity {
                minimum: self.minimum_pool_liquidity,
            });
        }

        self.base_reserve = base_reserve;
        self.quote_reserve_in = quote_reserve_in;
        Ok(())
    }

    /// Removes from the reserves, never leaving either one below the minimum pool liquidity.
    pub fn withdraw(
        &mut self,
        _controller: &ControllerHandle,
        base_amount: Uint128,
        quote_amount: Uint128,
    ) -> Result<(), ContractError> {
        if base_amount.is_zero() && quote_amount.is_zero() {
            return Err(ContractError::InvalidZeroAmount {});
        }

        let base_reserve = self.remaining_after(self.base_reserve, base_amount)?;
        let quote_reserve_in = self.remaining_after(self.quote_reserve_in, quote_amount)?;

        self.base_reserve = base_reserve;
        self.quote_reserve_in = quote_reserve_in;
        Ok(())
    }

    fn remaining_after(&self, reserve: Uint128, amount: Uint128) -> Result<Uint128, ContractError> {
        if amount.is_zero() {
            return Ok(reserve);
        }
        let remaining =
            reserve
                .checked_sub(amount)
                .map_err(|_| ContractError::InsufficientReserve {
                    requested: amount,
                    available: reserve,
                })?;
        if remaining < self.minimum_pool_liquidity {
            return Err(ContractError::BelowMinimumLiquidity {
                minimum: self.minimum_pool_liquidity,
            });
        }
        Ok(remaining)
    }

    /// Books a priced swap: moves the reserves, the quote circulation and the pool statistics.
    ///
    /// Returns the base token equivalent of the trade, valued at the price before the swap.
    pub fn apply_swap(
        &mut self,
        direction: SwapDirection,
        amount_in: Uint128,
        amount_out: Uint128,
    ) -> Result<Uint128, ContractError> {
        let volume = match direction {
            SwapDirection::BaseToQuote {} => {
                self.base_reserve = self.base_reserve.checked_add(amount_in)?;
                self.quote_reserve_in = self.quote_reserve_in.checked_sub(amount_out)?;
                self.quote_reserve_out = self.quote_reserve_out.checked_add(amount_out)?;
                amount_in
            }
            SwapDirection::QuoteToBase {} => {
                let volume = base_equivalent(amount_in, self.price.current_price);
                self.quote_reserve_in = self.quote_reserve_in.checked_add(amount_in)?;
                self.base_reserve = self.base_reserve.checked_sub(amount_out)?;
                // quote minted elsewhere may be sold in, so circulation bottoms out at zero
                self.quote_reserve_out = self.quote_reserve_out.saturating_sub(amount_in);
                volume
            }
        };

        // statistics saturate instead of failing the trade
        self.total_volume = self.total_volume.saturating_add(volume);
        self.swap_count = self
            .swap_count
            .checked_add(1)
            .ok_or(ContractError::ArithmeticOverflow {})?;

        Ok(volume)
    }

    /// Refreshes the spot price from the reserves and blends the moving average.
    pub fn refresh_price(&mut self, height: u64) -> Result<bool, ContractError> {
        self.price
            .refresh(self.base_reserve, self.quote_reserve_in, height)
    }
}

/// Values `quote_amount` in base tokens at `price` (base per quote), truncated and capped
/// at `Uint128::MAX`.
fn base_equivalent(quote_amount: Uint128, price: Decimal256) -> Uint128 {
    Uint256::from(quote_amount)
        .checked_mul(price.atomics())
        .ok()
        .map(|scaled| scaled / Decimal256::one().atomics())
        .and_then(|volume| Uint128::try_from(volume).ok())
        .unwrap_or(Uint128::MAX)
}

impl UserStats {
    pub fn record(&mut self, volume: Uint128) -> Result<(), ContractError> {
        self.volume = self.volume.saturating_add(volume);
        self.swap_count = self
            .swap_count
            .checked_add(1)
            .ok_or(ContractError::ArithmeticOverflow {})?;
        Ok(())
    }
}
