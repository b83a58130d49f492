//! Manipulation-resistant price tracking for a two-asset pool.
//!
//! The instantaneous price is `base_reserve / quote_reserve` as an 18 decimal
//! fixed-point number (base units per one quote unit), truncated.
//!
//! The moving average is blended lazily: whenever reserves change or a refresh
//! is requested, the number of blocks since the last blend (`elapsed`) sets the
//! weight of the new observation:
//!
//! ```text
//! alpha = elapsed * 10^18 / (elapsed + HALVING_PERIOD)
//! avg'  = (alpha * min(price, 1) + (10^18 - alpha) * avg) / 10^18
//! ```
//!
//! so the effective half-life stays `HALVING_PERIOD` blocks no matter how
//! irregularly updates arrive. Prices are capped at parity before blending so a
//! single extreme swap cannot drag the average arbitrarily far.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal256, Uint128, Uint256};

use crate::pool::ContractError;

/// Number of blocks after which an observation carries half the weight.
pub const HALVING_PERIOD: u64 = 1000;

/// Returns `base / quote` with 18 decimal places, or `None` while `quote` is zero.
pub fn spot_price(base: Uint128, quote: Uint128) -> Option<Decimal256> {
    if quote.is_zero() {
        return None;
    }
    Decimal256::checked_from_ratio(base, quote).ok()
}

/// Blends `current` into `previous` after `elapsed` blocks.
///
/// The arithmetic runs on the raw 10^18-scaled atomics with one truncating
/// division at the end.
pub fn blend(
    previous: Decimal256,
    current: Decimal256,
    elapsed: u64,
    halving_period: u64,
) -> Result<Decimal256, ContractError> {
    let window = elapsed
        .checked_add(halving_period)
        .ok_or(ContractError::ArithmeticOverflow {})?;
    let alpha = Decimal256::checked_from_ratio(elapsed, window)?.atomics();
    let one = Decimal256::one().atomics();
    let capped = current.min(Decimal256::one()).atomics();

    let weighted_new = alpha.checked_mul(capped)?;
    let weighted_old = one.checked_sub(alpha)?.checked_mul(previous.atomics())?;
    let blended: Uint256 = weighted_new.checked_add(weighted_old)?.checked_div(one)?;

    Ok(Decimal256::new(blended))
}

/// The price state of one pool.
#[cw_serde]
#[derive(Default)]
pub struct PriceTracker {
    /// Spot price after the last reserve change; zero while the quote reserve is empty
    pub current_price: Decimal256,
    /// `None` until the first observation
    pub moving_average_price: Option<Decimal256>,
    /// Block height of the last blend
    pub last_update_height: u64,
}

impl PriceTracker {
    /// Recomputes the spot price from the reserves and blends it into the average.
    ///
    /// Returns `true` if the moving average was written. The first observation seeds the
    /// average with the uncapped spot price; later calls in the same block are no-ops.
    pub fn refresh(
        &mut self,
        base_reserve: Uint128,
        quote_reserve: Uint128,
        height: u64,
    ) -> Result<bool, ContractError> {
        let Some(price) = spot_price(base_reserve, quote_reserve) else {
            self.current_price = Decimal256::zero();
            return Ok(false);
        };
        self.current_price = price;

        match self.moving_average_price {
            None => {
                self.moving_average_price = Some(price);
            }
            Some(average) => {
                let elapsed = height.saturating_sub(self.last_update_height);
                if elapsed == 0 {
                    return Ok(false);
                }
                self.moving_average_price = Some(blend(average, price, elapsed, HALVING_PERIOD)?);
            }
        }
        self.last_update_height = height;

        Ok(true)
    }
}
