use cosmwasm_std::{Decimal, StdResult, Uint128, Uint256};

use subnet_dex::pool::{Mechanism, Rejection, SlippageResponse, SwapDirection, TradeSize};

/// Snapshot of the quantities every quote depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub base: Uint128,
    pub quote: Uint128,
    /// Minimum pool liquidity
    pub floor: Uint128,
}

impl Reserves {
    /// Returns `(input reserve, output reserve)` for a trade in `direction`.
    pub fn sides(&self, direction: SwapDirection) -> (Uint128, Uint128) {
        match direction {
            SwapDirection::BaseToQuote {} => (self.base, self.quote),
            SwapDirection::QuoteToBase {} => (self.quote, self.base),
        }
    }
}

/// Quote tokens paid out for `amount_in` base tokens.
pub fn quote_output_for_base_input(
    mechanism: Mechanism,
    reserves: &Reserves,
    amount_in: Uint128,
) -> Result<Uint128, Rejection> {
    compute_output(
        mechanism,
        reserves.base,
        reserves.quote,
        reserves.floor,
        amount_in,
    )
}

/// Base tokens paid out for `amount_in` quote tokens.
pub fn quote_output_for_quote_input(
    mechanism: Mechanism,
    reserves: &Reserves,
    amount_in: Uint128,
) -> Result<Uint128, Rejection> {
    compute_output(
        mechanism,
        reserves.quote,
        reserves.base,
        reserves.floor,
        amount_in,
    )
}

pub fn quote_output(
    mechanism: Mechanism,
    reserves: &Reserves,
    direction: SwapDirection,
    amount_in: Uint128,
) -> Result<Uint128, Rejection> {
    match direction {
        SwapDirection::BaseToQuote {} => quote_output_for_base_input(mechanism, reserves, amount_in),
        SwapDirection::QuoteToBase {} => {
            quote_output_for_quote_input(mechanism, reserves, amount_in)
        }
    }
}

fn compute_output(
    mechanism: Mechanism,
    input_reserve: Uint128,
    output_reserve: Uint128,
    floor: Uint128,
    amount_in: Uint128,
) -> Result<Uint128, Rejection> {
    if amount_in.is_zero() {
        return Err(Rejection::ZeroInput);
    }
    if input_reserve.is_zero() || output_reserve.is_zero() {
        return Err(Rejection::EmptyPool);
    }

    let amount_out = match mechanism {
        Mechanism::FixedRatio {} => amount_in,
        Mechanism::ConstantProduct {} => {
            // k fits: the product of two u128 values never exceeds 256 bits
            let k = input_reserve.full_mul(output_reserve);
            let new_input = input_reserve
                .checked_add(amount_in)
                .map_err(|_| Rejection::Overflow)?;
            let new_output = k
                .checked_div(Uint256::from(new_input))
                .map_err(|_| Rejection::Overflow)?;
            let new_output = Uint128::try_from(new_output).map_err(|_| Rejection::Overflow)?;

            if new_output < floor {
                return Err(Rejection::BelowFloor);
            }
            output_reserve
                .checked_sub(new_output)
                .map_err(|_| Rejection::ExceedsReserve)?
        }
    };

    if amount_out > output_reserve {
        return Err(Rejection::ExceedsReserve);
    }
    if output_reserve - amount_out < floor {
        return Err(Rejection::BelowFloor);
    }
    if amount_out.is_zero() {
        return Err(Rejection::ZeroOutput);
    }

    Ok(amount_out)
}

/// Compares the price-impact free output at the spot price with what the pool actually pays.
pub fn slippage(
    mechanism: Mechanism,
    reserves: &Reserves,
    direction: SwapDirection,
    amount_in: Uint128,
) -> StdResult<SlippageResponse> {
    let (input_reserve, output_reserve) = reserves.sides(direction);

    let theoretical_amount_out = match mechanism {
        Mechanism::FixedRatio {} => amount_in,
        Mechanism::ConstantProduct {} if input_reserve.is_zero() => Uint128::zero(),
        Mechanism::ConstantProduct {} => Uint128::try_from(
            amount_in
                .full_mul(output_reserve)
                .checked_div(Uint256::from(input_reserve))?,
        )?,
    };
    let actual_amount_out =
        quote_output(mechanism, reserves, direction, amount_in).unwrap_or_default();

    let slippage = theoretical_amount_out.saturating_sub(actual_amount_out);
    let slippage_ratio = if theoretical_amount_out.is_zero() {
        Decimal::zero()
    } else {
        Decimal::from_ratio(slippage, theoretical_amount_out)
    };

    Ok(SlippageResponse {
        theoretical_amount_out,
        actual_amount_out,
        slippage,
        slippage_ratio,
    })
}

/// Classifies `amount_in` by its share of the reserve it is paid into.
///
/// An empty input reserve makes any trade [`TradeSize::VeryLarge`].
pub fn classify_trade(amount_in: Uint128, input_reserve: Uint128) -> (TradeSize, Option<Decimal>) {
    if input_reserve.is_zero() {
        return (TradeSize::VeryLarge, None);
    }

    // amount_in / input_reserve >= percent / 100, without rounding
    let at_least = |percent: u128| amount_in.full_mul(100u128) >= input_reserve.full_mul(percent);
    let size = if at_least(20) {
        TradeSize::VeryLarge
    } else if at_least(10) {
        TradeSize::Large
    } else if at_least(5) {
        TradeSize::Medium
    } else {
        TradeSize::Normal
    };

    (
        size,
        Decimal::checked_from_ratio(amount_in, input_reserve).ok(),
    )
}
