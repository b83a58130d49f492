mod error;

use std::fmt::{Display, Formatter, Result as FmtResult};

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Decimal, Decimal256, Uint128, Uint256};
use cw20::Cw20ReceiveMsg;

use crate::asset::{AssetInfo, AssetInfoValidated};

pub use error::ContractError;

/// This enum describes the pricing rule a pool is created with.
/// ## Available mechanisms
/// ```
/// # use subnet_dex::pool::Mechanism::{ConstantProduct, FixedRatio};
/// FixedRatio {};
/// ConstantProduct {};
/// ```
#[cw_serde]
#[derive(Copy, Eq)]
pub enum Mechanism {
    /// Output equals input, one to one
    FixedRatio {},
    /// `base_reserve * quote_reserve = k`
    ConstantProduct {},
}

impl Display for Mechanism {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        match self {
            Mechanism::FixedRatio {} => fmt.write_str("fixed_ratio"),
            Mechanism::ConstantProduct {} => fmt.write_str("constant_product"),
        }
    }
}

/// Which asset goes into the pool.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum SwapDirection {
    BaseToQuote {},
    QuoteToBase {},
}

impl Display for SwapDirection {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        match self {
            SwapDirection::BaseToQuote {} => fmt.write_str("base_to_quote"),
            SwapDirection::QuoteToBase {} => fmt.write_str("quote_to_base"),
        }
    }
}

/// Why the pricing engine refused to quote a trade.
///
/// A rejected quote is never a free trade: its output is always zero.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum Rejection {
    /// The input amount is zero
    ZeroInput,
    /// The pool has not received liquidity yet
    EmptyPool,
    /// The counterparty reserve would fall below the minimum pool liquidity
    BelowFloor,
    /// The output is larger than the counterparty reserve
    ExceedsReserve,
    /// The input is too small to buy a single unit
    ZeroOutput,
    /// Intermediate arithmetic does not fit
    Overflow,
}

impl Display for Rejection {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        match self {
            Rejection::ZeroInput => fmt.write_str("zero input"),
            Rejection::EmptyPool => fmt.write_str("pool has no liquidity"),
            Rejection::BelowFloor => fmt.write_str("reserve would fall below the liquidity floor"),
            Rejection::ExceedsReserve => fmt.write_str("output exceeds the available reserve"),
            Rejection::ZeroOutput => fmt.write_str("output rounds down to zero"),
            Rejection::Overflow => fmt.write_str("arithmetic overflow"),
        }
    }
}

/// Size of a prospective trade relative to the reserve it is paid into.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord)]
pub enum TradeSize {
    /// Below 5%
    Normal,
    /// 5% and above
    Medium,
    /// 10% and above
    Large,
    /// 20% and above
    VeryLarge,
}

/// This structure describes the parameters used for creating a pool contract.
#[cw_serde]
pub struct InstantiateMsg {
    /// Subnet the pool belongs to
    pub netuid: u16,
    /// Pricing mechanism, immutable after creation
    pub mechanism: Mechanism,
    /// The network's base token
    pub base: AssetInfo,
    /// The subnet's own token
    pub quote: AssetInfo,
    /// Floor that neither reserve may go below once liquidity was injected
    pub minimum_pool_liquidity: Uint128,
    /// Address allowed to inject and withdraw liquidity
    pub controller: String,
    /// Second address allowed to inject and withdraw liquidity (the owning contract)
    pub owner_contract: String,
}

/// This structure describes the execute messages available in the contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// Receives a message of type [`Cw20ReceiveMsg`]
    Receive(Cw20ReceiveMsg),
    /// Adds reserves. Controller only.
    /// CW20 legs are pulled with `TransferFrom`; native legs must be attached.
    InjectLiquidity {
        base_amount: Uint128,
        quote_amount: Uint128,
    },
    /// Removes reserves down to, but never below, the minimum pool liquidity. Controller only.
    WithdrawLiquidity {
        base_amount: Uint128,
        quote_amount: Uint128,
        recipient: String,
    },
    /// Sells `amount_in` of the base token for the quote token
    SwapBaseForQuote {
        amount_in: Uint128,
        min_amount_out: Uint128,
        recipient: String,
    },
    /// Sells `amount_in` of the quote token for the base token
    SwapQuoteForBase {
        amount_in: Uint128,
        min_amount_out: Uint128,
        recipient: String,
    },
    /// Blends the current price into the moving average if a block has passed
    RefreshMovingAveragePrice {},
}

/// This structure describes a CW20 hook message.
#[cw_serde]
pub enum Cw20HookMsg {
    /// Swap the sent tokens for the other pool asset
    Swap {
        min_amount_out: Uint128,
        recipient: Option<String>,
    },
}

/// This structure describes the query messages available in the contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns the full pool record
    #[returns(PoolInfoResponse)]
    PoolInfo {},
    /// Returns what a swap would pay out right now, without executing it
    #[returns(SwapPreviewResponse)]
    SwapPreview {
        direction: SwapDirection,
        amount_in: Uint128,
    },
    /// Classifies a trade by its share of the input reserve
    #[returns(LargeTradeWarningResponse)]
    LargeTradeWarning {
        direction: SwapDirection,
        amount_in: Uint128,
    },
    /// Compares a proportional (spot price) output with the real output
    #[returns(SlippageResponse)]
    Slippage {
        direction: SwapDirection,
        amount_in: Uint128,
    },
    #[returns(PoolHealthResponse)]
    PoolHealth {},
    #[returns(StatisticsResponse)]
    Statistics {},
    #[returns(UserStatsResponse)]
    UserStats { address: String },
    /// Compares recorded reserves with the balances the pool actually holds
    #[returns(VerifyReservesResponse)]
    VerifyReserves {},
    /// Returns `base_reserve * quote_reserve`
    #[returns(Uint256)]
    ConstantProductK {},
}

#[cw_serde]
pub struct PoolInfoResponse {
    pub netuid: u16,
    pub mechanism: Mechanism,
    pub base: AssetInfoValidated,
    pub quote: AssetInfoValidated,
    pub base_reserve: Uint128,
    pub quote_reserve_in: Uint128,
    /// Quote tokens paid out by swaps and not yet sold back
    pub quote_reserve_out: Uint128,
    pub minimum_pool_liquidity: Uint128,
    pub current_price: Decimal256,
    pub moving_average_price: Option<Decimal256>,
    pub last_price_update_height: u64,
    pub controller: Addr,
    pub owner_contract: Addr,
    /// Provenance only: the creator holds no privilege
    pub creator: Addr,
}

#[cw_serde]
pub struct SwapPreviewResponse {
    pub direction: SwapDirection,
    pub amount_in: Uint128,
    /// Zero whenever `rejection` is set
    pub amount_out: Uint128,
    pub rejection: Option<Rejection>,
}

#[cw_serde]
pub struct LargeTradeWarningResponse {
    pub size: TradeSize,
    /// `amount_in` as a share of the input reserve; `None` while that reserve is empty
    pub reserve_share: Option<Decimal>,
}

#[cw_serde]
pub struct SlippageResponse {
    /// Output at the current spot price, without price impact
    pub theoretical_amount_out: Uint128,
    /// Output of the pricing engine; zero if the trade is rejected
    pub actual_amount_out: Uint128,
    pub slippage: Uint128,
    /// `slippage / theoretical_amount_out`, zero if the theoretical output is zero
    pub slippage_ratio: Decimal,
}

#[cw_serde]
pub struct PoolHealthResponse {
    pub healthy: bool,
    pub base_healthy: bool,
    pub quote_healthy: bool,
    pub base_reserve: Uint128,
    pub quote_reserve_in: Uint128,
    pub minimum_pool_liquidity: Uint128,
}

#[cw_serde]
pub struct StatisticsResponse {
    /// Base token equivalent of all swaps
    pub total_volume: Uint128,
    pub swap_count: u64,
}

#[cw_serde]
#[derive(Default)]
pub struct UserStatsResponse {
    pub volume: Uint128,
    pub swap_count: u64,
}

#[cw_serde]
pub struct VerifyReservesResponse {
    pub recorded_base: Uint128,
    pub actual_base: Uint128,
    pub recorded_quote: Uint128,
    pub actual_quote: Uint128,
    pub base_matches: bool,
    pub quote_matches: bool,
}

/// Data attached to a successful swap response.
#[cw_serde]
pub struct SwapResponse {
    pub amount_out: Uint128,
}

/// This structure describes a migration message.
#[cw_serde]
pub struct MigrateMsg {}
