use cosmwasm_std::{
    CheckedFromRatioError, ConversionOverflowError, DivideByZeroError, OverflowError, StdError,
    Uint128,
};
use cw_utils::PaymentError;
use thiserror::Error;

use super::Rejection;

/// This enum describes pool contract errors
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("{0}")]
    ConversionOverflow(#[from] ConversionOverflowError),

    #[error("{0}")]
    CheckedFromRatio(#[from] CheckedFromRatioError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow {},

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Event of zero transfer")]
    InvalidZeroAmount {},

    #[error("Address or denom must not be empty")]
    InvalidZeroAddress {},

    #[error("Doubling assets in asset infos")]
    DoublingAssets {},

    #[error("Asset {0} is not traded by this pool")]
    InvalidAsset(String),

    #[error("Native token balance mismatch between the argument ({expected}) and the transferred ({sent})")]
    AssetMismatch { expected: Uint128, sent: Uint128 },

    #[error("Requested {requested} but the reserve only holds {available}")]
    InsufficientReserve {
        requested: Uint128,
        available: Uint128,
    },

    #[error("Reserves must stay at or above the minimum pool liquidity of {minimum}")]
    BelowMinimumLiquidity { minimum: Uint128 },

    #[error("Swap cannot be executed: {0}")]
    SwapRejected(Rejection),

    #[error("Operation exceeds max spread limit: got {amount_out}, expected at least {min_amount_out}")]
    SlippageExceeded {
        amount_out: Uint128,
        min_amount_out: Uint128,
    },

    #[error("Pool is locked by an operation in progress")]
    Reentrancy {},

    #[error("Got reply with unknown ID: {0}")]
    UnknownReply(u64),

    #[error("Cannot migrate from {previous_contract} {previous_version}")]
    CannotMigrate {
        previous_contract: String,
        previous_version: String,
    },
}

impl From<Rejection> for ContractError {
    fn from(rejection: Rejection) -> Self {
        ContractError::SwapRejected(rejection)
    }
}
