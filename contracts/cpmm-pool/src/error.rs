use cosmwasm_std::{
    CheckedMultiplyRatioError, ConversionOverflowError, DivideByZeroError, OverflowError,
    StdError, Uint128,
};
use thiserror::Error;

use crate::custody::TransferError;

#[derive(Error, Debug, PartialEq)]
pub enum PoolError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow {},

    #[error("Invalid asset: {asset}")]
    InvalidAsset { asset: String },

    #[error("Amount must be positive")]
    ZeroAmount {},

    #[error("Deposit too small to mint any shares")]
    ZeroShares {},

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: Uint128,
        available: Uint128,
    },

    #[error("Swap output rounds down to zero")]
    InsufficientOutput {},

    #[error("Cannot swap against empty reserves")]
    EmptyPool {},

    #[error("Asset transfer failed: {0}")]
    TransferFailure(#[from] TransferError),

    #[error("Pool is already executing an operation on this thread")]
    Reentrancy {},

    #[error("Pool lock poisoned by a panicked operation")]
    LockPoisoned {},

    #[error("Pool invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl From<OverflowError> for PoolError {
    fn from(_: OverflowError) -> Self {
        PoolError::ArithmeticOverflow {}
    }
}

impl From<ConversionOverflowError> for PoolError {
    fn from(_: ConversionOverflowError) -> Self {
        PoolError::ArithmeticOverflow {}
    }
}

impl From<CheckedMultiplyRatioError> for PoolError {
    fn from(err: CheckedMultiplyRatioError) -> Self {
        match err {
            CheckedMultiplyRatioError::DivideByZero => DivideByZeroError {}.into(),
            CheckedMultiplyRatioError::Overflow => PoolError::ArithmeticOverflow {},
        }
    }
}
