//! Error taxonomy shared by every component
//!
//! The model crates keep their own small error enums so their math stays
//! dependency-free; the `From` impls at the bottom of this file fold those
//! into the one enum callers see. Each mapping is chosen per call site
//! meaning, not mechanically: a division by zero inside a share conversion
//! surfaces as `InsufficientBalance` because the only way to reach it is
//! transferring out of an empty pool.

use tidepool_common::MathError;
use tidepool_share_model::{PoolError, TrancheError};
use tidepool_swap_model::SwapError;

// ============================================================================
// Error
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Account balance (or share holding) does not cover the operation
    InsufficientBalance,

    /// Spender allowance does not cover the requested amount
    InsufficientAllowance,

    /// Caller lacks the role the operation requires
    AuthorizationDenied,

    /// One-time binding was already performed
    AlreadySet,

    /// Operation requires the ledger binding, which has not happened yet
    LedgerNotSet,

    /// Market has not reached its maturity timestamp
    NotMatured,

    /// Depeg resolution was already recorded
    AlreadyResolved,

    /// Depeg resolution has not been recorded yet
    NotResolved,

    /// Swap output fell below the caller's minimum
    SlippageExceeded,

    /// Minted liquidity shares fell below the caller's minimum
    SharesBelowMin,

    /// Withdrawn amount fell below the caller's minimum
    AmountBelowMin,

    /// Swap input exceeds the pool's reserve of that asset
    AmountExceedsLiquidity,

    /// Amount is zero, odd where evenness is required, or otherwise malformed
    InvalidAmount,

    /// Checked arithmetic underflowed
    Underflow,

    /// Checked arithmetic overflowed
    Overflow,

    /// A state invariant would have been violated
    InvariantViolation,

    /// Iterative solver hit its iteration cap without converging
    ConvergenceFailure,

    /// No market exists at the given index
    UnknownMarket,
}

pub type Result<T> = core::result::Result<T, Error>;

impl core::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InsufficientBalance => "insufficient balance",
            Error::InsufficientAllowance => "insufficient allowance",
            Error::AuthorizationDenied => "caller not authorized",
            Error::AlreadySet => "ledger already set",
            Error::LedgerNotSet => "ledger not set",
            Error::NotMatured => "maturity not reached",
            Error::AlreadyResolved => "depeg already resolved",
            Error::NotResolved => "depeg not resolved",
            Error::SlippageExceeded => "output below minimum",
            Error::SharesBelowMin => "shares below minimum",
            Error::AmountBelowMin => "amount below minimum",
            Error::AmountExceedsLiquidity => "amount exceeds liquidity",
            Error::InvalidAmount => "invalid amount",
            Error::Underflow => "arithmetic underflow",
            Error::Overflow => "arithmetic overflow",
            Error::InvariantViolation => "invariant violation",
            Error::ConvergenceFailure => "solver did not converge",
            Error::UnknownMarket => "unknown market index",
        };
        f.write_str(msg)
    }
}

// ============================================================================
// Model error folding
// ============================================================================

impl From<PoolError> for Error {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::ZeroAmount => Error::InvalidAmount,
            PoolError::DustAmount => Error::InvalidAmount,
            // Share conversions divide by the pool totals; an empty pool can
            // back no balance, so the transfer-side meaning is a short balance.
            PoolError::EmptyPool => Error::InsufficientBalance,
            PoolError::Overflow => Error::Overflow,
            PoolError::Underflow => Error::Underflow,
            PoolError::Decoupled => Error::InvariantViolation,
        }
    }
}

impl From<TrancheError> for Error {
    fn from(e: TrancheError) -> Self {
        match e {
            // Market creation refuses a zero reference rate, so these two are
            // unreachable from the public surface and mark corrupted state.
            TrancheError::ZeroReference => Error::InvariantViolation,
            TrancheError::RatioOutOfRange => Error::InvariantViolation,
            TrancheError::Overflow => Error::Overflow,
        }
    }
}

impl From<SwapError> for Error {
    fn from(e: SwapError) -> Self {
        match e {
            SwapError::ZeroReserve => Error::InvalidAmount,
            SwapError::InvalidIndex => Error::InvalidAmount,
            SwapError::InvalidAmplification => Error::InvalidAmount,
            SwapError::Overflow => Error::Overflow,
            SwapError::ConvergenceFailure => Error::ConvergenceFailure,
        }
    }
}

impl From<MathError> for Error {
    fn from(e: MathError) -> Self {
        match e {
            // Raw math is only reached through pre-guarded denominators.
            MathError::DivisionByZero => Error::InvariantViolation,
            MathError::Overflow => Error::Overflow,
        }
    }
}
