//! Swap Model - Pure StableSwap invariant math for the two-asset pool
//!
//! This crate contains the Newton solvers for the curve invariant
//!
//!   A·n^n·Σxᵢ + D = A·D·n^n + D^(n+1) / (n^n·Πxᵢ)
//!
//! extracted from the stateful pool so they stay total functions over plain
//! integers: every failure mode (zero reserves, overflow, non-convergence)
//! is an explicit error, never a wrapped or best-effort value. The stateful
//! pool in the root crate is a thin orchestration layer over these solvers.

#![no_std]

pub mod math;

pub use math::{compute_d, compute_y};

/// Number of assets in a pool
pub const N_ASSETS: usize = 2;

/// Fee denominator (parts per million)
pub const FEE_DENOMINATOR: u128 = 1_000_000;

/// Swap fee in ppm (300 = 0.03%)
pub const SWAP_FEE_PPM: u128 = 300;

/// Per-asset fee on imbalanced liquidity provision, ppm.
/// swap_fee · n / (4·(n − 1)), which is why fees are ppm and not bps:
/// 150 ppm has no basis-point representation.
pub const LIQUIDITY_FEE_PPM: u128 =
    SWAP_FEE_PPM * (N_ASSETS as u128) / (4 * (N_ASSETS as u128 - 1));

/// Default amplification coefficient
pub const DEFAULT_AMP: u128 = 1000;

/// Newton iteration cap shared by both solvers
pub const MAX_ITERATIONS: usize = 255;

/// Error types for the invariant solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    /// A reserve is zero while the pool holds value
    ZeroReserve,
    /// Asset index out of range, or the two indexes coincide
    InvalidIndex,
    /// Zero amplification coefficient
    InvalidAmplification,
    /// Arithmetic left the u128 range in an intermediate
    Overflow,
    /// Newton iteration did not settle within MAX_ITERATIONS
    ConvergenceFailure,
}
