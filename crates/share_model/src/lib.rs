//! Share Model - Pure rebasing-share math for formal verification
//!
//! This crate contains the share/value conversion rules and the pool-total
//! transitions that the production ledger, pool controller, and tranche
//! splitter build on. Everything is a total function over plain integers so
//! the invariants can be proven with Kani and exercised directly in tests:
//!
//! - Totals reach zero together or not at all
//! - Deposits and withdrawals convert at the live rate with floor rounding
//! - Rebases move value only, never shares
//! - Tranche redemption can never pay out more than the vault holds

#![no_std]
#![forbid(unsafe_code)]

#[cfg(kani)]
extern crate kani;

pub mod pooling;
pub mod tranche;

pub use pooling::{
    apply_deposit, apply_rebase, apply_withdraw, rate, shares_for_value, value_for_shares,
    DepositOutcome, PoolError, PoolTotals, WithdrawOutcome,
};
pub use tranche::{realized_ratio, tranche_payout, TrancheError};
