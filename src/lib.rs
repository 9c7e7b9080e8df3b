//! Tidepool - a rebasing share ledger with depeg-tranche markets
//!
//! This crate models five interlocking primitives as one deterministic,
//! single-threaded state machine:
//!
//! 1. A share ledger whose balances are derived from pool totals, never stored
//! 2. A pool controller that owns those totals: deposits, withdrawals, and
//!    manager rebases
//! 3. A non-rebasing wrapper pinned 1:1 to ledger shares
//! 4. A tranche splitter that cuts wrapped tokens into yield-bearing and
//!    depeg-protection halves with a one-shot resolution at maturity
//! 5. A two-asset StableSwap pool for trading the tranches
//!
//! Every operation either completes all of its state changes or none of them,
//! all arithmetic is checked integer math with explicit rounding direction,
//! and time is a logical clock the caller advances. The [`Engine`] facade is
//! the only mutation surface; everything underneath is plain data that can be
//! inspected, snapshotted, and serialized.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod account;
pub mod amm;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod pool;
pub mod token;
pub mod tranche;
pub mod wrapped;

pub use account::AccountId;
pub use amm::StableSwapPool;
pub use engine::Engine;
pub use error::{Error, Result};
pub use events::{Event, TokenKind};
pub use ledger::{ShareLedger, UNLIMITED_ALLOWANCE};
pub use market::{Market, MarketRegistry};
pub use pool::{PoolController, PoolState};
pub use token::Token;
pub use tranche::TrancheSplitter;
pub use wrapped::WrappedToken;

/// 18-decimal fixed-point unit used for all rates and ratios
pub use tidepool_common::ONE;
