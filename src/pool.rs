//! Pool totals and their controller
//!
//! [`PoolState`] is the pair of totals every ledger balance derives from.
//! [`PoolController`] owns the ways those totals move: user deposits and
//! withdrawals (which mint and burn shares in lockstep) and manager rebases
//! (which move value only, repricing every holder at once). The controller
//! refuses all traffic until the one-time ledger binding is made.

use alloc::vec::Vec;

use tidepool_share_model as model;

use crate::account::{AccountId, ZERO_ACCOUNT};
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};
use crate::ledger::ShareLedger;

// ============================================================================
// PoolState
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolState {
    /// Total underlying value backing the ledger
    pub total_pooled_value: u128,

    /// Total shares outstanding
    pub total_shares: u128,
}

impl PoolState {
    pub(crate) fn totals(&self) -> model::PoolTotals {
        model::PoolTotals {
            value: self.total_pooled_value,
            shares: self.total_shares,
        }
    }

    pub(crate) fn set_totals(&mut self, totals: model::PoolTotals) {
        self.total_pooled_value = totals.value;
        self.total_shares = totals.shares;
    }

    /// 18-decimal value per share; zero for an empty pool.
    pub fn rate(&self) -> Result<u128> {
        model::rate(self.totals()).map_err(Into::into)
    }
}

// ============================================================================
// PoolController
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolController {
    /// Account allowed to rebase
    pub manager: AccountId,

    /// One-time ledger binding flag
    pub ledger_bound: bool,
}

impl PoolController {
    pub fn new(manager: AccountId) -> Self {
        PoolController {
            manager,
            ledger_bound: false,
        }
    }

    /// Performs the one-time ledger binding. A second call fails.
    pub fn bind_ledger(&mut self) -> Result<()> {
        if self.ledger_bound {
            return Err(Error::AlreadySet);
        }
        self.ledger_bound = true;
        Ok(())
    }

    fn ensure_bound(&self) -> Result<()> {
        if !self.ledger_bound {
            return Err(Error::LedgerNotSet);
        }
        Ok(())
    }

    /// Adds `value` to the pool and mints shares at the current rate.
    /// Bootstrap deposits mint 1:1. Deposits whose share count floors to
    /// zero are refused, so value can never enter without representation.
    ///
    /// Returns the minted share count.
    pub fn deposit(
        &self,
        pool: &mut PoolState,
        ledger: &mut ShareLedger,
        caller: AccountId,
        value: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        self.ensure_bound()?;
        let outcome = model::apply_deposit(pool.totals(), value)?;
        ledger.mint_shares(caller, outcome.minted_shares);
        pool.set_totals(outcome.totals);
        events.push(Event::Deposited {
            account: caller,
            value,
            shares: outcome.minted_shares,
        });
        events.push(Event::Transfer {
            token: TokenKind::Underlying,
            from: ZERO_ACCOUNT,
            to: caller,
            amount: value,
        });
        events.push(Event::TransferShares {
            from: ZERO_ACCOUNT,
            to: caller,
            shares: outcome.minted_shares,
        });
        Ok(outcome.minted_shares)
    }

    /// Removes `amount` of value and burns `floor(amount * S / V)` shares
    /// from the caller. The burn is floored, so a withdrawer can keep a
    /// sub-share fraction; the shortfall dilutes the remaining holders by
    /// less than one share's value.
    ///
    /// Returns the burned share count.
    pub fn withdraw(
        &self,
        pool: &mut PoolState,
        ledger: &mut ShareLedger,
        caller: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        self.ensure_bound()?;
        if amount > ledger.balance_of(pool, caller) {
            return Err(Error::InsufficientBalance);
        }
        let outcome = model::apply_withdraw(pool.totals(), amount)?;
        // amount <= balance bounds the floored burn by the caller's holding
        ledger.burn_shares(caller, outcome.burned_shares)?;
        pool.set_totals(outcome.totals);
        events.push(Event::Withdrawn {
            account: caller,
            value: amount,
            shares: outcome.burned_shares,
        });
        events.push(Event::Transfer {
            token: TokenKind::Underlying,
            from: caller,
            to: ZERO_ACCOUNT,
            amount,
        });
        events.push(Event::TransferShares {
            from: caller,
            to: ZERO_ACCOUNT,
            shares: outcome.burned_shares,
        });
        Ok(outcome.burned_shares)
    }

    /// Manager-only value adjustment. Shares are untouched, so every balance
    /// moves by the same factor. Driving a backed pool's value to zero is
    /// refused as a decoupling.
    pub fn rebase(
        &self,
        pool: &mut PoolState,
        caller: AccountId,
        delta: i128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        self.ensure_bound()?;
        if caller != self.manager {
            return Err(Error::AuthorizationDenied);
        }
        let totals = model::apply_rebase(pool.totals(), delta)?;
        pool.set_totals(totals);
        events.push(Event::Rebased {
            delta,
            new_value: totals.value,
        });
        Ok(())
    }
}
