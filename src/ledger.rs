//! Rebasing share ledger
//!
//! Balances are derived, never stored. An account holds shares; its balance
//! is `shares * total_value / total_shares`, floored against the live pool
//! totals. A transfer converts the stated amount to shares exactly once and
//! moves that share quantity, so the sum of holdings always equals the pool's
//! share total and a rebase changes every balance without touching this map.
//!
//! The sufficiency check is share-denominated: what must cover the transfer
//! is the converted share count, not the displayed balance. With a rate above
//! 1 the conversion floors, so an amount slightly above the displayed balance
//! can still go through when its floored share count fits the holding. This
//! mirrors how production rebasing tokens behave and is deliberate.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use tidepool_share_model as model;

use crate::account::AccountId;
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};
use crate::pool::PoolState;

/// Allowance sentinel that is never decremented on spend
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

// ============================================================================
// ShareLedger
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShareLedger {
    /// Shares per account; the sum equals the pool's total_shares
    pub shares: BTreeMap<AccountId, u128>,

    /// owner -> spender -> balance-denominated allowance
    pub allowances: BTreeMap<AccountId, BTreeMap<AccountId, u128>>,
}

impl ShareLedger {
    pub fn new() -> Self {
        ShareLedger::default()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn shares_of(&self, account: AccountId) -> u128 {
        self.shares.get(&account).copied().unwrap_or(0)
    }

    /// Derived balance at the current pool rate. Holdings never exceed the
    /// pool's share total, so the conversion cannot fail; an empty pool backs
    /// a zero balance.
    pub fn balance_of(&self, pool: &PoolState, account: AccountId) -> u128 {
        model::value_for_shares(pool.totals(), self.shares_of(account)).unwrap_or(0)
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> u128 {
        self.allowances
            .get(&owner)
            .and_then(|per_spender| per_spender.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    /// Shares the given balance-denominated amount converts to right now.
    pub fn shares_for_amount(&self, pool: &PoolState, amount: u128) -> Result<u128> {
        if amount == 0 {
            return Ok(0);
        }
        model::shares_for_value(pool.totals(), amount).map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        self.allowances.entry(owner).or_default().insert(spender, amount);
        events.push(Event::Approval {
            owner,
            spender,
            amount,
        });
        Ok(())
    }

    /// Balance-denominated transfer. Converts once, moves shares.
    pub fn transfer(
        &mut self,
        pool: &PoolState,
        from: AccountId,
        to: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let shares = self.shares_for_amount(pool, amount)?;
        self.move_shares(from, to, shares)?;
        self.emit_movement(from, to, amount, shares, events);
        Ok(())
    }

    /// Share-denominated transfer. The dual Transfer event carries the value
    /// those shares represent at the current rate.
    pub fn transfer_shares(
        &mut self,
        pool: &PoolState,
        from: AccountId,
        to: AccountId,
        shares: u128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let amount = model::value_for_shares(pool.totals(), shares).unwrap_or(0);
        self.move_shares(from, to, shares)?;
        self.emit_movement(from, to, amount, shares, events);
        Ok(())
    }

    /// Spends `from`'s allowance toward `spender` and transfers. The
    /// unlimited sentinel is never decremented. All checks run before any
    /// state changes.
    pub fn transfer_from(
        &mut self,
        pool: &PoolState,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(Error::InsufficientAllowance);
        }
        let shares = self.shares_for_amount(pool, amount)?;
        if self.shares_of(from) < shares {
            return Err(Error::InsufficientBalance);
        }
        if allowance != UNLIMITED_ALLOWANCE {
            self.allowances
                .entry(from)
                .or_default()
                .insert(spender, allowance - amount);
        }
        self.move_shares(from, to, shares)?;
        self.emit_movement(from, to, amount, shares, events);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Share bookkeeping (pool controller surface)
    // ------------------------------------------------------------------

    pub(crate) fn mint_shares(&mut self, to: AccountId, shares: u128) {
        if shares == 0 {
            return;
        }
        // bounded by the pool's overflow-checked share total
        *self.shares.entry(to).or_insert(0) += shares;
    }

    pub(crate) fn burn_shares(&mut self, from: AccountId, shares: u128) -> Result<()> {
        self.debit_shares(from, shares)
    }

    fn move_shares(&mut self, from: AccountId, to: AccountId, shares: u128) -> Result<()> {
        self.debit_shares(from, shares)?;
        self.mint_shares(to, shares);
        Ok(())
    }

    fn debit_shares(&mut self, from: AccountId, shares: u128) -> Result<()> {
        let held = self.shares_of(from);
        let remaining = held
            .checked_sub(shares)
            .ok_or(Error::InsufficientBalance)?;
        if remaining == 0 {
            self.shares.remove(&from);
        } else {
            self.shares.insert(from, remaining);
        }
        Ok(())
    }

    fn emit_movement(
        &self,
        from: AccountId,
        to: AccountId,
        amount: u128,
        shares: u128,
        events: &mut Vec<Event>,
    ) {
        events.push(Event::Transfer {
            token: TokenKind::Underlying,
            from,
            to,
            amount,
        });
        events.push(Event::TransferShares { from, to, shares });
    }
}
