//! Plain (non-rebasing) token bookkeeping
//!
//! Wrapped, tranche, and liquidity-share balances are ordinary stored
//! integers. Supply is tracked explicitly and checked on mint, which makes
//! transfer credits unconditionally safe: no balance can exceed the supply
//! that contains it.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::account::{AccountId, ZERO_ACCOUNT};
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};

// ============================================================================
// Token
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Which token this is, for event attribution
    pub kind: TokenKind,

    /// Stored balances; zero entries are removed
    pub balances: BTreeMap<AccountId, u128>,

    /// Sum of all stored balances
    pub total_supply: u128,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Token {
            kind,
            balances: BTreeMap::new(),
            total_supply: 0,
        }
    }

    pub fn balance_of(&self, account: AccountId) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Moves `amount` between accounts. A zero amount is a legal no-op that
    /// still emits.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        events.push(Event::Transfer {
            token: self.kind,
            from,
            to,
            amount,
        });
        Ok(())
    }

    pub fn mint(&mut self, to: AccountId, amount: u128, events: &mut Vec<Event>) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        self.credit(to, amount);
        events.push(Event::Transfer {
            token: self.kind,
            from: ZERO_ACCOUNT,
            to,
            amount,
        });
        Ok(())
    }

    pub fn burn(&mut self, from: AccountId, amount: u128, events: &mut Vec<Event>) -> Result<()> {
        self.debit(from, amount)?;
        // a successful debit implies amount <= total_supply
        self.total_supply -= amount;
        events.push(Event::Transfer {
            token: self.kind,
            from,
            to: ZERO_ACCOUNT,
            amount,
        });
        Ok(())
    }

    fn debit(&mut self, from: AccountId, amount: u128) -> Result<()> {
        let balance = self.balance_of(from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance)?;
        if remaining == 0 {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        Ok(())
    }

    // Cannot wrap: every balance is bounded by total_supply, which is
    // overflow-checked on mint.
    fn credit(&mut self, to: AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(to).or_insert(0) += amount;
    }
}
