//! Tranche splitter: depeg insurance on the wrapped token
//!
//! Splitting locks an even amount of wrapped collateral and mints half that
//! amount of each tranche: yield-bearing (long the rate holding) and
//! depeg-protection (long the rate falling). At maturity anyone may resolve,
//! freezing the realized ratio `min(rate / reference, 1)`. Redemption then
//! pays `floor(yb * r) + floor(dp * (2 - r))` wrapped per position, which
//! keeps every pairing of redeemers within the locked collateral.
//!
//! Split and unsplit stay open after resolution; only redemption needs it.

use alloc::vec::Vec;

use tidepool_share_model as model;

use crate::account::AccountId;
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};
use crate::pool::PoolState;
use crate::token::Token;

// ============================================================================
// TrancheSplitter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrancheSplitter {
    /// Registry index of the market this splitter belongs to
    pub market: u64,

    /// Wrapped-token account holding all split collateral
    pub vault: AccountId,

    /// Yield-bearing tranche
    pub yb: Token,

    /// Depeg-protection tranche
    pub dp: Token,

    /// Pool rate captured at market creation, 18-decimal
    pub reference_rate: u128,

    /// Timestamp at which resolution becomes legal
    pub maturity: u64,

    /// Frozen realized ratio, present once resolved
    pub resolved_ratio: Option<u128>,
}

impl TrancheSplitter {
    pub fn new(market: u64, reference_rate: u128, maturity: u64) -> Self {
        TrancheSplitter {
            market,
            vault: AccountId::vault("tranche", market),
            yb: Token::new(TokenKind::YieldBearing(market)),
            dp: Token::new(TokenKind::Protection(market)),
            reference_rate,
            maturity,
            resolved_ratio: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_ratio.is_some()
    }

    /// Locks `amount` wrapped (must be even and nonzero) and mints
    /// `amount / 2` of each tranche to the caller.
    ///
    /// Returns the per-tranche mint.
    pub fn split(
        &mut self,
        wrapped: &mut Token,
        caller: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        let half = even_half(amount)?;
        wrapped.transfer(caller, self.vault, amount, events)?;
        // tranche supplies are bounded by half the wrapped supply
        self.yb.mint(caller, half, events)?;
        self.dp.mint(caller, half, events)?;
        Ok(half)
    }

    /// Burns `amount / 2` of each tranche and releases `amount` wrapped.
    /// Both tranche balances are checked before either burns.
    ///
    /// Returns the per-tranche burn.
    pub fn unsplit(
        &mut self,
        wrapped: &mut Token,
        caller: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        let half = even_half(amount)?;
        if self.yb.balance_of(caller) < half || self.dp.balance_of(caller) < half {
            return Err(Error::InsufficientBalance);
        }
        self.yb.burn(caller, half, events)?;
        self.dp.burn(caller, half, events)?;
        wrapped.transfer(self.vault, caller, amount, events)?;
        Ok(half)
    }

    /// Freezes the realized ratio from the current pool rate. Callable by
    /// anyone once maturity has passed; a second call fails.
    ///
    /// Returns the frozen ratio.
    pub fn resolve(&mut self, now: u64, pool: &PoolState, events: &mut Vec<Event>) -> Result<u128> {
        if self.is_resolved() {
            return Err(Error::AlreadyResolved);
        }
        if now < self.maturity {
            return Err(Error::NotMatured);
        }
        let ratio = model::realized_ratio(pool.rate()?, self.reference_rate)?;
        self.resolved_ratio = Some(ratio);
        events.push(Event::DepegResolved {
            market: self.market,
            realized_ratio: ratio,
        });
        Ok(ratio)
    }

    /// Burns the stated tranche amounts and pays the resolved-ratio payout
    /// in wrapped. Requires resolution; at least one amount must be nonzero.
    ///
    /// Returns the wrapped payout.
    pub fn redeem(
        &mut self,
        wrapped: &mut Token,
        caller: AccountId,
        yb_amount: u128,
        dp_amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        let ratio = self.resolved_ratio.ok_or(Error::NotResolved)?;
        if yb_amount == 0 && dp_amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if self.yb.balance_of(caller) < yb_amount || self.dp.balance_of(caller) < dp_amount {
            return Err(Error::InsufficientBalance);
        }
        let payout = model::tranche_payout(yb_amount, dp_amount, ratio)?;
        self.yb.burn(caller, yb_amount, events)?;
        self.dp.burn(caller, dp_amount, events)?;
        // per-term floors keep the sum of all payouts within the vault
        wrapped.transfer(self.vault, caller, payout, events)?;
        Ok(payout)
    }
}

#[inline]
fn even_half(amount: u128) -> Result<u128> {
    if amount == 0 || amount % 2 != 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(amount / 2)
}
