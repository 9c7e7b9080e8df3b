//! Non-rebasing wrapper over the share ledger
//!
//! One wrapped unit is pinned to exactly one ledger share. Wrapping pulls
//! underlying from the caller through the allowance path and mints wrapped
//! equal to the shares that actually moved, so rounding in the amount-to-
//! share conversion can never mint unbacked supply. Unwrapping burns wrapped
//! and releases the same share count, whatever the rate has become.

use alloc::vec::Vec;

use crate::account::AccountId;
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};
use crate::ledger::ShareLedger;
use crate::pool::PoolState;
use crate::token::Token;

// ============================================================================
// WrappedToken
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrappedToken {
    /// Wrapped balances
    pub token: Token,

    /// Ledger account custodying the backing shares. Doubles as the
    /// wrapper's spender identity for allowances.
    pub vault: AccountId,
}

impl WrappedToken {
    pub fn new() -> Self {
        WrappedToken {
            token: Token::new(TokenKind::Wrapped),
            vault: AccountId::vault("wrap", 0),
        }
    }

    /// Pulls `amount` underlying from the caller (allowance toward the vault
    /// id required) and mints wrapped equal to the shares received.
    ///
    /// Amounts that convert to zero shares are refused before anything
    /// moves.
    ///
    /// Returns the minted wrapped amount.
    pub fn wrap(
        &mut self,
        pool: &PoolState,
        ledger: &mut ShareLedger,
        caller: AccountId,
        amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let shares = ledger.shares_for_amount(pool, amount)?;
        if shares == 0 {
            return Err(Error::InvalidAmount);
        }
        ledger.transfer_from(pool, self.vault, caller, self.vault, amount, events)?;
        self.token.mint(caller, shares, events)?;
        Ok(shares)
    }

    /// Burns `wrapped_amount` from the caller and releases that many shares
    /// back. The vault always holds shares equal to the wrapped supply, so
    /// the release cannot come up short.
    ///
    /// Returns the share count released.
    pub fn unwrap(
        &mut self,
        pool: &PoolState,
        ledger: &mut ShareLedger,
        caller: AccountId,
        wrapped_amount: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        if wrapped_amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.token.burn(caller, wrapped_amount, events)?;
        ledger.transfer_shares(pool, self.vault, caller, wrapped_amount, events)?;
        Ok(wrapped_amount)
    }

    /// 18-decimal wrapped units one underlying unit converts to right now.
    pub fn wrapped_per_underlying(&self, pool: &PoolState) -> Result<u128> {
        if pool.total_pooled_value == 0 {
            return Ok(0);
        }
        tidepool_common::mul_div_floor(
            pool.total_shares,
            tidepool_common::ONE,
            pool.total_pooled_value,
        )
        .map_err(Into::into)
    }

    /// 18-decimal underlying units one wrapped unit converts to right now.
    pub fn underlying_per_wrapped(&self, pool: &PoolState) -> Result<u128> {
        pool.rate()
    }
}

impl Default for WrappedToken {
    fn default() -> Self {
        WrappedToken::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::UNLIMITED_ALLOWANCE;
    use alloc::vec::Vec;
    use tidepool_common::ONE;

    fn acct(tag: &str) -> AccountId {
        AccountId::named(tag)
    }

    struct Fixture {
        pool: PoolState,
        ledger: ShareLedger,
        wrapped: WrappedToken,
        ev: Vec<Event>,
    }

    // a holds 1_000 shares in a pool at the given rate, approved unlimited
    fn fixture(value: u128) -> Fixture {
        let mut ledger = ShareLedger::new();
        ledger.mint_shares(acct("a"), 1_000);
        let wrapped = WrappedToken::new();
        let mut ev = Vec::new();
        ledger
            .approve(acct("a"), wrapped.vault, UNLIMITED_ALLOWANCE, &mut ev)
            .unwrap();
        Fixture {
            pool: PoolState {
                total_pooled_value: value,
                total_shares: 1_000,
            },
            ledger,
            wrapped,
            ev,
        }
    }

    #[test]
    fn wrap_mints_the_shares_that_moved() {
        let mut f = fixture(1_100); // rate 1.1

        // 110 value converts to exactly 100 shares
        let minted = f
            .wrapped
            .wrap(&f.pool, &mut f.ledger, acct("a"), 110, &mut f.ev)
            .unwrap();
        assert_eq!(minted, 100);
        assert_eq!(f.wrapped.token.balance_of(acct("a")), 100);
        assert_eq!(f.ledger.shares_of(f.wrapped.vault), 100);
        assert_eq!(f.ledger.shares_of(acct("a")), 900);
    }

    #[test]
    fn wrap_mints_the_floored_share_count() {
        let mut f = fixture(1_100);

        // 100 value floors to 90 shares; wrapped mints 90, not 100/1.1 ideal
        let minted = f
            .wrapped
            .wrap(&f.pool, &mut f.ledger, acct("a"), 100, &mut f.ev)
            .unwrap();
        assert_eq!(minted, 90);
        assert_eq!(f.ledger.shares_of(f.wrapped.vault), 90);
        assert_eq!(f.wrapped.token.total_supply, 90);
    }

    #[test]
    fn zero_share_wraps_are_refused_untouched() {
        // rate 100: 99 value floors to 0 shares
        let mut ledger = ShareLedger::new();
        ledger.mint_shares(acct("a"), 10);
        let mut wrapped = WrappedToken::new();
        let pool = PoolState {
            total_pooled_value: 1_000,
            total_shares: 10,
        };
        let mut ev = Vec::new();
        ledger
            .approve(acct("a"), wrapped.vault, UNLIMITED_ALLOWANCE, &mut ev)
            .unwrap();

        let before = ledger.clone();
        assert_eq!(
            wrapped.wrap(&pool, &mut ledger, acct("a"), 99, &mut ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            wrapped.wrap(&pool, &mut ledger, acct("a"), 0, &mut ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!(ledger, before);
        assert_eq!(wrapped.token.total_supply, 0);
    }

    #[test]
    fn wrap_requires_an_allowance() {
        let mut ledger = ShareLedger::new();
        ledger.mint_shares(acct("b"), 100);
        let mut wrapped = WrappedToken::new();
        let pool = PoolState {
            total_pooled_value: 100,
            total_shares: 100,
        };
        let mut ev = Vec::new();

        assert_eq!(
            wrapped.wrap(&pool, &mut ledger, acct("b"), 10, &mut ev),
            Err(Error::InsufficientAllowance)
        );
    }

    #[test]
    fn unwrap_releases_the_same_shares_at_any_rate() {
        let mut f = fixture(1_000); // rate 1.0
        f.wrapped
            .wrap(&f.pool, &mut f.ledger, acct("a"), 400, &mut f.ev)
            .unwrap();

        // rate moves to 1.5 while wrapped; share count is unchanged
        f.pool.total_pooled_value = 1_500;
        let released = f
            .wrapped
            .unwrap(&f.pool, &mut f.ledger, acct("a"), 400, &mut f.ev)
            .unwrap();
        assert_eq!(released, 400);
        assert_eq!(f.ledger.shares_of(acct("a")), 1_000);
        assert_eq!(f.ledger.shares_of(f.wrapped.vault), 0);
        assert_eq!(f.wrapped.token.total_supply, 0);
        // those 400 shares are now worth 600 value
        assert_eq!(f.ledger.balance_of(&f.pool, acct("a")), 1_500);
    }

    #[test]
    fn unwrap_rejects_zero_and_short_balances() {
        let mut f = fixture(1_000);
        f.wrapped
            .wrap(&f.pool, &mut f.ledger, acct("a"), 100, &mut f.ev)
            .unwrap();

        assert_eq!(
            f.wrapped
                .unwrap(&f.pool, &mut f.ledger, acct("a"), 0, &mut f.ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            f.wrapped
                .unwrap(&f.pool, &mut f.ledger, acct("a"), 101, &mut f.ev),
            Err(Error::InsufficientBalance)
        );
    }

    #[test]
    fn conversion_views_are_reciprocal_at_rate_one() {
        let f = fixture(1_000);
        assert_eq!(f.wrapped.wrapped_per_underlying(&f.pool).unwrap(), ONE);
        assert_eq!(f.wrapped.underlying_per_wrapped(&f.pool).unwrap(), ONE);
    }

    #[test]
    fn conversion_views_track_the_rate() {
        let f = fixture(2_000); // rate 2.0
        assert_eq!(f.wrapped.wrapped_per_underlying(&f.pool).unwrap(), ONE / 2);
        assert_eq!(f.wrapped.underlying_per_wrapped(&f.pool).unwrap(), 2 * ONE);

        let empty = WrappedToken::new();
        let zero = PoolState::default();
        assert_eq!(empty.wrapped_per_underlying(&zero).unwrap(), 0);
        assert_eq!(empty.underlying_per_wrapped(&zero).unwrap(), 0);
    }
}
