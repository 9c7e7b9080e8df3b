//! Pool Totals Formal Model
//!
//! Pure transitions over `(value, shares)` pool totals. The production pool
//! controller applies these and mirrors the outcome into its ledger; the
//! functions themselves never see accounts.
//!
//! # Properties Proven
//! - **P1**: Zero-coupling - totals reach zero together or not at all
//! - **P2**: Deposit grows value by the exact amount and shares by the floor conversion
//! - **P3**: Withdraw burns exactly the floor conversion, never more than exists
//! - **P4**: Rebase moves value only, shares untouched
//! - **P5**: Converting value to shares and back never inflates

use tidepool_common::{add_signed, mul_div_floor, MathError, ONE};

/// Pool totals the rebasing ledger derives balances from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolTotals {
    /// Total underlying value held by the pool
    pub value: u128,
    /// Total shares in existence across all accounts
    pub shares: u128,
}

/// Outcome of a deposit: updated totals plus the shares minted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    pub totals: PoolTotals,
    pub minted_shares: u128,
}

/// Outcome of a withdrawal: updated totals plus the shares burned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub totals: PoolTotals,
    pub burned_shares: u128,
}

/// Error types for pool-total transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Amount is zero
    ZeroAmount,
    /// Amount converts to zero shares at the current rate
    DustAmount,
    /// No shares outstanding, so no rate exists
    EmptyPool,
    /// Arithmetic overflow
    Overflow,
    /// Result would drop a total below zero
    Underflow,
    /// Totals would end up zero on one side only
    Decoupled,
}

impl From<MathError> for PoolError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DivisionByZero => PoolError::EmptyPool,
            MathError::Overflow => PoolError::Overflow,
        }
    }
}

/// Convert a balance amount to the shares backing it at the current rate.
///
/// shares = value · S / V, floored. Fails on an empty pool: with no shares
/// outstanding there is no rate to convert at.
pub fn shares_for_value(totals: PoolTotals, value: u128) -> Result<u128, PoolError> {
    if totals.shares == 0 || totals.value == 0 {
        return Err(PoolError::EmptyPool);
    }
    mul_div_floor(value, totals.shares, totals.value).map_err(Into::into)
}

/// Convert a share quantity to the balance it derives to.
///
/// value = shares · V / S, floored; zero on an empty pool.
pub fn value_for_shares(totals: PoolTotals, shares: u128) -> Result<u128, PoolError> {
    if totals.shares == 0 {
        return Ok(0);
    }
    mul_div_floor(shares, totals.value, totals.shares).map_err(Into::into)
}

/// Current rate in 18-decimal fixed point, value per share.
///
/// Zero for an empty pool.
pub fn rate(totals: PoolTotals) -> Result<u128, PoolError> {
    if totals.shares == 0 {
        return Ok(0);
    }
    mul_div_floor(totals.value, ONE, totals.shares).map_err(Into::into)
}

/// Apply a deposit to the pool totals.
///
/// The first deposit into an empty pool prices shares 1:1; afterwards the
/// mint is `value · S / V` floored. A deposit whose floor conversion is zero
/// shares is rejected rather than silently donated to existing holders.
///
/// # Properties
/// - **P2**: value' = value + amount, shares' = shares + minted
///
/// # Arguments
/// * `totals` - current pool totals (coupled: zero together or not at all)
/// * `value` - deposit amount (must be > 0)
pub fn apply_deposit(totals: PoolTotals, value: u128) -> Result<DepositOutcome, PoolError> {
    if value == 0 {
        return Err(PoolError::ZeroAmount);
    }

    let minted = if totals.shares == 0 {
        value
    } else {
        mul_div_floor(value, totals.shares, totals.value)?
    };
    if minted == 0 {
        return Err(PoolError::DustAmount);
    }

    let new_value = totals.value.checked_add(value).ok_or(PoolError::Overflow)?;
    let new_shares = totals.shares.checked_add(minted).ok_or(PoolError::Overflow)?;

    Ok(DepositOutcome {
        totals: PoolTotals {
            value: new_value,
            shares: new_shares,
        },
        minted_shares: minted,
    })
}

/// Apply a withdrawal to the pool totals.
///
/// Burns `value · S / V` floored. The caller has already checked that the
/// holder's derived balance covers `value`, which also bounds it by the pool
/// total. Draining the final value must drain the final share.
///
/// # Properties
/// - **P1**: outcome totals stay coupled
/// - **P3**: value' = value - amount, shares' = shares - burned
pub fn apply_withdraw(totals: PoolTotals, value: u128) -> Result<WithdrawOutcome, PoolError> {
    if value == 0 {
        return Err(PoolError::ZeroAmount);
    }
    if value > totals.value {
        return Err(PoolError::Underflow);
    }
    if totals.shares == 0 {
        return Err(PoolError::EmptyPool);
    }

    let burned = mul_div_floor(value, totals.shares, totals.value)?;
    let new_value = totals.value - value;
    let new_shares = totals.shares - burned;
    if (new_shares == 0) != (new_value == 0) {
        return Err(PoolError::Decoupled);
    }

    Ok(WithdrawOutcome {
        totals: PoolTotals {
            value: new_value,
            shares: new_shares,
        },
        burned_shares: burned,
    })
}

/// Apply a signed rebase delta to the pool value.
///
/// Shares are never touched, so every holder's balance scales by the same
/// factor. A delta that would take the value below zero is an underflow; one
/// that would zero the value while shares remain outstanding would decouple
/// the totals and is rejected outright.
///
/// # Properties
/// - **P1**: outcome totals stay coupled
/// - **P4**: shares' == shares
pub fn apply_rebase(totals: PoolTotals, delta: i128) -> Result<PoolTotals, PoolError> {
    let new_value = match add_signed(totals.value, delta) {
        Some(v) => v,
        None if delta < 0 => return Err(PoolError::Underflow),
        None => return Err(PoolError::Overflow),
    };
    if (new_value == 0) != (totals.shares == 0) {
        return Err(PoolError::Decoupled);
    }
    Ok(PoolTotals {
        value: new_value,
        shares: totals.shares,
    })
}


// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    /// Helper: bounded, coupled pool totals
    fn bounded_totals() -> PoolTotals {
        let value: u128 = kani::any();
        let shares: u128 = kani::any();

        // Keep the state space manageable and both products inside the
        // mul_div fast path
        kani::assume(value <= 1_000_000_000);
        kani::assume(shares <= 1_000_000_000);
        kani::assume((value == 0) == (shares == 0));

        PoolTotals { value, shares }
    }

    /// **Proof P1: Transitions keep the totals coupled**
    ///
    /// Any successful deposit, withdrawal, or rebase leaves the totals zero
    /// together or nonzero together.
    #[kani::proof]
    fn proof_p1_zero_coupling() {
        let totals = bounded_totals();
        let amount: u128 = kani::any();
        let delta: i128 = kani::any();
        kani::assume(amount <= 1_000_000_000);
        kani::assume(delta >= -1_000_000_000 && delta <= 1_000_000_000);

        if let Ok(outcome) = apply_deposit(totals, amount) {
            assert!((outcome.totals.value == 0) == (outcome.totals.shares == 0));
        }
        if let Ok(outcome) = apply_withdraw(totals, amount) {
            assert!((outcome.totals.value == 0) == (outcome.totals.shares == 0));
        }
        if let Ok(new_totals) = apply_rebase(totals, delta) {
            assert!((new_totals.value == 0) == (new_totals.shares == 0));
        }
    }

    /// **Proof P2: Deposit moves both totals by the stated amounts**
    #[kani::proof]
    fn proof_p2_deposit_exact() {
        let totals = bounded_totals();
        let amount: u128 = kani::any();
        kani::assume(amount > 0 && amount <= 1_000_000_000);

        if let Ok(outcome) = apply_deposit(totals, amount) {
            assert!(outcome.totals.value == totals.value + amount);
            assert!(outcome.totals.shares == totals.shares + outcome.minted_shares);
            assert!(outcome.minted_shares > 0);
        }
    }

    /// **Proof P3: Withdraw burns no more than exists**
    #[kani::proof]
    fn proof_p3_withdraw_exact() {
        let totals = bounded_totals();
        let amount: u128 = kani::any();
        kani::assume(amount > 0 && amount <= totals.value);

        if let Ok(outcome) = apply_withdraw(totals, amount) {
            assert!(outcome.totals.value == totals.value - amount);
            assert!(outcome.burned_shares <= totals.shares);
            assert!(outcome.totals.shares == totals.shares - outcome.burned_shares);
        }
    }

    /// **Proof P4: Rebase never touches shares**
    #[kani::proof]
    fn proof_p4_rebase_value_only() {
        let totals = bounded_totals();
        let delta: i128 = kani::any();
        kani::assume(delta >= -1_000_000_000 && delta <= 1_000_000_000);

        if let Ok(new_totals) = apply_rebase(totals, delta) {
            assert!(new_totals.shares == totals.shares);
        }
    }

    /// **Proof P5: Value-to-shares round trip never inflates**
    #[kani::proof]
    fn proof_p5_round_trip_bounded() {
        let totals = bounded_totals();
        let value: u128 = kani::any();
        kani::assume(totals.shares > 0);
        kani::assume(value <= totals.value);

        if let Ok(shares) = shares_for_value(totals, value) {
            if let Ok(back) = value_for_shares(totals, shares) {
                assert!(back <= value);
            }
        }
    }
}
