//! Tranche Resolution Formal Model
//!
//! Realized-ratio capture and the two-sided redemption payout. The splitter
//! locks 2 wrapped units per (YB, DP) pair, so the governing property is that
//! no mix of redemptions can draw more than 2 units per pair back out.
//!
//! # Properties Proven
//! - **T1**: The realized ratio is always in [0, ONE]
//! - **T2**: Equal-amount redemption pays the locked amount back, give or take one floor unit
//! - **T3**: No set of redeemers can overdraw the vault
//! - **T4**: Payout is monotone in both tranche amounts

use tidepool_common::{mul_div_floor, MathError, ONE};

/// Error types for tranche resolution math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrancheError {
    /// Reference rate of zero cannot anchor a ratio
    ZeroReference,
    /// Ratio above ONE is outside the resolved domain
    RatioOutOfRange,
    /// Arithmetic overflow
    Overflow,
}

impl From<MathError> for TrancheError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DivisionByZero => TrancheError::ZeroReference,
            MathError::Overflow => TrancheError::Overflow,
        }
    }
}

/// Freeze the depeg ratio at resolution time.
///
/// ratio = current_rate / reference_rate in 18-decimal fixed point, clamped
/// to ONE. A rate that appreciated past its reference counts as fully
/// pegged: the clamp is what keeps the payout formula inside the vault for
/// every supply mix.
///
/// # Arguments
/// * `current_rate` - pool rate at resolution, 18-decimal fixed point
/// * `reference_rate` - pool rate captured at market creation, must be nonzero
pub fn realized_ratio(current_rate: u128, reference_rate: u128) -> Result<u128, TrancheError> {
    if reference_rate == 0 {
        return Err(TrancheError::ZeroReference);
    }
    let ratio = mul_div_floor(current_rate, ONE, reference_rate)?;
    Ok(ratio.min(ONE))
}

/// Wrapped-token payout for burning `yb` + `dp` tranche units at ratio `r`.
///
/// payout = floor(yb · r / ONE) + floor(dp · (2·ONE − r) / ONE)
///
/// Each term floors independently. The yield-bearing side absorbs the depeg
/// (paid at r), the protection side is made whole plus the shortfall (paid
/// at 2 − r).
pub fn tranche_payout(yb: u128, dp: u128, ratio: u128) -> Result<u128, TrancheError> {
    if ratio > ONE {
        return Err(TrancheError::RatioOutOfRange);
    }
    let yb_part = mul_div_floor(yb, ratio, ONE)?;
    let dp_part = mul_div_floor(dp, 2 * ONE - ratio, ONE)?;
    yb_part.checked_add(dp_part).ok_or(TrancheError::Overflow)
}


// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    const BOUND: u128 = 1_000_000_000;

    /// **Proof T1: Realized ratio stays in [0, ONE]**
    #[kani::proof]
    fn proof_t1_ratio_clamped() {
        let current: u128 = kani::any();
        let reference: u128 = kani::any();
        kani::assume(current <= BOUND);
        kani::assume(reference > 0 && reference <= BOUND);

        if let Ok(ratio) = realized_ratio(current, reference) {
            assert!(ratio <= ONE);
        }
    }

    /// **Proof T2: Equal-amount redemption recovers the lock within one unit**
    ///
    /// split locked 2s for (s, s); redemption at any resolved ratio returns
    /// 2s or 2s - 1, never more.
    #[kani::proof]
    fn proof_t2_equal_amount_conservation() {
        let s: u128 = kani::any();
        let ratio: u128 = kani::any();
        kani::assume(s > 0 && s <= BOUND);
        kani::assume(ratio <= ONE);

        let payout = tranche_payout(s, s, ratio).unwrap();
        assert!(payout <= 2 * s);
        assert!(payout >= 2 * s - 1);
    }

    /// **Proof T3: Split redemptions cannot overdraw the vault**
    ///
    /// Two redeemers dividing supplies s_yb <= s and s_dp <= s between them
    /// draw at most the 2s the splitter locked.
    #[kani::proof]
    fn proof_t3_no_vault_overdraw() {
        let s: u128 = kani::any();
        let yb1: u128 = kani::any();
        let dp1: u128 = kani::any();
        let ratio: u128 = kani::any();
        kani::assume(s <= BOUND);
        kani::assume(yb1 <= s && dp1 <= s);
        kani::assume(ratio <= ONE);

        let first = tranche_payout(yb1, dp1, ratio).unwrap();
        let second = tranche_payout(s - yb1, s - dp1, ratio).unwrap();
        assert!(first + second <= 2 * s);
    }

    /// **Proof T4: Payout is monotone in both tranche amounts**
    #[kani::proof]
    fn proof_t4_payout_monotone() {
        let yb: u128 = kani::any();
        let dp: u128 = kani::any();
        let extra: u128 = kani::any();
        let ratio: u128 = kani::any();
        kani::assume(yb <= BOUND && dp <= BOUND && extra <= BOUND);
        kani::assume(ratio <= ONE);

        let base = tranche_payout(yb, dp, ratio).unwrap();
        assert!(tranche_payout(yb + extra, dp, ratio).unwrap() >= base);
        assert!(tranche_payout(yb, dp + extra, ratio).unwrap() >= base);
    }
}
