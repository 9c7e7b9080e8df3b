//! Wide multiply-divide primitives
//!
//! Rates in the system are 18-decimal fixed point, so products like
//! `shares * rate` routinely exceed 128 bits. `mul_div_floor` and
//! `mul_div_ceil` compute `a * b / divisor` through a full 256-bit
//! intermediate and fail explicitly when the quotient itself does not fit.

/// Fixed-point precision for rates (18 decimals)
pub const RATE_DECIMALS: u32 = 18;
pub const ONE: u128 = 1_000_000_000_000_000_000;

const MASK64: u128 = (1 << 64) - 1;

/// Errors from the multiply-divide helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Divisor was zero.
    DivisionByZero,
    /// The quotient does not fit in 128 bits.
    Overflow,
}

/// Full 256-bit product of two u128 values, returned as (high, low) limbs.
///
/// Schoolbook multiplication on 64-bit halves. The cross terms can carry
/// past 128 bits, so both partial sums track their carry explicitly.
#[inline]
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & MASK64);
    let (b_hi, b_lo) = (b >> 64, b & MASK64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let (mid, mid_carry) = lh.overflowing_add(hl);
    let (lo, lo_carry) = ll.overflowing_add(mid << 64);
    let hi = hh + (mid >> 64) + ((mid_carry as u128) << 64) + (lo_carry as u128);
    (hi, lo)
}

/// Restoring division of a 256-bit value (hi, lo) by a 128-bit divisor.
///
/// Returns (quotient, remainder). Caller must ensure `hi < divisor`, which
/// guarantees the quotient fits in 128 bits.
#[inline]
fn div_rem_wide(hi: u128, lo: u128, divisor: u128) -> (u128, u128) {
    debug_assert!(divisor > 0);
    debug_assert!(hi < divisor);

    let mut rem = hi;
    let mut quot: u128 = 0;
    for bit in (0..128).rev() {
        // The bit shifted out of rem stands for 2^128; if set, the shifted
        // value exceeds the divisor even though the truncated rem may not.
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quot <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quot |= 1;
        }
    }
    (quot, rem)
}

/// Computes `floor(a * b / divisor)` with a 256-bit intermediate.
///
/// # Arguments
/// * `a`, `b` - factors, full u128 range
/// * `divisor` - must be nonzero
///
/// # Returns
/// The floored quotient, `MathError::DivisionByZero` on a zero divisor, or
/// `MathError::Overflow` when the true quotient exceeds `u128::MAX`.
#[inline]
pub fn mul_div_floor(a: u128, b: u128, divisor: u128) -> Result<u128, MathError> {
    if divisor == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Ok(lo / divisor);
    }
    if hi >= divisor {
        return Err(MathError::Overflow);
    }
    let (quot, _) = div_rem_wide(hi, lo, divisor);
    Ok(quot)
}

/// Computes `ceil(a * b / divisor)` with a 256-bit intermediate.
///
/// Same contract as [`mul_div_floor`]; rounding up by one unit when the
/// division leaves a remainder, with the increment itself overflow-checked.
#[inline]
pub fn mul_div_ceil(a: u128, b: u128, divisor: u128) -> Result<u128, MathError> {
    if divisor == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = widening_mul(a, b);
    let (quot, rem) = if hi == 0 {
        (lo / divisor, lo % divisor)
    } else if hi >= divisor {
        return Err(MathError::Overflow);
    } else {
        div_rem_wide(hi, lo, divisor)
    };
    if rem == 0 {
        Ok(quot)
    } else {
        quot.checked_add(1).ok_or(MathError::Overflow)
    }
}

/// Computes `floor((a * b + addend) / divisor)` with a 256-bit intermediate.
///
/// Fused form for Newton steps of the shape `(y*y + c) / denom`, where both
/// the product and the sum can exceed 128 bits even though the quotient
/// cannot.
#[inline]
pub fn mul_add_div_floor(a: u128, b: u128, addend: u128, divisor: u128) -> Result<u128, MathError> {
    if divisor == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = widening_mul(a, b);
    let (lo, carry) = lo.overflowing_add(addend);
    // hi is at most 2^128 - 2 (high limb of MAX^2), so the carry cannot wrap
    let hi = hi + carry as u128;
    if hi == 0 {
        return Ok(lo / divisor);
    }
    if hi >= divisor {
        return Err(MathError::Overflow);
    }
    let (quot, _) = div_rem_wide(hi, lo, divisor);
    Ok(quot)
}

/// Applies a signed delta to an unsigned total.
///
/// Returns `None` when the result would leave the u128 range in either
/// direction.
#[inline]
pub fn add_signed(value: u128, delta: i128) -> Option<u128> {
    if delta >= 0 {
        value.checked_add(delta as u128)
    } else {
        value.checked_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_narrow_products() {
        assert_eq!(mul_div_floor(7, 9, 3), Ok(21));
        assert_eq!(mul_div_floor(10, 10, 3), Ok(33));
        assert_eq!(mul_div_ceil(10, 10, 3), Ok(34));
        // Exact division rounds the same in both directions
        assert_eq!(mul_div_floor(10, 9, 3), Ok(30));
        assert_eq!(mul_div_ceil(10, 9, 3), Ok(30));
    }

    #[test]
    fn test_mul_div_wide_products() {
        // 2^127 * 4 = 2^129 overflows u128; quotient 2^126 does not
        assert_eq!(mul_div_floor(1 << 127, 4, 8), Ok(1 << 126));
        // Largest representable case: MAX^2 / MAX = MAX, exercises the
        // restoring-division path at its extremes
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, u128::MAX), Ok(u128::MAX));
        assert_eq!(mul_div_ceil(u128::MAX, u128::MAX, u128::MAX), Ok(u128::MAX));
    }

    #[test]
    fn test_mul_div_rate_scaling() {
        // 900 value over 1000 shares = 0.9 in 18-decimal fixed point
        assert_eq!(mul_div_floor(900, ONE, 1000), Ok(900_000_000_000_000_000));
        // Applying that rate to 1000 shares recovers the value
        assert_eq!(mul_div_floor(1000, 900_000_000_000_000_000, ONE), Ok(900));
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(mul_div_ceil(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), Err(MathError::Overflow));
        assert_eq!(mul_div_ceil(u128::MAX, 2, 1), Err(MathError::Overflow));
    }

    #[test]
    fn test_mul_add_div() {
        assert_eq!(mul_add_div_floor(10, 10, 5, 3), Ok(35));
        assert_eq!(mul_add_div_floor(0, 0, 7, 2), Ok(3));
        // Product and addend together cross the 128-bit line
        assert_eq!(
            mul_add_div_floor(u128::MAX, 1, 1, 2),
            Ok(1 << 127),
        );
        assert_eq!(mul_add_div_floor(1, 1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(
            mul_add_div_floor(u128::MAX, 2, 0, 1),
            Err(MathError::Overflow),
        );
    }

    #[test]
    fn test_add_signed() {
        assert_eq!(add_signed(100, 28), Some(128));
        assert_eq!(add_signed(100, -28), Some(72));
        assert_eq!(add_signed(100, -100), Some(0));
        assert_eq!(add_signed(100, -101), None);
        assert_eq!(add_signed(u128::MAX, 1), None);
        assert_eq!(add_signed(0, i128::MIN), None);
    }
}

// ═══════════════════════════════════════════════════════════════
// KANI FORMAL VERIFICATION PROOFS
// ═══════════════════════════════════════════════════════════════

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// W1: Widening multiply agrees with native multiply on narrow inputs
    ///
    /// Property: for a, b < 2^64 the high limb is zero and the low limb is
    /// the exact product
    #[kani::proof]
    #[kani::unwind(3)]
    fn w1_widening_mul_narrow_exact() {
        let a: u128 = kani::any();
        let b: u128 = kani::any();

        kani::assume(a < (1 << 64));
        kani::assume(b < (1 << 64));

        let (hi, lo) = widening_mul(a, b);

        assert!(hi == 0, "W1: narrow product must not reach the high limb");
        assert!(lo == a * b, "W1: low limb must equal the native product");
    }

    /// W2: Multiply-divide identity
    ///
    /// Property: (a * b) / b == a whenever b > 0
    #[kani::proof]
    #[kani::unwind(3)]
    fn w2_mul_div_identity() {
        let a: u128 = kani::any();
        let b: u128 = kani::any();

        kani::assume(a < (1 << 64));
        kani::assume(b > 0 && b < (1 << 64));

        let floor = mul_div_floor(a, b, b);
        let ceil = mul_div_ceil(a, b, b);

        assert!(floor == Ok(a), "W2: floor identity violated");
        assert!(ceil == Ok(a), "W2: ceil identity violated");
    }

    /// W3: Rounding modes are ordered and adjacent
    ///
    /// Property: ceil >= floor, they differ by at most 1, and they agree
    /// exactly on clean divisions
    #[kani::proof]
    #[kani::unwind(3)]
    fn w3_rounding_modes_adjacent() {
        let a: u128 = kani::any();
        let b: u128 = kani::any();
        let d: u128 = kani::any();

        kani::assume(a < (1 << 64));
        kani::assume(b < (1 << 64));
        kani::assume(d > 0);

        let floor = mul_div_floor(a, b, d).unwrap();
        let ceil = mul_div_ceil(a, b, d).unwrap();

        assert!(ceil >= floor, "W3: ceil must be >= floor");
        assert!(ceil - floor <= 1, "W3: ceil and floor differ by at most 1");
        if (a * b) % d == 0 {
            assert!(ceil == floor, "W3: exact division must agree");
        }
    }

    /// W4: Quotient overflow is detected, not truncated
    ///
    /// Property: a^2 / 1 exceeds u128 for a >= 2^64 and must error
    #[kani::proof]
    #[kani::unwind(3)]
    fn w4_overflow_detected() {
        let a: u128 = kani::any();

        kani::assume(a >= (1 << 64));

        let result = mul_div_floor(a, a, 1);

        assert!(result == Err(MathError::Overflow), "W4: overflow must be reported");
    }

    /// W5: Fused multiply-add-divide agrees with the unfused form
    ///
    /// Property: a zero addend reduces the fused helper to mul_div_floor,
    /// and a unit divisor recovers the exact sum
    #[kani::proof]
    #[kani::unwind(3)]
    fn w5_mul_add_div_consistent() {
        let a: u128 = kani::any();
        let b: u128 = kani::any();
        let addend: u128 = kani::any();
        let d: u128 = kani::any();

        kani::assume(a < (1 << 64));
        kani::assume(b < (1 << 64));
        kani::assume(addend < (1 << 64));
        kani::assume(d > 0);

        assert!(
            mul_add_div_floor(a, b, 0, d) == mul_div_floor(a, b, d),
            "W5: zero addend must reduce to mul_div_floor"
        );
        assert!(
            mul_add_div_floor(a, b, addend, 1) == Ok(a * b + addend),
            "W5: unit divisor must recover the exact sum"
        );
    }

    /// W6: Signed delta application round-trips
    ///
    /// Property: adding a delta then its negation restores the original value
    #[kani::proof]
    #[kani::unwind(3)]
    fn w6_add_signed_roundtrip() {
        let value: u128 = kani::any();
        let delta: i128 = kani::any();

        kani::assume(delta > i128::MIN);

        if let Some(moved) = add_signed(value, delta) {
            let back = add_signed(moved, -delta);
            assert!(back == Some(value), "W6: delta application must round-trip");
        }
    }
}
