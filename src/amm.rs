//! Two-asset StableSwap pool over the tranche pair
//!
//! Thin state wrapper around the invariant solvers in `tidepool-swap-model`.
//! Reserves are tracked alongside the vault's token balances and the two are
//! kept equal: every reserve change is mirrored by a transfer in the same
//! call. Swap fees stay in the reserves (the output is reduced), and the
//! imbalance fee on liquidity adds only discounts the minted shares, so both
//! accrue to existing shareholders.
//!
//! Asset index 0 is the yield-bearing tranche, index 1 the protection
//! tranche.

use alloc::vec::Vec;

use tidepool_common::mul_div_floor;
use tidepool_swap_model::{compute_d, compute_y, FEE_DENOMINATOR, LIQUIDITY_FEE_PPM, N_ASSETS};

use crate::account::AccountId;
use crate::error::{Error, Result};
use crate::events::{Event, TokenKind};
use crate::token::Token;

// ============================================================================
// StableSwapPool
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StableSwapPool {
    /// Registry index of the market this pool belongs to
    pub market: u64,

    /// Token account holding both reserves
    pub vault: AccountId,

    /// Amplification coefficient
    pub amp: u128,

    /// Swap fee in parts per million, taken from the output
    pub fee_ppm: u128,

    /// Tracked reserves; always equal to the vault's tranche balances
    pub reserves: [u128; N_ASSETS],

    /// Liquidity shares
    pub lp: Token,
}

impl StableSwapPool {
    pub fn new(market: u64, amp: u128, fee_ppm: u128) -> Self {
        StableSwapPool {
            market,
            vault: AccountId::vault("amm", market),
            amp,
            fee_ppm,
            reserves: [0; N_ASSETS],
            lp: Token::new(TokenKind::PoolShare(market)),
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Current invariant D over the tracked reserves.
    pub fn d(&self) -> Result<u128> {
        compute_d(self.amp, &self.reserves).map_err(Into::into)
    }

    /// 18-decimal invariant per liquidity share; zero before the first add.
    pub fn virtual_price(&self) -> Result<u128> {
        if self.lp.total_supply == 0 {
            return Ok(0);
        }
        let d = self.d()?;
        mul_div_floor(d, tidepool_common::ONE, self.lp.total_supply).map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Swapping
    // ------------------------------------------------------------------

    /// Swaps `dx` of asset `i` for asset `j`. The output is the invariant-
    /// preserving amount less one unit of rounding slack, then less the fee;
    /// both stay in the reserves. Inputs larger than the held reserve of `i`
    /// are refused before anything moves.
    ///
    /// Returns the amount paid out.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        yb: &mut Token,
        dp: &mut Token,
        caller: AccountId,
        i: usize,
        j: usize,
        dx: u128,
        min_dy: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        if i >= N_ASSETS || j >= N_ASSETS || i == j || dx == 0 {
            return Err(Error::InvalidAmount);
        }
        if dx > self.reserves[i] {
            return Err(Error::AmountExceedsLiquidity);
        }

        let x = self.reserves[i].checked_add(dx).ok_or(Error::Overflow)?;
        let y = compute_y(self.amp, &self.reserves, i, j, x)?;
        let dy = self.reserves[j]
            .checked_sub(y)
            .and_then(|v| v.checked_sub(1))
            .ok_or(Error::Underflow)?;
        let fee = mul_div_floor(dy, self.fee_ppm, FEE_DENOMINATOR)?;
        let dy_out = dy - fee;
        if dy_out < min_dy {
            return Err(Error::SlippageExceeded);
        }

        let token_in = if i == 0 { &mut *yb } else { &mut *dp };
        token_in.transfer(caller, self.vault, dx, events)?;
        let token_out = if j == 0 { yb } else { dp };
        token_out.transfer(self.vault, caller, dy_out, events)?;
        self.reserves[i] = x;
        self.reserves[j] -= dy_out;

        events.push(Event::Swapped {
            market: self.market,
            asset_in: i as u8,
            asset_out: j as u8,
            amount_in: dx,
            amount_out: dy_out,
            fee,
        });
        Ok(dy_out)
    }

    // ------------------------------------------------------------------
    // Liquidity
    // ------------------------------------------------------------------

    /// Adds `amounts` to the reserves and mints shares in proportion to the
    /// invariant growth. One-sided adds are legal on a funded pool and pay
    /// the imbalance fee through a share discount; the reserves still gain
    /// the full amounts. The bootstrap add mints the invariant itself.
    ///
    /// Returns the minted share count.
    pub fn add_liquidity(
        &mut self,
        yb: &mut Token,
        dp: &mut Token,
        caller: AccountId,
        amounts: [u128; N_ASSETS],
        min_shares: u128,
        events: &mut Vec<Event>,
    ) -> Result<u128> {
        if yb.balance_of(caller) < amounts[0] || dp.balance_of(caller) < amounts[1] {
            return Err(Error::InsufficientBalance);
        }

        let supply = self.lp.total_supply;
        let d0 = if supply > 0 { self.d()? } else { 0 };

        let mut new_reserves = self.reserves;
        for (reserve, amount) in new_reserves.iter_mut().zip(amounts) {
            *reserve = reserve.checked_add(amount).ok_or(Error::Overflow)?;
        }
        let d1 = compute_d(self.amp, &new_reserves)?;
        if d1 <= d0 {
            return Err(Error::InvalidAmount);
        }

        let minted = if supply > 0 {
            // charge the imbalance fee against a shadow copy; the real
            // reserves keep the full amounts
            let mut adjusted = new_reserves;
            for (k, value) in adjusted.iter_mut().enumerate() {
                let ideal = mul_div_floor(self.reserves[k], d1, d0)?;
                let fee = mul_div_floor(value.abs_diff(ideal), LIQUIDITY_FEE_PPM, FEE_DENOMINATOR)?;
                *value = value.checked_sub(fee).ok_or(Error::Underflow)?;
            }
            let d2 = compute_d(self.amp, &adjusted)?;
            let grown = d2.checked_sub(d0).ok_or(Error::Underflow)?;
            mul_div_floor(supply, grown, d0)?
        } else {
            d1
        };
        if minted < min_shares {
            return Err(Error::SharesBelowMin);
        }

        if amounts[0] > 0 {
            yb.transfer(caller, self.vault, amounts[0], events)?;
        }
        if amounts[1] > 0 {
            dp.transfer(caller, self.vault, amounts[1], events)?;
        }
        self.reserves = new_reserves;
        self.lp.mint(caller, minted, events)?;

        events.push(Event::LiquidityAdded {
            market: self.market,
            amounts,
            shares: minted,
        });
        Ok(minted)
    }

    /// Burns `shares` and pays out both reserves pro rata, floored. Either
    /// output below its minimum refuses the whole operation.
    ///
    /// Returns the amounts paid out.
    pub fn remove_liquidity(
        &mut self,
        yb: &mut Token,
        dp: &mut Token,
        caller: AccountId,
        shares: u128,
        min_amounts: [u128; N_ASSETS],
        events: &mut Vec<Event>,
    ) -> Result<[u128; N_ASSETS]> {
        if shares == 0 {
            return Err(Error::InvalidAmount);
        }
        let supply = self.lp.total_supply;
        if supply == 0 || self.lp.balance_of(caller) < shares {
            return Err(Error::InsufficientBalance);
        }

        let mut amounts_out = [0u128; N_ASSETS];
        for k in 0..N_ASSETS {
            let out = mul_div_floor(self.reserves[k], shares, supply)?;
            if out < min_amounts[k] {
                return Err(Error::AmountBelowMin);
            }
            amounts_out[k] = out;
        }

        self.lp.burn(caller, shares, events)?;
        if amounts_out[0] > 0 {
            yb.transfer(self.vault, caller, amounts_out[0], events)?;
        }
        if amounts_out[1] > 0 {
            dp.transfer(self.vault, caller, amounts_out[1], events)?;
        }
        for (reserve, out) in self.reserves.iter_mut().zip(amounts_out) {
            *reserve -= out;
        }

        events.push(Event::LiquidityRemoved {
            market: self.market,
            amounts: amounts_out,
            shares,
        });
        Ok(amounts_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_swap_model::{DEFAULT_AMP, SWAP_FEE_PPM};

    fn acct(tag: &str) -> AccountId {
        AccountId::named(tag)
    }

    struct Fixture {
        yb: Token,
        dp: Token,
        pool: StableSwapPool,
        ev: Vec<Event>,
    }

    // a holds 10_000_000 of each tranche
    fn fixture() -> Fixture {
        let mut yb = Token::new(TokenKind::YieldBearing(0));
        let mut dp = Token::new(TokenKind::Protection(0));
        let mut ev = Vec::new();
        yb.mint(acct("a"), 10_000_000, &mut ev).unwrap();
        dp.mint(acct("a"), 10_000_000, &mut ev).unwrap();
        Fixture {
            yb,
            dp,
            pool: StableSwapPool::new(0, DEFAULT_AMP, SWAP_FEE_PPM),
            ev,
        }
    }

    fn funded() -> Fixture {
        let mut f = fixture();
        f.pool
            .add_liquidity(
                &mut f.yb,
                &mut f.dp,
                acct("a"),
                [1_000_000, 1_000_000],
                0,
                &mut f.ev,
            )
            .unwrap();
        f
    }

    #[test]
    fn bootstrap_add_mints_the_invariant() {
        let f = funded();
        assert_eq!(f.pool.lp.total_supply, 2_000_000);
        assert_eq!(f.pool.lp.balance_of(acct("a")), 2_000_000);
        assert_eq!(f.pool.reserves, [1_000_000, 1_000_000]);
        assert_eq!(f.yb.balance_of(f.pool.vault), 1_000_000);
        assert_eq!(f.dp.balance_of(f.pool.vault), 1_000_000);
    }

    #[test]
    fn balanced_add_mints_proportionally() {
        let mut f = funded();
        let minted = f
            .pool
            .add_liquidity(&mut f.yb, &mut f.dp, acct("a"), [100, 100], 0, &mut f.ev)
            .unwrap();
        assert_eq!(minted, 200);
        assert_eq!(f.pool.reserves, [1_000_100, 1_000_100]);
    }

    #[test]
    fn imbalanced_add_pays_the_share_discount() {
        let mut f = funded();
        let minted = f
            .pool
            .add_liquidity(&mut f.yb, &mut f.dp, acct("a"), [50, 100], 0, &mut f.ev)
            .unwrap();
        assert!((149..=151).contains(&minted), "minted {}", minted);
        // reserves gain the full amounts regardless of the discount
        assert_eq!(f.pool.reserves, [1_000_050, 1_000_100]);
    }

    #[test]
    fn empty_add_is_refused() {
        let mut f = funded();
        assert_eq!(
            f.pool
                .add_liquidity(&mut f.yb, &mut f.dp, acct("a"), [0, 0], 0, &mut f.ev),
            Err(Error::InvalidAmount)
        );
    }

    #[test]
    fn add_below_min_shares_is_refused_untouched() {
        let mut f = funded();
        let reserves_before = f.pool.reserves;
        assert_eq!(
            f.pool
                .add_liquidity(&mut f.yb, &mut f.dp, acct("a"), [100, 100], 201, &mut f.ev),
            Err(Error::SharesBelowMin)
        );
        assert_eq!(f.pool.reserves, reserves_before);
        assert_eq!(f.pool.lp.total_supply, 2_000_000);
    }

    #[test]
    fn swap_charges_the_output_fee() {
        let mut f = funded();
        let out = f
            .pool
            .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 1, 10_000, 9_000, &mut f.ev)
            .unwrap();
        // raw dy 9_999, fee 2, net 9_997
        assert_eq!(out, 9_997);
        assert_eq!(f.pool.reserves, [1_010_000, 990_003]);
        assert_eq!(f.yb.balance_of(f.pool.vault), 1_010_000);
        assert_eq!(f.dp.balance_of(f.pool.vault), 990_003);
        assert!(f.ev.contains(&Event::Swapped {
            market: 0,
            asset_in: 0,
            asset_out: 1,
            amount_in: 10_000,
            amount_out: 9_997,
            fee: 2,
        }));
    }

    #[test]
    fn swap_preserves_the_invariant_up_to_rounding() {
        let mut f = funded();
        let d_before = f.pool.d().unwrap();
        f.pool
            .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 1, 10_000, 0, &mut f.ev)
            .unwrap();
        let d_after = f.pool.d().unwrap();
        // the fee and the rounding unit stay in the pool
        assert!(d_after >= d_before - 2, "{} vs {}", d_after, d_before);
    }

    #[test]
    fn swap_guards_run_before_any_transfer() {
        let mut f = funded();
        let snapshot = (f.yb.clone(), f.dp.clone(), f.pool.clone());

        assert_eq!(
            f.pool
                .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 1, 2_000_000, 0, &mut f.ev),
            Err(Error::AmountExceedsLiquidity)
        );
        assert_eq!(
            f.pool
                .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 1, 200_000, 900_001, &mut f.ev),
            Err(Error::SlippageExceeded)
        );
        assert_eq!(
            f.pool
                .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 0, 100, 0, &mut f.ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            f.pool
                .swap(&mut f.yb, &mut f.dp, acct("a"), 2, 1, 100, 0, &mut f.ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!((f.yb, f.dp, f.pool), snapshot);
    }

    #[test]
    fn swap_is_symmetric_on_a_balanced_pool() {
        let mut f = funded();
        let out = f
            .pool
            .swap(&mut f.yb, &mut f.dp, acct("a"), 1, 0, 10_000, 9_000, &mut f.ev)
            .unwrap();
        assert_eq!(out, 9_997);
        assert_eq!(f.pool.reserves, [990_003, 1_010_000]);
    }

    #[test]
    fn remove_pays_pro_rata_and_empties_cleanly() {
        let mut f = funded();
        let out = f
            .pool
            .remove_liquidity(
                &mut f.yb,
                &mut f.dp,
                acct("a"),
                500_000,
                [0, 0],
                &mut f.ev,
            )
            .unwrap();
        assert_eq!(out, [250_000, 250_000]);
        assert_eq!(f.pool.reserves, [750_000, 750_000]);

        let rest = f
            .pool
            .remove_liquidity(
                &mut f.yb,
                &mut f.dp,
                acct("a"),
                1_500_000,
                [0, 0],
                &mut f.ev,
            )
            .unwrap();
        assert_eq!(rest, [750_000, 750_000]);
        assert_eq!(f.pool.reserves, [0, 0]);
        assert_eq!(f.pool.lp.total_supply, 0);
        assert_eq!(f.yb.balance_of(acct("a")), 10_000_000);
        assert_eq!(f.dp.balance_of(acct("a")), 10_000_000);
    }

    #[test]
    fn remove_below_min_amount_is_refused() {
        let mut f = funded();
        assert_eq!(
            f.pool
                .remove_liquidity(&mut f.yb, &mut f.dp, acct("a"), 100, [60, 50], &mut f.ev),
            Err(Error::AmountBelowMin)
        );
        assert_eq!(
            f.pool
                .remove_liquidity(&mut f.yb, &mut f.dp, acct("a"), 0, [0, 0], &mut f.ev),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            f.pool
                .remove_liquidity(
                    &mut f.yb,
                    &mut f.dp,
                    acct("b"),
                    100,
                    [0, 0],
                    &mut f.ev
                ),
            Err(Error::InsufficientBalance)
        );
    }

    #[test]
    fn virtual_price_starts_at_one_and_grows_with_fees() {
        let f = funded();
        assert_eq!(f.pool.virtual_price().unwrap(), tidepool_common::ONE);

        let mut f = funded();
        f.pool
            .swap(&mut f.yb, &mut f.dp, acct("a"), 0, 1, 100_000, 0, &mut f.ev)
            .unwrap();
        // fee stayed in the reserves; D per share cannot have fallen by more
        // than the solver's rounding unit
        assert!(f.pool.virtual_price().unwrap() >= tidepool_common::ONE - 1_000_000_000_000);

        let empty = StableSwapPool::new(0, DEFAULT_AMP, SWAP_FEE_PPM);
        assert_eq!(empty.virtual_price().unwrap(), 0);
    }
}
