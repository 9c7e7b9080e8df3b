//! Market registry
//!
//! A market is a tranche splitter plus a swap pool over its pair, created
//! together and addressed by a dense index. Creation is all-or-nothing:
//! parameters are validated first and the two components are built and
//! pushed in one step, so a market either exists completely or not at all.

use alloc::vec::Vec;

use tidepool_swap_model::FEE_DENOMINATOR;

use crate::amm::StableSwapPool;
use crate::error::{Error, Result};
use crate::tranche::TrancheSplitter;

// ============================================================================
// Market
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Market {
    /// Dense registry index
    pub index: u64,

    /// Tranche splitter holding the market's collateral
    pub splitter: TrancheSplitter,

    /// StableSwap pool over the tranche pair
    pub amm: StableSwapPool,
}

// ============================================================================
// MarketRegistry
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketRegistry {
    pub markets: Vec<Market>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        MarketRegistry::default()
    }

    pub fn count(&self) -> u64 {
        self.markets.len() as u64
    }

    pub fn get(&self, index: u64) -> Result<&Market> {
        self.markets
            .get(index as usize)
            .ok_or(Error::UnknownMarket)
    }

    pub fn get_mut(&mut self, index: u64) -> Result<&mut Market> {
        self.markets
            .get_mut(index as usize)
            .ok_or(Error::UnknownMarket)
    }

    /// Creates a market at the next index. The caller has already validated
    /// ownership, the maturity, and the reference rate; this validates the
    /// pool parameters.
    pub fn create(
        &mut self,
        reference_rate: u128,
        maturity: u64,
        amp: u128,
        fee_ppm: u128,
    ) -> Result<u64> {
        if amp == 0 || fee_ppm >= FEE_DENOMINATOR {
            return Err(Error::InvalidAmount);
        }
        let index = self.count();
        self.markets.push(Market {
            index,
            splitter: TrancheSplitter::new(index, reference_rate, maturity),
            amm: StableSwapPool::new(index, amp, fee_ppm),
        });
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_common::ONE;
    use tidepool_swap_model::{DEFAULT_AMP, SWAP_FEE_PPM};

    #[test]
    fn indices_are_dense_and_stable() {
        let mut reg = MarketRegistry::new();
        assert_eq!(reg.create(ONE, 100, DEFAULT_AMP, SWAP_FEE_PPM), Ok(0));
        assert_eq!(reg.create(ONE, 200, DEFAULT_AMP, SWAP_FEE_PPM), Ok(1));
        assert_eq!(reg.count(), 2);
        assert_eq!(reg.get(0).unwrap().splitter.maturity, 100);
        assert_eq!(reg.get(1).unwrap().splitter.maturity, 200);
        assert_eq!(reg.get(2), Err(Error::UnknownMarket));
    }

    #[test]
    fn components_are_keyed_by_their_index() {
        let mut reg = MarketRegistry::new();
        reg.create(ONE, 100, DEFAULT_AMP, SWAP_FEE_PPM).unwrap();
        reg.create(ONE, 100, DEFAULT_AMP, SWAP_FEE_PPM).unwrap();
        let a = reg.get(0).unwrap();
        let b = reg.get(1).unwrap();
        assert_ne!(a.splitter.vault, b.splitter.vault);
        assert_ne!(a.amm.vault, b.amm.vault);
        assert_ne!(a.splitter.vault, a.amm.vault);
    }

    #[test]
    fn bad_pool_parameters_are_refused() {
        let mut reg = MarketRegistry::new();
        assert_eq!(
            reg.create(ONE, 100, 0, SWAP_FEE_PPM),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            reg.create(ONE, 100, DEFAULT_AMP, FEE_DENOMINATOR),
            Err(Error::InvalidAmount)
        );
        assert_eq!(reg.count(), 0);
    }
}
