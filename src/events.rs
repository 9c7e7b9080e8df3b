//! Append-only event log
//!
//! Every state mutation emits one or more events into the engine's log.
//! Ledger movements emit a dual record: the balance-denominated `Transfer`
//! plus the share-denominated `TransferShares`, because the two quantities
//! drift apart whenever the pool rate is not exactly 1.

use crate::account::AccountId;

// ============================================================================
// TokenKind
// ============================================================================

/// Which token family an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// The rebasing share ledger
    Underlying,

    /// The non-rebasing wrapper
    Wrapped,

    /// Yield-bearing tranche of the given market
    YieldBearing(u64),

    /// Depeg-protection tranche of the given market
    Protection(u64),

    /// Liquidity shares of the given market's swap pool
    PoolShare(u64),
}

// ============================================================================
// Event
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Balance-denominated movement; mints come from and burns go to the
    /// all-zero account.
    Transfer {
        token: TokenKind,
        from: AccountId,
        to: AccountId,
        amount: u128,
    },

    /// Share-denominated movement on the rebasing ledger
    TransferShares {
        from: AccountId,
        to: AccountId,
        shares: u128,
    },

    /// Allowance set on the rebasing ledger
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    },

    /// Value entered the pool and shares were minted
    Deposited {
        account: AccountId,
        value: u128,
        shares: u128,
    },

    /// Value left the pool and shares were burned
    Withdrawn {
        account: AccountId,
        value: u128,
        shares: u128,
    },

    /// Manager adjusted the pool's total value
    Rebased { delta: i128, new_value: u128 },

    /// A tranche market was created at this index
    MarketCreated {
        market: u64,
        maturity: u64,
        reference_rate: u128,
    },

    /// Depeg resolution was frozen for the market
    DepegResolved { market: u64, realized_ratio: u128 },

    /// A swap executed on the market's pool
    Swapped {
        market: u64,
        asset_in: u8,
        asset_out: u8,
        amount_in: u128,
        amount_out: u128,
        fee: u128,
    },

    /// Liquidity entered the market's pool
    LiquidityAdded {
        market: u64,
        amounts: [u128; 2],
        shares: u128,
    },

    /// Liquidity left the market's pool
    LiquidityRemoved {
        market: u64,
        amounts: [u128; 2],
        shares: u128,
    },
}
