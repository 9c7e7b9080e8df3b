//! Engine facade
//!
//! The one mutation surface over the whole system. The engine owns the pool
//! totals, the ledger, the wrapper, the market registry, a logical clock,
//! and the event log, and threads them through the component operations so
//! callers never juggle borrows themselves. Methods validate authorization
//! and market existence here; everything deeper validates its own amounts.

use alloc::vec::Vec;

use crate::account::AccountId;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::ledger::ShareLedger;
use crate::market::{Market, MarketRegistry};
use crate::pool::{PoolController, PoolState};
use crate::wrapped::WrappedToken;

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Engine {
    /// Account allowed to create markets and bind the ledger
    pub owner: AccountId,

    /// Pool totals every ledger balance derives from
    pub pool: PoolState,

    /// Rebasing share ledger
    pub ledger: ShareLedger,

    /// Deposit/withdraw/rebase gatekeeper
    pub controller: PoolController,

    /// Non-rebasing wrapper
    pub wrapped: WrappedToken,

    /// Tranche markets
    pub registry: MarketRegistry,

    /// Logical clock; only moves forward
    pub now: u64,

    /// Append-only event log
    pub events: Vec<Event>,
}

impl Engine {
    pub fn new(owner: AccountId, manager: AccountId) -> Self {
        Engine {
            owner,
            pool: PoolState::default(),
            ledger: ShareLedger::new(),
            controller: PoolController::new(manager),
            wrapped: WrappedToken::new(),
            registry: MarketRegistry::new(),
            now: 0,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Setup and clock
    // ------------------------------------------------------------------

    /// Owner-only one-time ledger binding; everything upstream of the pool
    /// controller is inert until this runs.
    pub fn bind_ledger(&mut self, caller: AccountId) -> Result<()> {
        if caller != self.owner {
            return Err(Error::AuthorizationDenied);
        }
        self.controller.bind_ledger()
    }

    pub fn advance_time(&mut self, dt: u64) {
        self.now = self.now.saturating_add(dt);
    }

    /// Jumps the clock to `t`. Rewinding is refused.
    pub fn set_time(&mut self, t: u64) -> Result<()> {
        if t < self.now {
            return Err(Error::InvalidAmount);
        }
        self.now = t;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pool operations
    // ------------------------------------------------------------------

    pub fn deposit(&mut self, caller: AccountId, value: u128) -> Result<u128> {
        self.controller
            .deposit(&mut self.pool, &mut self.ledger, caller, value, &mut self.events)
    }

    pub fn withdraw(&mut self, caller: AccountId, amount: u128) -> Result<u128> {
        self.controller
            .withdraw(&mut self.pool, &mut self.ledger, caller, amount, &mut self.events)
    }

    pub fn rebase(&mut self, caller: AccountId, delta: i128) -> Result<()> {
        self.controller
            .rebase(&mut self.pool, caller, delta, &mut self.events)
    }

    pub fn pool_rate(&self) -> Result<u128> {
        self.pool.rate()
    }

    // ------------------------------------------------------------------
    // Ledger operations
    // ------------------------------------------------------------------

    pub fn transfer(&mut self, caller: AccountId, to: AccountId, amount: u128) -> Result<()> {
        self.ledger
            .transfer(&self.pool, caller, to, amount, &mut self.events)
    }

    pub fn transfer_shares(
        &mut self,
        caller: AccountId,
        to: AccountId,
        shares: u128,
    ) -> Result<()> {
        self.ledger
            .transfer_shares(&self.pool, caller, to, shares, &mut self.events)
    }

    pub fn approve(&mut self, caller: AccountId, spender: AccountId, amount: u128) -> Result<()> {
        self.ledger
            .approve(caller, spender, amount, &mut self.events)
    }

    pub fn transfer_from(
        &mut self,
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<()> {
        self.ledger
            .transfer_from(&self.pool, caller, from, to, amount, &mut self.events)
    }

    pub fn balance_of(&self, account: AccountId) -> u128 {
        self.ledger.balance_of(&self.pool, account)
    }

    pub fn shares_of(&self, account: AccountId) -> u128 {
        self.ledger.shares_of(account)
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    // ------------------------------------------------------------------
    // Wrapper operations
    // ------------------------------------------------------------------

    /// The wrapper's spender identity; approve this id before wrapping.
    pub fn wrapper_id(&self) -> AccountId {
        self.wrapped.vault
    }

    pub fn wrap(&mut self, caller: AccountId, amount: u128) -> Result<u128> {
        self.wrapped
            .wrap(&self.pool, &mut self.ledger, caller, amount, &mut self.events)
    }

    pub fn unwrap(&mut self, caller: AccountId, wrapped_amount: u128) -> Result<u128> {
        self.wrapped.unwrap(
            &self.pool,
            &mut self.ledger,
            caller,
            wrapped_amount,
            &mut self.events,
        )
    }

    pub fn wrapped_transfer(
        &mut self,
        caller: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<()> {
        self.wrapped
            .token
            .transfer(caller, to, amount, &mut self.events)
    }

    pub fn wrapped_balance_of(&self, account: AccountId) -> u128 {
        self.wrapped.token.balance_of(account)
    }

    // ------------------------------------------------------------------
    // Market lifecycle
    // ------------------------------------------------------------------

    /// Owner-only. Snapshots the live pool rate as the market's reference,
    /// which must be nonzero, and requires a strictly future maturity.
    pub fn create_market(
        &mut self,
        caller: AccountId,
        maturity: u64,
        amp: u128,
        fee_ppm: u128,
    ) -> Result<u64> {
        if caller != self.owner {
            return Err(Error::AuthorizationDenied);
        }
        if maturity <= self.now {
            return Err(Error::InvalidAmount);
        }
        let reference_rate = self.pool.rate()?;
        if reference_rate == 0 {
            return Err(Error::InvalidAmount);
        }
        let market = self.registry.create(reference_rate, maturity, amp, fee_ppm)?;
        self.events.push(Event::MarketCreated {
            market,
            maturity,
            reference_rate,
        });
        Ok(market)
    }

    pub fn market_count(&self) -> u64 {
        self.registry.count()
    }

    pub fn market(&self, index: u64) -> Result<&Market> {
        self.registry.get(index)
    }

    pub fn split(&mut self, caller: AccountId, market: u64, amount: u128) -> Result<u128> {
        let m = self.registry.get_mut(market)?;
        m.splitter
            .split(&mut self.wrapped.token, caller, amount, &mut self.events)
    }

    pub fn unsplit(&mut self, caller: AccountId, market: u64, amount: u128) -> Result<u128> {
        let m = self.registry.get_mut(market)?;
        m.splitter
            .unsplit(&mut self.wrapped.token, caller, amount, &mut self.events)
    }

    /// Permissionless once the market's maturity has passed.
    pub fn resolve_depeg(&mut self, market: u64) -> Result<u128> {
        let now = self.now;
        let m = self.registry.get_mut(market)?;
        m.splitter.resolve(now, &self.pool, &mut self.events)
    }

    pub fn redeem(
        &mut self,
        caller: AccountId,
        market: u64,
        yb_amount: u128,
        dp_amount: u128,
    ) -> Result<u128> {
        let m = self.registry.get_mut(market)?;
        m.splitter.redeem(
            &mut self.wrapped.token,
            caller,
            yb_amount,
            dp_amount,
            &mut self.events,
        )
    }

    // ------------------------------------------------------------------
    // Market trading
    // ------------------------------------------------------------------

    pub fn swap(
        &mut self,
        caller: AccountId,
        market: u64,
        asset_in: usize,
        asset_out: usize,
        dx: u128,
        min_dy: u128,
    ) -> Result<u128> {
        let m = self.registry.get_mut(market)?;
        m.amm.swap(
            &mut m.splitter.yb,
            &mut m.splitter.dp,
            caller,
            asset_in,
            asset_out,
            dx,
            min_dy,
            &mut self.events,
        )
    }

    pub fn add_liquidity(
        &mut self,
        caller: AccountId,
        market: u64,
        amounts: [u128; 2],
        min_shares: u128,
    ) -> Result<u128> {
        let m = self.registry.get_mut(market)?;
        m.amm.add_liquidity(
            &mut m.splitter.yb,
            &mut m.splitter.dp,
            caller,
            amounts,
            min_shares,
            &mut self.events,
        )
    }

    pub fn remove_liquidity(
        &mut self,
        caller: AccountId,
        market: u64,
        shares: u128,
        min_amounts: [u128; 2],
    ) -> Result<[u128; 2]> {
        let m = self.registry.get_mut(market)?;
        m.amm.remove_liquidity(
            &mut m.splitter.yb,
            &mut m.splitter.dp,
            caller,
            shares,
            min_amounts,
            &mut self.events,
        )
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }
}
