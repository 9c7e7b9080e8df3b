//! In-process scenario checks
//!
//! Each scenario builds a fresh engine, drives it through a known sequence,
//! and verifies the exact amounts the arithmetic promises. They run entirely
//! in memory; the state file is never touched.

use anyhow::{ensure, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine, Error, UNLIMITED_ALLOWANCE};
use tidepool_swap_model::{DEFAULT_AMP, SWAP_FEE_PPM};

pub fn run(quick: bool) -> Result<()> {
    println!("{}", "=== Running Engine Checks ===".bright_yellow().bold());
    println!("{}", "In-process scenarios over a fresh engine\n".dimmed());

    // (name, scenario, included in --quick)
    let scenarios: &[(&str, fn() -> Result<()>, bool)] = &[
        ("Pool deposit/withdraw round trip", check_pool_round_trip, true),
        ("Rebase reprices every holder", check_rebase_reprices_every_holder, true),
        ("Dust deposits are refused", check_dust_deposit_refused, false),
        ("Transfers settle in shares", check_transfer_is_share_denominated, false),
        ("Wrapper shrugs at rebases", check_wrapper_shrugs_at_rebases, false),
        ("Depeg lifecycle pays certified amounts", check_depeg_lifecycle, true),
        ("Resolution ratio clamps at par", check_ratio_clamps_at_par, false),
        ("Swap pays the certified amount", check_swap_certified, true),
        ("Liquidity round-trips exactly", check_liquidity_round_trip, false),
        ("Value is conserved across components", check_value_conservation, false),
        ("Failed operations leave no trace", check_failures_leave_no_trace, false),
        ("Replays are deterministic", check_replay_is_deterministic, false),
    ];

    let mut passed = 0;
    let mut failed = 0;
    for (name, scenario, in_quick) in scenarios {
        if quick && !in_quick {
            continue;
        }
        match scenario() {
            Ok(()) => {
                println!("{} {}", "✓".bright_green(), name);
                passed += 1;
            }
            Err(e) => {
                println!("{} {}: {}", "✗".bright_red(), name, e);
                failed += 1;
            }
        }
    }

    print_summary(passed, failed)
}

fn print_summary(passed: usize, failed: usize) -> Result<()> {
    println!("\n{}", "=== Check Results ===".bright_cyan());
    println!("{} {} passed", "✓".bright_green(), passed);

    if failed > 0 {
        println!("{} {} failed", "✗".bright_red(), failed);
        anyhow::bail!("{} checks failed", failed);
    }

    println!("{}", "All checks passed!".green().bold());
    Ok(())
}

// ============================================================================
// Fixtures
// ============================================================================

fn owner() -> AccountId {
    AccountId::named("owner")
}

fn manager() -> AccountId {
    AccountId::named("manager")
}

fn alice() -> AccountId {
    AccountId::named("alice")
}

fn bob() -> AccountId {
    AccountId::named("bob")
}

fn booted() -> Result<Engine> {
    let mut engine = Engine::new(owner(), manager());
    engine.bind_ledger(owner())?;
    Ok(engine)
}

/// Alice deposits 2_000_000, wraps it all, and splits it on a fresh market
/// maturing at t=1000. Both tranches hold 1_000_000.
fn with_market() -> Result<Engine> {
    let mut engine = booted()?;
    engine.deposit(alice(), 2_000_000)?;
    engine.approve(alice(), engine.wrapper_id(), UNLIMITED_ALLOWANCE)?;
    engine.wrap(alice(), 2_000_000)?;
    engine.create_market(owner(), 1_000, DEFAULT_AMP, SWAP_FEE_PPM)?;
    engine.split(alice(), 0, 2_000_000)?;
    Ok(engine)
}

// ============================================================================
// Scenarios
// ============================================================================

fn check_pool_round_trip() -> Result<()> {
    let mut engine = booted()?;
    let minted = engine.deposit(alice(), 1_000)?;
    ensure!(minted == 1_000, "bootstrap minted {} shares", minted);
    ensure!(engine.balance_of(alice()) == 1_000, "balance off after deposit");

    let burned = engine.withdraw(alice(), 1_000)?;
    ensure!(burned == 1_000, "exit burned {} shares", burned);
    ensure!(engine.pool.total_pooled_value == 0, "value left behind");
    ensure!(engine.pool.total_shares == 0, "shares left behind");
    Ok(())
}

fn check_rebase_reprices_every_holder() -> Result<()> {
    let mut engine = booted()?;
    engine.deposit(alice(), 660_000)?;
    engine.deposit(bob(), 440_000)?;

    // +20% on 1_100_000 moves both balances by the same factor
    engine.rebase(manager(), 220_000)?;
    ensure!(
        engine.balance_of(alice()) == 792_000,
        "alice at {}",
        engine.balance_of(alice())
    );
    ensure!(
        engine.balance_of(bob()) == 528_000,
        "bob at {}",
        engine.balance_of(bob())
    );
    Ok(())
}

fn check_dust_deposit_refused() -> Result<()> {
    let mut engine = booted()?;
    engine.deposit(alice(), 10)?;
    engine.rebase(manager(), 990)?;

    // rate 100: 99 value floors to zero shares
    let result = engine.deposit(bob(), 99);
    ensure!(
        result == Err(Error::InvalidAmount),
        "dust deposit returned {:?}",
        result
    );
    ensure!(engine.pool.total_pooled_value == 1_000, "pool moved anyway");
    Ok(())
}

fn check_transfer_is_share_denominated() -> Result<()> {
    let mut engine = booted()?;
    engine.deposit(alice(), 10)?;
    engine.rebase(manager(), 5)?;

    // alice shows 15 at rate 1.5; 17 needs 11 shares, 16 needs exactly her 10
    ensure!(
        engine.transfer(alice(), bob(), 17) == Err(Error::InsufficientBalance),
        "transfer above the share holding went through"
    );
    engine.transfer(alice(), bob(), 16)?;
    ensure!(engine.shares_of(alice()) == 0, "alice kept shares");
    ensure!(engine.balance_of(bob()) == 15, "bob at {}", engine.balance_of(bob()));
    Ok(())
}

fn check_wrapper_shrugs_at_rebases() -> Result<()> {
    let mut engine = booted()?;
    engine.deposit(alice(), 1_000_000)?;
    engine.approve(alice(), engine.wrapper_id(), UNLIMITED_ALLOWANCE)?;
    engine.wrap(alice(), 500_000)?;

    engine.rebase(manager(), -100_000)?;
    ensure!(
        engine.wrapped_balance_of(alice()) == 500_000,
        "wrapped balance moved with the rebase"
    );
    // unwrapping returns the same share count, now worth 10% less
    engine.unwrap(alice(), 500_000)?;
    ensure!(
        engine.balance_of(alice()) == 900_000,
        "alice at {} after unwrap",
        engine.balance_of(alice())
    );
    Ok(())
}

fn check_depeg_lifecycle() -> Result<()> {
    let mut engine = with_market()?;

    // 10% depeg before maturity
    engine.rebase(manager(), -200_000)?;
    engine.set_time(1_000)?;
    let ratio = engine.resolve_depeg(0)?;
    ensure!(ratio == tidepool::ONE / 10 * 9, "ratio {}", ratio);

    // dp pays 1.1x, yb pays 0.9x, a pair pays exactly par
    let dp_only = engine.redeem(alice(), 0, 0, 500_000)?;
    ensure!(dp_only == 550_000, "dp-only paid {}", dp_only);
    let yb_only = engine.redeem(alice(), 0, 500_000, 0)?;
    ensure!(yb_only == 450_000, "yb-only paid {}", yb_only);
    let pair = engine.redeem(alice(), 0, 500_000, 500_000)?;
    ensure!(pair == 1_000_000, "pair paid {}", pair);

    // everything locked came back out
    let splitter = &engine.market(0)?.splitter;
    ensure!(splitter.yb.total_supply == 0, "yb supply left");
    ensure!(splitter.dp.total_supply == 0, "dp supply left");
    ensure!(
        engine.wrapped_balance_of(splitter.vault) == 0,
        "collateral left in the vault"
    );
    Ok(())
}

fn check_ratio_clamps_at_par() -> Result<()> {
    let mut engine = with_market()?;

    // appreciation cannot push the ratio above one
    engine.rebase(manager(), 500_000)?;
    engine.set_time(1_000)?;
    let ratio = engine.resolve_depeg(0)?;
    ensure!(ratio == tidepool::ONE, "ratio {}", ratio);

    let payout = engine.redeem(alice(), 0, 1_000, 1_000)?;
    ensure!(payout == 2_000, "pair paid {}", payout);
    Ok(())
}

fn check_swap_certified() -> Result<()> {
    let mut engine = with_market()?;
    engine.add_liquidity(alice(), 0, [1_000_000, 1_000_000], 0)?;

    let out = engine.swap(alice(), 0, 0, 1, 10_000, 0)?;
    ensure!(out == 9_997, "swap paid {}", out);

    let amm = &engine.market(0)?.amm;
    ensure!(
        amm.reserves == [1_010_000, 990_003],
        "reserves at [{}, {}]",
        amm.reserves[0],
        amm.reserves[1]
    );
    Ok(())
}

fn check_liquidity_round_trip() -> Result<()> {
    let mut engine = with_market()?;
    let minted = engine.add_liquidity(alice(), 0, [1_000_000, 1_000_000], 0)?;
    ensure!(minted == 2_000_000, "bootstrap minted {}", minted);

    let out = engine.remove_liquidity(alice(), 0, minted, [0, 0])?;
    ensure!(out == [1_000_000, 1_000_000], "exit paid [{}, {}]", out[0], out[1]);
    ensure!(
        engine.market(0)?.amm.reserves == [0, 0],
        "reserves left behind"
    );
    Ok(())
}

fn check_value_conservation() -> Result<()> {
    let mut engine = with_market()?;
    engine.add_liquidity(alice(), 0, [500_000, 500_000], 0)?;
    engine.swap(alice(), 0, 0, 1, 10_000, 0)?;

    let market = engine.market(0)?;
    let splitter = &market.splitter;
    let amm = &market.amm;

    // swaps move tranches around but never mint or burn them
    ensure!(
        splitter.yb.total_supply == 1_000_000 && splitter.dp.total_supply == 1_000_000,
        "tranche supplies drifted"
    );
    ensure!(
        engine.wrapped_balance_of(splitter.vault)
            == splitter.yb.total_supply + splitter.dp.total_supply,
        "tranche collateral out of step"
    );
    ensure!(
        splitter.yb.balance_of(amm.vault) == amm.reserves[0]
            && splitter.dp.balance_of(amm.vault) == amm.reserves[1],
        "amm vault out of step with reserves"
    );
    ensure!(
        engine.shares_of(engine.wrapper_id()) == engine.wrapped.token.total_supply,
        "wrapper vault out of step with wrapped supply"
    );
    Ok(())
}

fn check_failures_leave_no_trace() -> Result<()> {
    let mut engine = with_market()?;
    let before = engine.clone();

    ensure!(engine.withdraw(alice(), 1).is_err(), "withdraw of locked value passed");
    ensure!(engine.redeem(alice(), 0, 1, 1).is_err(), "redeem before resolution passed");
    ensure!(engine.swap(alice(), 0, 0, 1, 10, 0).is_err(), "swap on an empty pool passed");
    ensure!(engine.resolve_depeg(0).is_err(), "resolution before maturity passed");

    ensure!(engine == before, "a failed operation mutated state");
    Ok(())
}

fn check_replay_is_deterministic() -> Result<()> {
    let run = || -> Result<Engine> {
        let mut engine = with_market()?;
        engine.add_liquidity(alice(), 0, [300_000, 300_000], 0)?;
        engine.swap(alice(), 0, 1, 0, 25_000, 0)?;
        engine.rebase(manager(), -150_000)?;
        engine.set_time(1_000)?;
        engine.resolve_depeg(0)?;
        Ok(engine)
    };

    let first = run()?;
    let second = run()?;
    ensure!(first == second, "replay diverged in state");
    ensure!(first.events() == second.events(), "replay diverged in events");
    Ok(())
}
