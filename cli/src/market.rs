//! Market commands: create, list, split, unsplit, resolve, redeem

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine};

use crate::render;

pub fn create(
    engine: &mut Engine,
    caller: AccountId,
    maturity: u64,
    amp: u128,
    fee_ppm: u128,
) -> Result<()> {
    let market = engine
        .create_market(caller, maturity, amp, fee_ppm)
        .with_context(|| format!("market creation at maturity {} refused", maturity))?;
    let reference = engine.market(market)?.splitter.reference_rate;
    println!(
        "{} created market {} (maturity {}, amp {}, fee {} ppm, reference rate {})",
        "✓".bright_green(),
        market,
        maturity,
        amp,
        fee_ppm,
        render::fixed(reference)
    );
    Ok(())
}

pub fn list(engine: &Engine) -> Result<()> {
    println!("{}", "=== Markets ===".bright_cyan());
    if engine.market_count() == 0 {
        println!("  (none)");
        return Ok(());
    }
    for market in &engine.registry.markets {
        let s = &market.splitter;
        let status = match s.resolved_ratio {
            Some(ratio) => format!("resolved at {}", render::fixed(ratio)),
            None if engine.now >= s.maturity => "matured, unresolved".to_string(),
            None => format!("open until {}", s.maturity),
        };
        println!(
            "  {}: yb {} / dp {} outstanding, reserves [{}, {}], {}",
            market.index,
            s.yb.total_supply,
            s.dp.total_supply,
            market.amm.reserves[0],
            market.amm.reserves[1],
            status
        );
    }
    Ok(())
}

pub fn split(engine: &mut Engine, caller: AccountId, market: u64, amount: u128) -> Result<()> {
    let half = engine
        .split(caller, market, amount)
        .with_context(|| format!("split of {} on market {} refused", amount, market))?;
    println!(
        "{} split {} wrapped into {} yb + {} dp",
        "✓".bright_green(),
        amount,
        half,
        half
    );
    Ok(())
}

pub fn unsplit(engine: &mut Engine, caller: AccountId, market: u64, amount: u128) -> Result<()> {
    let half = engine
        .unsplit(caller, market, amount)
        .with_context(|| format!("unsplit of {} on market {} refused", amount, market))?;
    println!(
        "{} burned {} yb + {} dp for {} wrapped",
        "✓".bright_green(),
        half,
        half,
        amount
    );
    Ok(())
}

pub fn resolve(engine: &mut Engine, market: u64) -> Result<()> {
    let ratio = engine
        .resolve_depeg(market)
        .with_context(|| format!("resolution of market {} refused", market))?;
    println!(
        "{} market {} resolved at ratio {}",
        "✓".bright_green(),
        market,
        render::fixed(ratio)
    );
    Ok(())
}

pub fn redeem(
    engine: &mut Engine,
    caller: AccountId,
    market: u64,
    yb: u128,
    dp: u128,
) -> Result<()> {
    let payout = engine
        .redeem(caller, market, yb, dp)
        .with_context(|| format!("redemption on market {} refused", market))?;
    println!(
        "{} redeemed {} yb + {} dp for {} wrapped",
        "✓".bright_green(),
        yb,
        dp,
        payout
    );
    Ok(())
}
