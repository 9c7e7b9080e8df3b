//! AMM commands: swap, add-liquidity, remove-liquidity, status

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine};

use crate::render;

/// Maps the asset named on the command line to its pool index.
fn asset_index(name: &str) -> Result<usize> {
    match name {
        "yb" => Ok(0),
        "dp" => Ok(1),
        _ => anyhow::bail!("unknown asset {:?}; use yb or dp", name),
    }
}

pub fn swap(
    engine: &mut Engine,
    caller: AccountId,
    market: u64,
    sell: &str,
    amount: u128,
    min_out: u128,
) -> Result<()> {
    let i = asset_index(sell)?;
    let j = 1 - i;
    let out = engine
        .swap(caller, market, i, j, amount, min_out)
        .with_context(|| format!("swap of {} {} on market {} refused", amount, sell, market))?;
    let bought = if j == 0 { "yb" } else { "dp" };
    println!(
        "{} swapped {} {} for {} {}",
        "✓".bright_green(),
        amount,
        sell,
        out,
        bought
    );
    Ok(())
}

pub fn add_liquidity(
    engine: &mut Engine,
    caller: AccountId,
    market: u64,
    yb: u128,
    dp: u128,
    min_shares: u128,
) -> Result<()> {
    let minted = engine
        .add_liquidity(caller, market, [yb, dp], min_shares)
        .with_context(|| format!("liquidity add on market {} refused", market))?;
    println!(
        "{} added [{} yb, {} dp], minted {} pool shares",
        "✓".bright_green(),
        yb,
        dp,
        minted
    );
    Ok(())
}

pub fn remove_liquidity(
    engine: &mut Engine,
    caller: AccountId,
    market: u64,
    shares: u128,
    min_yb: u128,
    min_dp: u128,
) -> Result<()> {
    let out = engine
        .remove_liquidity(caller, market, shares, [min_yb, min_dp])
        .with_context(|| format!("liquidity removal on market {} refused", market))?;
    println!(
        "{} burned {} pool shares for [{} yb, {} dp]",
        "✓".bright_green(),
        shares,
        out[0],
        out[1]
    );
    Ok(())
}

pub fn status(engine: &Engine, market: u64) -> Result<()> {
    let m = engine.market(market)?;
    let amm = &m.amm;
    println!("{}", format!("=== Market {} AMM ===", market).bright_cyan());
    println!("  reserves:      [{} yb, {} dp]", amm.reserves[0], amm.reserves[1]);
    println!("  pool shares:   {}", amm.lp.total_supply);
    println!("  amp:           {}", amm.amp);
    println!("  fee:           {} ppm", amm.fee_ppm);
    if amm.lp.total_supply > 0 {
        println!("  invariant D:   {}", amm.d()?);
        println!("  virtual price: {}", render::fixed(amm.virtual_price()?));
    }
    Ok(())
}
