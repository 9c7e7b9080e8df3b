//! Pool commands: deposit, withdraw, rebase, status

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine};

use crate::render;

pub fn deposit(engine: &mut Engine, caller: AccountId, value: u128) -> Result<()> {
    let minted = engine
        .deposit(caller, value)
        .with_context(|| format!("deposit of {} refused", value))?;
    println!(
        "{} {} deposited {}, minted {} shares",
        "✓".bright_green(),
        caller,
        value,
        minted
    );
    Ok(())
}

pub fn withdraw(engine: &mut Engine, caller: AccountId, amount: u128) -> Result<()> {
    let burned = engine
        .withdraw(caller, amount)
        .with_context(|| format!("withdrawal of {} refused", amount))?;
    println!(
        "{} {} withdrew {}, burned {} shares",
        "✓".bright_green(),
        caller,
        amount,
        burned
    );
    Ok(())
}

pub fn rebase(engine: &mut Engine, caller: AccountId, delta: i128) -> Result<()> {
    engine
        .rebase(caller, delta)
        .with_context(|| format!("rebase of {:+} refused", delta))?;
    println!(
        "{} rebased {:+}, pool value now {}",
        "✓".bright_green(),
        delta,
        engine.pool.total_pooled_value
    );
    Ok(())
}

pub fn status(engine: &Engine) -> Result<()> {
    println!("{}", "=== Pool ===".bright_cyan());
    println!("  value:  {}", engine.pool.total_pooled_value);
    println!("  shares: {}", engine.pool.total_shares);
    println!("  rate:   {}", render::fixed(engine.pool_rate()?));
    println!("  owner:   {}", engine.owner);
    println!("  manager: {}", engine.controller.manager);
    Ok(())
}
