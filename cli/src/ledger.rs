//! Ledger commands: transfer, transfer-shares, approve, balance

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine, UNLIMITED_ALLOWANCE};

use crate::render;

pub fn transfer(engine: &mut Engine, caller: AccountId, to: AccountId, amount: u128) -> Result<()> {
    engine
        .transfer(caller, to, amount)
        .with_context(|| format!("transfer of {} to {} refused", amount, to))?;
    println!(
        "{} transferred {} from {} to {}",
        "✓".bright_green(),
        amount,
        caller,
        to
    );
    Ok(())
}

pub fn transfer_shares(
    engine: &mut Engine,
    caller: AccountId,
    to: AccountId,
    shares: u128,
) -> Result<()> {
    engine
        .transfer_shares(caller, to, shares)
        .with_context(|| format!("share transfer of {} to {} refused", shares, to))?;
    println!(
        "{} transferred {} shares from {} to {}",
        "✓".bright_green(),
        shares,
        caller,
        to
    );
    Ok(())
}

pub fn approve(
    engine: &mut Engine,
    caller: AccountId,
    spender: AccountId,
    amount: u128,
) -> Result<()> {
    engine
        .approve(caller, spender, amount)
        .context("approve refused")?;
    if amount == UNLIMITED_ALLOWANCE {
        println!(
            "{} {} granted {} an unlimited allowance",
            "✓".bright_green(),
            caller,
            spender
        );
    } else {
        println!(
            "{} {} granted {} an allowance of {}",
            "✓".bright_green(),
            caller,
            spender,
            amount
        );
    }
    Ok(())
}

pub fn balance(engine: &Engine, account: AccountId) -> Result<()> {
    println!("{}", format!("=== {} ===", account).bright_cyan());
    println!("  balance: {}", engine.balance_of(account));
    println!("  shares:  {}", engine.shares_of(account));
    println!("  wrapped: {}", engine.wrapped_balance_of(account));
    if engine.pool.total_shares > 0 {
        println!("  rate:    {}", render::fixed(engine.pool_rate()?));
    }
    Ok(())
}
