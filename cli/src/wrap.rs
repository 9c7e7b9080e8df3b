//! Wrapper commands: wrap, unwrap, rates
//!
//! Wrapping needs an allowance toward the wrapper's vault id first; the
//! failure message points at the approve command when that is what is
//! missing.

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::{AccountId, Engine, Error};

use crate::render;

pub fn wrap(engine: &mut Engine, caller: AccountId, amount: u128) -> Result<()> {
    let minted = match engine.wrap(caller, amount) {
        Ok(minted) => minted,
        Err(Error::InsufficientAllowance) => {
            anyhow::bail!(
                "wrap refused: no allowance; run `tidepool ledger approve {} --unlimited` first",
                engine.wrapper_id()
            );
        }
        Err(e) => return Err(e).with_context(|| format!("wrap of {} refused", amount)),
    };
    println!(
        "{} wrapped {} underlying into {} wrapped",
        "✓".bright_green(),
        amount,
        minted
    );
    Ok(())
}

pub fn unwrap(engine: &mut Engine, caller: AccountId, amount: u128) -> Result<()> {
    let released = engine
        .unwrap(caller, amount)
        .with_context(|| format!("unwrap of {} refused", amount))?;
    println!(
        "{} unwrapped {} into {} shares",
        "✓".bright_green(),
        amount,
        released
    );
    Ok(())
}

pub fn rates(engine: &Engine) -> Result<()> {
    println!("{}", "=== Wrapper ===".bright_cyan());
    println!("  vault id:  {}", engine.wrapper_id());
    println!("  supply:    {}", engine.wrapped.token.total_supply);
    println!(
        "  wrapped per underlying: {}",
        render::fixed(engine.wrapped.wrapped_per_underlying(&engine.pool)?)
    );
    println!(
        "  underlying per wrapped: {}",
        render::fixed(engine.wrapped.underlying_per_wrapped(&engine.pool)?)
    );
    Ok(())
}
