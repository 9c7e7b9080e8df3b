//! Clock commands: advance, set, show

use anyhow::{Context, Result};
use colored::Colorize;
use tidepool::Engine;

pub fn advance(engine: &mut Engine, dt: u64) -> Result<()> {
    engine.advance_time(dt);
    println!("{} advanced clock by {} to {}", "✓".bright_green(), dt, engine.now);
    Ok(())
}

pub fn set(engine: &mut Engine, t: u64) -> Result<()> {
    engine
        .set_time(t)
        .with_context(|| format!("cannot rewind the clock to {}", t))?;
    println!("{} clock set to {}", "✓".bright_green(), t);
    Ok(())
}

pub fn show(engine: &Engine) -> Result<()> {
    println!("time: {}", engine.now);
    for market in &engine.registry.markets {
        let s = &market.splitter;
        if s.resolved_ratio.is_none() {
            let note = if engine.now >= s.maturity {
                "resolvable now"
            } else {
                "pending"
            };
            println!("  market {} matures at {} ({})", market.index, s.maturity, note);
        }
    }
    Ok(())
}
