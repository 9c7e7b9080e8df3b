//! Event log commands

use anyhow::Result;
use colored::Colorize;
use tidepool::Engine;

use crate::render;

/// Prints the log, oldest first. `limit` keeps only the tail; `drain` empties
/// the log after printing (the drain is what gets persisted).
pub fn show(engine: &mut Engine, limit: Option<usize>, drain: bool) -> Result<()> {
    let total = engine.events().len();
    let skip = match limit {
        Some(n) if n < total => total - n,
        _ => 0,
    };

    println!(
        "{}",
        format!("=== Events ({} recorded) ===", total).bright_cyan()
    );
    for (index, event) in engine.events().iter().enumerate().skip(skip) {
        println!("  {:>4}  {}", index, render::event_line(event));
    }

    if drain {
        let drained = engine.drain_events();
        println!("{} drained {} events", "✓".bright_green(), drained.len());
    }
    Ok(())
}
