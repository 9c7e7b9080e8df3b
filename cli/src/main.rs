//! Tidepool CLI - drive a tidepool engine from the command line
//!
//! The engine lives in a JSON state file between invocations; every command
//! loads it, applies one operation, and writes it back. Failed operations
//! leave the file untouched. `tidepool check` runs the in-process scenario
//! suite against a fresh engine instead.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod amm;
mod check;
mod clock;
mod config;
mod events;
mod ledger;
mod market;
mod pool;
mod render;
mod state;
mod wrap;

use config::CliConfig;
use tidepool::{AccountId, Engine, UNLIMITED_ALLOWANCE};

#[derive(Parser)]
#[command(name = "tidepool")]
#[command(about = "Tidepool engine CLI - rebasing pool, tranche markets, StableSwap", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the JSON engine state file
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Path to a TOML config with defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Account to act as
    #[arg(short = 'a', long = "as", value_name = "ACCOUNT")]
    actor: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh engine state file
    Init {
        /// Owner account (creates markets, binds the ledger)
        #[arg(long, default_value = "owner")]
        owner: String,

        /// Manager account (applies rebases)
        #[arg(long, default_value = "manager")]
        manager: String,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Share pool operations
    Pool {
        #[command(subcommand)]
        command: PoolCommands,
    },

    /// Rebasing ledger operations
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },

    /// Wrapper operations
    Wrap {
        #[command(subcommand)]
        command: WrapCommands,
    },

    /// Tranche market operations
    Market {
        #[command(subcommand)]
        command: MarketCommands,
    },

    /// StableSwap operations
    Amm {
        #[command(subcommand)]
        command: AmmCommands,
    },

    /// Logical clock operations
    Time {
        #[command(subcommand)]
        command: TimeCommands,
    },

    /// Print the event log
    Events {
        /// Show only the last N events
        #[arg(short, long)]
        limit: Option<usize>,

        /// Empty the log after printing
        #[arg(long)]
        drain: bool,
    },

    /// Run the in-process scenario checks
    Check {
        /// Run the quick subset only
        #[arg(long)]
        quick: bool,
    },
}

#[derive(Subcommand)]
enum PoolCommands {
    /// Deposit underlying value, minting shares at the live rate
    Deposit {
        /// Amount of underlying value
        value: u128,
    },

    /// Withdraw underlying value, burning shares at the live rate
    Withdraw {
        /// Amount of underlying value
        amount: u128,
    },

    /// Adjust the pool value (manager only); shares stay fixed
    Rebase {
        /// Signed value delta
        #[arg(allow_negative_numbers = true)]
        delta: i128,
    },

    /// Show the pool totals and rate
    Status,
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// Transfer a value amount (settles in floored shares)
    Transfer {
        /// Recipient account
        to: String,

        /// Amount of underlying value
        amount: u128,
    },

    /// Transfer an exact share count
    TransferShares {
        /// Recipient account
        to: String,

        /// Share count
        shares: u128,
    },

    /// Grant a spender an allowance
    Approve {
        /// Spender account
        spender: String,

        /// Allowance amount
        #[arg(required_unless_present = "unlimited", conflicts_with = "unlimited")]
        amount: Option<u128>,

        /// Grant the never-decremented unlimited allowance
        #[arg(long)]
        unlimited: bool,
    },

    /// Show an account's balance, shares, and wrapped holding
    Balance {
        /// Account to inspect (defaults to --as)
        account: Option<String>,
    },
}

#[derive(Subcommand)]
enum WrapCommands {
    /// Wrap underlying value into non-rebasing wrapped tokens
    Wrap {
        /// Amount of underlying value
        amount: u128,
    },

    /// Unwrap wrapped tokens back into shares
    Unwrap {
        /// Wrapped amount
        amount: u128,
    },

    /// Show the wrapper's supply and conversion rates
    Rates,
}

#[derive(Subcommand)]
enum MarketCommands {
    /// Create a tranche market maturing at the given time
    Create {
        /// Maturity timestamp (must be in the future)
        maturity: u64,

        /// Amplification coefficient (default from config)
        #[arg(long)]
        amp: Option<u128>,

        /// Swap fee in parts per million (default from config)
        #[arg(long)]
        fee_ppm: Option<u128>,
    },

    /// List all markets
    List,

    /// Split wrapped collateral into equal yb and dp tranches
    Split {
        /// Market index
        market: u64,

        /// Wrapped amount (must be even)
        amount: u128,
    },

    /// Merge equal tranches back into wrapped collateral
    Unsplit {
        /// Market index
        market: u64,

        /// Wrapped amount (must be even)
        amount: u128,
    },

    /// Record the realized peg ratio (permissionless after maturity)
    Resolve {
        /// Market index
        market: u64,
    },

    /// Redeem tranches for wrapped collateral at the resolved ratio
    Redeem {
        /// Market index
        market: u64,

        /// Yield-bearing amount to redeem
        #[arg(long, default_value = "0")]
        yb: u128,

        /// Protection amount to redeem
        #[arg(long, default_value = "0")]
        dp: u128,
    },
}

#[derive(Subcommand)]
enum AmmCommands {
    /// Swap one tranche for the other
    Swap {
        /// Market index
        market: u64,

        /// Asset to sell (yb or dp)
        sell: String,

        /// Amount to sell
        amount: u128,

        /// Minimum acceptable output
        #[arg(long, default_value = "0")]
        min_out: u128,
    },

    /// Deposit tranches into the pool for liquidity shares
    AddLiquidity {
        /// Market index
        market: u64,

        /// Yield-bearing amount
        yb: u128,

        /// Protection amount
        dp: u128,

        /// Minimum acceptable share mint
        #[arg(long, default_value = "0")]
        min_shares: u128,
    },

    /// Burn liquidity shares for a pro-rata slice of the reserves
    RemoveLiquidity {
        /// Market index
        market: u64,

        /// Share count to burn
        shares: u128,

        /// Minimum acceptable yb output
        #[arg(long, default_value = "0")]
        min_yb: u128,

        /// Minimum acceptable dp output
        #[arg(long, default_value = "0")]
        min_dp: u128,
    },

    /// Show a market's reserves, shares, and invariant
    Status {
        /// Market index
        market: u64,
    },
}

#[derive(Subcommand)]
enum TimeCommands {
    /// Move the clock forward
    Advance {
        /// Seconds to advance
        dt: u64,
    },

    /// Jump the clock to an absolute time (no rewinding)
    Set {
        /// Target time
        t: u64,
    },

    /// Show the clock and pending maturities
    Show,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    let state_path = cli.state.clone().unwrap_or_else(|| config.state.clone());
    let actor = cli.actor.clone().unwrap_or_else(|| config.actor.clone());
    let caller = AccountId::named(&actor);

    if cli.verbose {
        println!("{} {}", "State:".bright_cyan(), state_path.display());
        println!("{} {}", "Acting as:".bright_cyan(), actor);
    }

    // Init creates the state file and Check runs stateless; everything else
    // loads the engine, applies the command, and saves it back.
    match &cli.command {
        Commands::Init {
            owner,
            manager,
            force,
        } => {
            let mut engine = Engine::new(AccountId::named(owner), AccountId::named(manager));
            engine.bind_ledger(AccountId::named(owner))?;
            state::create(&state_path, &engine, *force)?;
            println!(
                "{} initialized engine state at {}",
                "✓".bright_green(),
                state_path.display()
            );
            println!("  owner:   {}", owner);
            println!("  manager: {}", manager);
            return Ok(());
        }
        Commands::Check { quick } => return check::run(*quick),
        _ => {}
    }

    let mut engine = state::load(&state_path)?;

    match cli.command {
        Commands::Init { .. } | Commands::Check { .. } => {}
        Commands::Pool { command } => match command {
            PoolCommands::Deposit { value } => pool::deposit(&mut engine, caller, value)?,
            PoolCommands::Withdraw { amount } => pool::withdraw(&mut engine, caller, amount)?,
            PoolCommands::Rebase { delta } => pool::rebase(&mut engine, caller, delta)?,
            PoolCommands::Status => pool::status(&engine)?,
        },
        Commands::Ledger { command } => match command {
            LedgerCommands::Transfer { to, amount } => {
                ledger::transfer(&mut engine, caller, AccountId::named(&to), amount)?;
            }
            LedgerCommands::TransferShares { to, shares } => {
                ledger::transfer_shares(&mut engine, caller, AccountId::named(&to), shares)?;
            }
            LedgerCommands::Approve {
                spender,
                amount,
                unlimited: _,
            } => {
                let amount = amount.unwrap_or(UNLIMITED_ALLOWANCE);
                ledger::approve(&mut engine, caller, AccountId::named(&spender), amount)?;
            }
            LedgerCommands::Balance { account } => {
                let target = account.map_or(caller, |name| AccountId::named(&name));
                ledger::balance(&engine, target)?;
            }
        },
        Commands::Wrap { command } => match command {
            WrapCommands::Wrap { amount } => wrap::wrap(&mut engine, caller, amount)?,
            WrapCommands::Unwrap { amount } => wrap::unwrap(&mut engine, caller, amount)?,
            WrapCommands::Rates => wrap::rates(&engine)?,
        },
        Commands::Market { command } => match command {
            MarketCommands::Create {
                maturity,
                amp,
                fee_ppm,
            } => {
                let amp = amp.unwrap_or(config.amp);
                let fee_ppm = fee_ppm.unwrap_or(config.fee_ppm);
                market::create(&mut engine, caller, maturity, amp, fee_ppm)?;
            }
            MarketCommands::List => market::list(&engine)?,
            MarketCommands::Split { market, amount } => {
                market::split(&mut engine, caller, market, amount)?;
            }
            MarketCommands::Unsplit { market, amount } => {
                market::unsplit(&mut engine, caller, market, amount)?;
            }
            MarketCommands::Resolve { market } => market::resolve(&mut engine, market)?,
            MarketCommands::Redeem { market, yb, dp } => {
                market::redeem(&mut engine, caller, market, yb, dp)?;
            }
        },
        Commands::Amm { command } => match command {
            AmmCommands::Swap {
                market,
                sell,
                amount,
                min_out,
            } => {
                amm::swap(&mut engine, caller, market, &sell, amount, min_out)?;
            }
            AmmCommands::AddLiquidity {
                market,
                yb,
                dp,
                min_shares,
            } => {
                amm::add_liquidity(&mut engine, caller, market, yb, dp, min_shares)?;
            }
            AmmCommands::RemoveLiquidity {
                market,
                shares,
                min_yb,
                min_dp,
            } => {
                amm::remove_liquidity(&mut engine, caller, market, shares, min_yb, min_dp)?;
            }
            AmmCommands::Status { market } => amm::status(&engine, market)?,
        },
        Commands::Time { command } => match command {
            TimeCommands::Advance { dt } => clock::advance(&mut engine, dt)?,
            TimeCommands::Set { t } => clock::set(&mut engine, t)?,
            TimeCommands::Show => clock::show(&engine)?,
        },
        Commands::Events { limit, drain } => events::show(&mut engine, limit, drain)?,
    }

    state::save(&state_path, &engine)?;
    Ok(())
}
