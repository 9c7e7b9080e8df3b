//! Optional TOML defaults for the CLI

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults a `tidepool.toml` can set so invocations stay short. Every field
/// is overridable by a command-line flag.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Engine state file
    #[serde(default = "default_state")]
    pub state: PathBuf,

    /// Account commands act as when --as is absent
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Amplification for new markets
    #[serde(default = "default_amp")]
    pub amp: u128,

    /// Swap fee for new markets, parts per million
    #[serde(default = "default_fee_ppm")]
    pub fee_ppm: u128,
}

fn default_state() -> PathBuf {
    PathBuf::from("tidepool.json")
}

fn default_actor() -> String {
    "owner".to_string()
}

fn default_amp() -> u128 {
    tidepool_swap_model::DEFAULT_AMP
}

fn default_fee_ppm() -> u128 {
    tidepool_swap_model::SWAP_FEE_PPM
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            state: default_state(),
            actor: default_actor(),
            amp: default_amp(),
            fee_ppm: default_fee_ppm(),
        }
    }
}

impl CliConfig {
    /// Loads from `path` if given, else from `./tidepool.toml` if present,
    /// else built-in defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::read(p),
            None => {
                let implicit = Path::new("tidepool.toml");
                if implicit.exists() {
                    Self::read(implicit)
                } else {
                    Ok(CliConfig::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}
