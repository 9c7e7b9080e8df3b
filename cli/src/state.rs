//! Engine state persistence
//!
//! The whole engine round-trips through one JSON file between invocations.
//! Saves go through a sibling temp file and a rename, so a crash mid-write
//! leaves the previous state intact.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tidepool::Engine;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no state file at {0}; run `tidepool init` first")]
    Missing(PathBuf),

    #[error("state file {path} already exists; pass --force to overwrite")]
    Exists { path: PathBuf },

    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state file {path} is not valid engine state: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load(path: &Path) -> Result<Engine, StateError> {
    if !path.exists() {
        return Err(StateError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| StateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let engine = serde_json::from_str(&text).map_err(|source| StateError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded engine state from {}", path.display());
    Ok(engine)
}

pub fn save(path: &Path, engine: &Engine) -> Result<(), StateError> {
    // to_string_pretty on our derived types cannot fail; map it anyway
    let text = serde_json::to_string_pretty(engine).map_err(|source| StateError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|source| StateError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StateError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("saved engine state to {}", path.display());
    Ok(())
}

/// Creates a fresh state file. Refuses to clobber an existing one unless
/// `force` is set.
pub fn create(path: &Path, engine: &Engine, force: bool) -> Result<(), StateError> {
    if path.exists() && !force {
        return Err(StateError::Exists {
            path: path.to_path_buf(),
        });
    }
    save(path, engine)
}
