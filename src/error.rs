//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure to take a wake hold
#[derive(Error, Debug)]
pub enum WakeError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("wake lock unavailable: {0}")]
    Unavailable(String),
}

/// Failure to load or store duration preferences
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write preferences at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid preferences file: {0}")]
    Json(#[from] serde_json::Error),
}
