//! # Station Error Type
//!
//! Unified error type for the `stockroom` binary.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stockroom-core      ValidationError ──┐                                │
//! │  stockroom-db        DbError ──────────┼──► StationError ──► exit code  │
//! │  stockroom-scan      ScanError ────────┤        │                       │
//! │  config / stdin      io, toml ─────────┘        ▼                       │
//! │                                          "error: <message>" on stderr   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside the scan console most errors are printed and the console keeps
//! running; only I/O failures on the terminal end it.

use std::path::PathBuf;

use stockroom_core::ValidationError;
use stockroom_db::DbError;
use stockroom_scan::ScanError;
use thiserror::Error;

/// Errors surfaced by station commands.
#[derive(Debug, Error)]
pub enum StationError {
    /// Config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `StationConfig`.
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No database path given and no platform data directory found.
    #[error("No database path available; pass --db or set STOCKROOM_DB_PATH")]
    NoDatabasePath,

    /// User input rejected by validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Catalog storage failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Scan workflow failure.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Terminal I/O failure.
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StationError {
    /// Process exit code for this error.
    ///
    /// - `2`: bad input or configuration
    /// - `1`: everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            StationError::ConfigParse(_)
            | StationError::InvalidConfig(_)
            | StationError::NoDatabasePath
            | StationError::Validation(_) => 2,
            _ => 1,
        }
    }
}

/// Convenience type alias for station results.
pub type StationResult<T> = Result<T, StationError>;
