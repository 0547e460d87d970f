//! # Warband Tools
//!
//! Command-line tools for campaign organisers and players:
//! - Roster validation and points reports
//! - Campaign standings and resource pools
//! - Game state tracking against a JSON file

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod file_store;
pub mod report;

use std::path::Path;

use thiserror::Error;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read or written.
    #[error("I/O error on '{path}': {message}")]
    Io {
        /// Offending path.
        path: String,
        /// OS error message.
        message: String,
    },

    /// The rules configuration could not be parsed.
    #[error("Failed to parse rules file '{path}': {message}")]
    Config {
        /// Offending path.
        path: String,
        /// Parser error message.
        message: String,
    },

    /// The game state file is not a JSON object of strings.
    #[error("Failed to parse state file '{path}': {message}")]
    Store {
        /// Offending path.
        path: String,
        /// Parser error message.
        message: String,
    },

    /// The engine refused or could not find something.
    #[error(transparent)]
    Engine(#[from] warband_core::error::TrackerError),

    /// Validation found problems.
    #[error("{0} roster issue(s) found")]
    Invalid(usize),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Read a whole file to a string.
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ToolError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
