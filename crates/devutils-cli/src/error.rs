//! Error types for the command line.

use devutils_runtime::{HostError, SessionError};
use thiserror::Error;

/// Errors surfaced by `devutils` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    /// No usable C/C++ compiler on `PATH`.
    #[error("compiler not found: {0}")]
    CompilerNotFound(String),

    /// An argument or input file was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A build session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The local host failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CliError>;
