//! Errors surfaced by the command-line tool.

use std::path::PathBuf;
use thiserror::Error;

/// Command failure, printed as a single line before exiting with status 1.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Extraction or analysis failed
    #[error(transparent)]
    Bokslut(#[from] bokslut::Error),

    /// Filing access or cache failed
    #[error(transparent)]
    Ixbrl(#[from] bokslut::ixbrl::IxbrlError),

    /// A file could not be read or created
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Invalid JSON in a settings file or status argument
    #[error("invalid {what}: {source}")]
    Json {
        /// What was being parsed
        what: &'static str,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Result could not be written
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    /// A worker task panicked or was cancelled
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// None of the given documents could be read
    #[error("no document could be extracted")]
    NothingExtracted,
}

/// Result type for commands.
pub(crate) type Result<T> = std::result::Result<T, CliError>;
