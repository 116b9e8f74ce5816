//! Error types for extraction and filing access.

use thiserror::Error;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, IxbrlError>;

/// Errors that can occur while loading or storing annual reports.
///
/// Problems with individual facts are never errors; they are reported as
/// [`ParseWarning`](crate::ParseWarning)s on the extracted record.
#[derive(Debug, Error)]
pub enum IxbrlError {
    /// The document could not be read as markup at all
    #[error("Markup error at byte {position}: {message}")]
    Markup {
        /// Byte offset where the reader gave up
        position: u64,
        /// Reader diagnostic
        message: String,
    },

    /// The document contained no elements
    #[error("Document contains no markup elements")]
    EmptyDocument,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed organisation number
    #[error("Invalid organisation number: {0}")]
    InvalidEntityId(String),

    /// No filing available for the request
    #[error("Filing not found: {0}")]
    FilingNotFound(String),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),
}
