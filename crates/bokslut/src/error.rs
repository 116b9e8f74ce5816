//! Error types for the combined pipeline.

use bokslut_analysis::AnalysisError;
use bokslut_ixbrl::IxbrlError;
use thiserror::Error;

/// Result type for the combined pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from extraction or analyzer setup.
#[derive(Debug, Error)]
pub enum Error {
    /// Extraction or filing access failed
    #[error(transparent)]
    Ixbrl(#[from] IxbrlError),

    /// Analyzer configuration was rejected
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
