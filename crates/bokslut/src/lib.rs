#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bokslut/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pipeline;

// Re-export sub-crates
pub use bokslut_analysis as analysis;
pub use bokslut_ixbrl as ixbrl;

// Re-export common types
pub use bokslut_analysis::{
    EntityStatus, RedFlagConfig, RiskCategory, RiskIndicator, Severity, StatusEvent, TrendConfig,
    TrendMetric, TrendResult,
};
pub use bokslut_ixbrl::{
    AdoptionCertificate, AnnualReportRecord, AuditReport, Extractor, ExtractorConfig, FilingMeta,
    FinancialFacts, ParseWarning, Person, Ratios, TrendSeries, WarningKind,
};
pub use error::{Error, Result};
pub use pipeline::{Analysis, Analyzer, extract, ratios, red_flags, trend};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
