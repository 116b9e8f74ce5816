#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bokslut/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod red_flags;
pub mod trend;

pub use error::{AnalysisError, Result};
pub use red_flags::{
    EntityStatus, RedFlagAnalyzer, RedFlagConfig, RiskCategory, RiskIndicator, Severity,
    StatusEvent,
};
pub use trend::{MetricTrend, TrendConfig, TrendEngine, TrendMetric, TrendResult};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
