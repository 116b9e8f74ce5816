#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/bokslut/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod attestation;
pub mod cache;
pub mod concepts;
pub mod context;
pub mod document;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod persons;
pub mod ratios;
pub mod resolve;
pub mod service;
pub mod source;
pub mod taxonomy;
pub mod validate;

pub use attestation::{AdoptionCertificate, AuditReport};
pub use cache::{CacheStats, SqliteResultCache};
pub use concepts::{Concept, ConceptRegistry};
pub use context::{ScopeCandidates, ScopeKind, classify_scope_id};
pub use error::{IxbrlError, Result};
pub use extract::{Extractor, ExtractorConfig};
pub use model::{
    AnnualReportRecord, FactProvenance, FilingMeta, FinancialFacts, FiscalPeriod, ParseWarning,
    Person, TrendPoint, TrendSeries, WarningKind,
};
pub use normalize::{NumberFormat, Precision};
pub use persons::{PersonCategory, PersonGroups};
pub use ratios::Ratios;
pub use resolve::Strategy;
pub use service::{ReportService, ServiceHistory};
pub use source::{
    DirectoryStore, DocumentFetcher, DocumentLister, EntityId, FilingDescriptor, ResultCache,
};
pub use taxonomy::{DetectedTaxonomy, TaxonomyFamily};
pub use validate::{ConsistencyValidator, ValidatorConfig};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
