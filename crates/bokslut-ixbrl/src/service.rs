//! Annual-report retrieval for an entity.
//!
//! [`ReportService`] ties a [`DocumentLister`], a [`DocumentFetcher`], an
//! optional [`ResultCache`] and an [`Extractor`] together. Extraction stays
//! pure; everything that touches storage lives here.

use crate::error::{IxbrlError, Result};
use crate::extract::Extractor;
use crate::model::{AnnualReportRecord, FilingMeta, ParseWarning, TrendSeries, WarningKind};
use crate::source::{DocumentFetcher, DocumentLister, EntityId, FilingDescriptor, ResultCache};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

/// Records for several filings of one entity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceHistory {
    /// Records in listing order, most recent first
    pub records: Vec<AnnualReportRecord>,
    /// Current-period facts of each record, labelled by period end
    pub series: TrendSeries,
    /// Filings that could not be loaded, and other cross-filing problems
    pub warnings: Vec<ParseWarning>,
}

/// Lists, fetches, caches and extracts the filings of an entity.
pub struct ReportService<L, F> {
    lister: L,
    fetcher: F,
    cache: Option<Box<dyn ResultCache>>,
    extractor: Extractor,
}

impl<L, F> fmt::Debug for ReportService<L, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportService")
            .field("extractor", &self.extractor)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl<L: DocumentLister, F: DocumentFetcher> ReportService<L, F> {
    /// Service without cache, using the default extractor.
    pub fn new(lister: L, fetcher: F) -> Self {
        Self {
            lister,
            fetcher,
            cache: None,
            extractor: Extractor::new(),
        }
    }

    /// Attach a result cache.
    pub fn with_cache(mut self, cache: impl ResultCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    /// Replace the extractor.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Record for the most recent filing.
    pub fn latest(&self, entity: &EntityId) -> Result<AnnualReportRecord> {
        let filings = self.lister.list_filings(entity)?;
        let filing = filings
            .first()
            .ok_or_else(|| IxbrlError::FilingNotFound(entity.to_string()))?;
        self.load(entity, filing)
    }

    /// Records for up to `max_years` of the most recent filings.
    ///
    /// A filing that cannot be fetched or parsed becomes a ParseError
    /// warning; the others are still returned.
    pub fn history(&self, entity: &EntityId, max_years: usize) -> Result<ServiceHistory> {
        let filings = self.lister.list_filings(entity)?;
        if filings.is_empty() {
            return Err(IxbrlError::FilingNotFound(entity.to_string()));
        }

        let mut history = ServiceHistory::default();
        for filing in filings.iter().take(max_years) {
            match self.load(entity, filing) {
                Ok(record) => {
                    if let Some(warning) = entity_mismatch(entity, &record) {
                        history.warnings.push(warning);
                    }
                    let label = record
                        .period
                        .map_or_else(|| filing.filing_id.clone(), |p| p.end.to_string());
                    history.series.push(label, record.facts.clone());
                    history.records.push(record);
                }
                Err(err) => {
                    warn!("skipping filing {}: {err}", filing.filing_id);
                    history.warnings.push(
                        ParseWarning::new(
                            WarningKind::ParseError,
                            "filing",
                            format!("filing could not be loaded: {err}"),
                        )
                        .with_value(filing.filing_id.clone()),
                    );
                }
            }
        }

        info!(
            "loaded {} of {} filings for {entity}",
            history.records.len(),
            filings.len().min(max_years)
        );
        Ok(history)
    }

    fn load(&self, entity: &EntityId, filing: &FilingDescriptor) -> Result<AnnualReportRecord> {
        if let Some(cache) = &self.cache {
            match cache.get(entity, &filing.filing_id) {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => debug!("cache miss for {entity} {}", filing.filing_id),
                Err(err) => warn!("cache lookup failed for {}: {err}", filing.filing_id),
            }
        }

        let text = self.fetcher.fetch_document(&filing.filing_id)?;
        let meta = FilingMeta {
            document_id: Some(filing.filing_id.clone()),
            period: filing.period,
            filing_date: filing.filing_date,
        };
        let record = self.extractor.extract_with_meta(&text, &meta)?;

        if let Some(cache) = &self.cache
            && let Err(err) = cache.put(entity, &filing.filing_id, &record)
        {
            warn!("could not cache {}: {err}", filing.filing_id);
        }
        Ok(record)
    }
}

/// Warn when the organisation number tagged in a filing is not the one asked for.
fn entity_mismatch(entity: &EntityId, record: &AnnualReportRecord) -> Option<ParseWarning> {
    let tagged = record.entity_id.as_deref()?;
    match EntityId::parse(tagged) {
        Ok(id) if id == *entity => None,
        _ => Some(
            ParseWarning::new(
                WarningKind::InconsistentData,
                "entity_id",
                format!("filing is tagged with a different organisation number than {entity}"),
            )
            .with_value(tagged.to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        filings: Vec<FilingDescriptor>,
        documents: HashMap<String, String>,
        fetches: RefCell<usize>,
    }

    impl MemoryStore {
        fn with(mut self, id: &str, text: &str) -> Self {
            self.filings.push(FilingDescriptor {
                filing_id: id.to_string(),
                period: None,
                filing_date: None,
            });
            self.documents.insert(id.to_string(), text.to_string());
            self
        }
    }

    impl DocumentLister for &MemoryStore {
        fn list_filings(&self, _entity: &EntityId) -> Result<Vec<FilingDescriptor>> {
            Ok(self.filings.clone())
        }
    }

    impl DocumentFetcher for &MemoryStore {
        fn fetch_document(&self, filing_id: &str) -> Result<String> {
            *self.fetches.borrow_mut() += 1;
            self.documents
                .get(filing_id)
                .cloned()
                .ok_or_else(|| IxbrlError::FilingNotFound(filing_id.to_string()))
        }
    }

    fn revenue_doc(revenue: i64) -> String {
        format!(
            r#"<p><ix:nonNumeric name="se-cd-base:Organisationsnummer" contextRef="period0">556016-0680</ix:nonNumeric>
            <ix:nonFraction name="se-gen-base:Nettoomsattning" contextRef="period0">{revenue}</ix:nonFraction></p>"#
        )
    }

    fn entity() -> EntityId {
        EntityId::parse("5560160680").unwrap()
    }

    #[test]
    fn test_latest_uses_first_listed_filing() {
        let store = MemoryStore::default()
            .with("2023", &revenue_doc(300))
            .with("2022", &revenue_doc(200));
        let service = ReportService::new(&store, &store);
        let record = service.latest(&entity()).unwrap();
        assert_eq!(record.facts.revenue, Some(300));
        assert_eq!(record.document_id.as_deref(), Some("2023"));
    }

    #[test]
    fn test_empty_listing_is_not_found() {
        let store = MemoryStore::default();
        let service = ReportService::new(&store, &store);
        assert!(matches!(
            service.latest(&entity()),
            Err(IxbrlError::FilingNotFound(_))
        ));
        assert!(matches!(
            service.history(&entity(), 3),
            Err(IxbrlError::FilingNotFound(_))
        ));
    }

    #[test]
    fn test_history_keeps_going_after_failures() {
        let mut store = MemoryStore::default()
            .with("2023", &revenue_doc(300))
            .with("2022", "<!-- broken")
            .with("2021", &revenue_doc(100))
            .with("2020", &revenue_doc(50));
        store.filings.insert(
            1,
            FilingDescriptor {
                filing_id: "missing".to_string(),
                period: None,
                filing_date: None,
            },
        );
        let service = ReportService::new(&store, &store);
        let history = service.history(&entity(), 4).unwrap();

        assert_eq!(history.records.len(), 2);
        assert_eq!(history.series.labels(), vec!["2023", "2021"]);
        assert_eq!(history.warnings.len(), 2);
        assert!(
            history
                .warnings
                .iter()
                .all(|w| w.kind == WarningKind::ParseError)
        );
        assert_eq!(history.warnings[0].value.as_deref(), Some("missing"));
    }

    #[test]
    fn test_history_flags_foreign_entity() {
        let foreign = revenue_doc(1).replace("556016-0680", "556677-8899");
        let store = MemoryStore::default().with("2023", &foreign);
        let service = ReportService::new(&store, &store);
        let history = service.history(&entity(), 1).unwrap();
        assert_eq!(history.warnings[0].kind, WarningKind::InconsistentData);
        assert_eq!(history.warnings[0].field, "entity_id");
    }

    #[test]
    fn test_cache_short_circuits_fetch() {
        let store = MemoryStore::default().with("2023", &revenue_doc(300));
        let cache = crate::cache::SqliteResultCache::in_memory().unwrap();
        let service = ReportService::new(&store, &store).with_cache(cache);

        service.latest(&entity()).unwrap();
        let again = service.latest(&entity()).unwrap();
        assert_eq!(again.facts.revenue, Some(300));
        assert_eq!(*store.fetches.borrow(), 1);
    }
}
