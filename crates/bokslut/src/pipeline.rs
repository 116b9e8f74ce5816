//! Entry points combining extraction and analysis.

use crate::error::Result;
use bokslut_analysis::{
    EntityStatus, RedFlagAnalyzer, RedFlagConfig, RiskIndicator, TrendConfig, TrendEngine,
    TrendResult,
};
use bokslut_ixbrl::{
    AnnualReportRecord, Extractor, ExtractorConfig, FilingMeta, FinancialFacts, ParseWarning,
    Ratios, TrendSeries,
};
use log::info;
use serde::Serialize;

/// Extract a record from document text with the default configuration.
///
/// The warnings are also kept on the record.
pub fn extract(text: &str) -> Result<(AnnualReportRecord, Vec<ParseWarning>)> {
    let record = Extractor::new().extract(text)?;
    let warnings = record.warnings.clone();
    Ok((record, warnings))
}

/// Ratios derived from base facts.
pub fn ratios(facts: &FinancialFacts) -> Ratios {
    Ratios::from_facts(facts)
}

/// Red flags with default thresholds and no previous-year comparison.
pub fn red_flags(facts: &FinancialFacts, status: &EntityStatus) -> Vec<RiskIndicator> {
    RedFlagAnalyzer::default().analyze(facts, None, status)
}

/// Trend over a most-recent-first series with default guardrails.
pub fn trend(series: &TrendSeries) -> TrendResult {
    TrendEngine::default().analyze(series)
}

/// Everything derived from one document.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Extracted record
    pub record: AnnualReportRecord,
    /// Ratios of the current period
    pub ratios: Ratios,
    /// Risk indicators, critical first
    pub red_flags: Vec<RiskIndicator>,
    /// Trend over the in-document multi-year overview
    pub trend: TrendResult,
}

/// Configured extractor and analyzers.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    extractor: Extractor,
    red_flags: RedFlagAnalyzer,
    trend: TrendEngine,
}

impl Analyzer {
    /// Build from configurations, rejecting invalid thresholds.
    pub fn new(
        extractor: ExtractorConfig,
        red_flags: RedFlagConfig,
        trend: TrendConfig,
    ) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::with_config(extractor),
            red_flags: RedFlagAnalyzer::new(red_flags)?,
            trend: TrendEngine::new(trend)?,
        })
    }

    /// The extractor.
    pub const fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// The red-flag analyzer.
    pub const fn red_flag_analyzer(&self) -> &RedFlagAnalyzer {
        &self.red_flags
    }

    /// The trend engine.
    pub const fn trend_engine(&self) -> &TrendEngine {
        &self.trend
    }

    /// Extract a document and analyze it on its own.
    ///
    /// The in-document overview feeds the revenue-decline and repeated-loss
    /// rules.
    pub fn analyze(
        &self,
        text: &str,
        meta: &FilingMeta,
        status: &EntityStatus,
    ) -> Result<Analysis> {
        let record = self.extractor.extract_with_meta(text, meta)?;
        Ok(self.analyze_record(record, status))
    }

    /// Analyze an already extracted record.
    pub fn analyze_record(&self, record: AnnualReportRecord, status: &EntityStatus) -> Analysis {
        let red_flags = self.red_flags.analyze_record(&record, status);
        let trend = self.trend.analyze(&record.overview);
        info!(
            "{}: {} red flags, {} trend periods",
            record.document_id.as_deref().unwrap_or("document"),
            red_flags.len(),
            trend.periods.len()
        );
        Analysis {
            ratios: record.facts.ratios(),
            record,
            red_flags,
            trend,
        }
    }
}
