//! Extracted record types.

use crate::attestation::{AdoptionCertificate, AuditReport};
use crate::concepts::Concept;
use crate::normalize::Precision;
use crate::persons::PersonGroups;
use crate::ratios::Ratios;
use crate::resolve::Strategy;
use crate::taxonomy::DetectedTaxonomy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base facts of one period plus the ratios derived from them.
///
/// Amounts are whole currency units after scaling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialFacts {
    /// Net revenue
    pub revenue: Option<i64>,
    /// Result after financial items
    pub profit_after_financial_items: Option<i64>,
    /// Net result for the year
    pub net_result: Option<i64>,
    /// Total equity
    pub equity: Option<i64>,
    /// Total assets
    pub total_assets: Option<i64>,
    /// Average number of employees
    pub average_employees: Option<i64>,

    /// Equity / total assets, percent
    pub solvency: Option<f64>,
    /// Net result / revenue, percent
    pub profit_margin: Option<f64>,
    /// Net result / equity, percent
    pub return_on_equity: Option<f64>,
}

impl FinancialFacts {
    /// Value of a base concept.
    pub const fn get(&self, concept: Concept) -> Option<i64> {
        match concept {
            Concept::Revenue => self.revenue,
            Concept::ProfitAfterFinancialItems => self.profit_after_financial_items,
            Concept::NetResult => self.net_result,
            Concept::Equity => self.equity,
            Concept::TotalAssets => self.total_assets,
            Concept::AverageEmployees => self.average_employees,
        }
    }

    /// Set a base concept.
    pub const fn set(&mut self, concept: Concept, value: Option<i64>) {
        match concept {
            Concept::Revenue => self.revenue = value,
            Concept::ProfitAfterFinancialItems => self.profit_after_financial_items = value,
            Concept::NetResult => self.net_result = value,
            Concept::Equity => self.equity = value,
            Concept::TotalAssets => self.total_assets = value,
            Concept::AverageEmployees => self.average_employees = value,
        }
    }

    /// Number of populated base facts.
    pub fn populated(&self) -> usize {
        Concept::ALL
            .iter()
            .filter(|c| self.get(**c).is_some())
            .count()
    }

    /// No base fact could be read.
    pub fn is_insufficient(&self) -> bool {
        self.populated() == 0
    }

    /// Ratios recomputed from the base facts.
    pub fn ratios(&self) -> Ratios {
        Ratios::from_facts(self)
    }

    /// Fill the derived ratio fields from the base facts.
    pub fn with_ratios(mut self) -> Self {
        let ratios = self.ratios();
        self.solvency = ratios.solvency;
        self.profit_margin = ratios.profit_margin;
        self.return_on_equity = ratios.return_on_equity;
        self
    }
}

/// A named person from the signature sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Role label as written, or a default for the tag pattern
    pub role: String,
}

impl Person {
    /// Create a person record.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: role.into(),
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Case-insensitive identity used for deduplication.
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase(),
            self.role.to_lowercase(),
        )
    }
}

/// Category of a [`ParseWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A fact could not be found
    MissingData,
    /// Facts disagree with each other or with the caller
    InconsistentData,
    /// A fact was found but could not be read
    ParseError,
    /// Taxonomy version is archived or unknown
    TaxonomyMismatch,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingData => "MissingData",
            Self::InconsistentData => "InconsistentData",
            Self::ParseError => "ParseError",
            Self::TaxonomyMismatch => "TaxonomyMismatch",
        };
        f.write_str(name)
    }
}

/// Non-fatal extraction problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Category
    pub kind: WarningKind,
    /// Field or element the warning is about
    pub field: String,
    /// Description
    pub message: String,
    /// Offending value, if any
    pub value: Option<String>,
}

impl ParseWarning {
    /// Create a warning without an offending value.
    pub fn new(kind: WarningKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.field, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " ({value})")?;
        }
        Ok(())
    }
}

/// Fiscal year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl FiscalPeriod {
    /// Create a period.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

/// Facts the caller already knows about a filing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingMeta {
    /// Filing or document identifier
    pub document_id: Option<String>,
    /// Registered fiscal period
    pub period: Option<FiscalPeriod>,
    /// Date the filing was registered
    pub filing_date: Option<NaiveDate>,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactProvenance {
    /// Concept resolved
    pub concept: Concept,
    /// Qualified tag name matched
    pub tag: String,
    /// Context the fact was filed under
    pub scope: Option<String>,
    /// Strategy that matched
    pub strategy: Strategy,
    /// The fact was bound without regard to its context
    pub fallback_scope: bool,
    /// Displayed text before normalization
    pub raw_text: String,
    /// Declared precision attributes
    pub precision: Precision,
}

/// One labelled period of facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Period label, e.g. the fiscal-year end date
    pub label: String,
    /// Facts for the period
    pub facts: FinancialFacts,
}

/// Periods ordered most recent first.
///
/// Order is whatever the caller supplies; nothing here sorts or deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Points, index 0 most recent
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Empty series.
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append an older period.
    pub fn push(&mut self, label: impl Into<String>, facts: FinancialFacts) {
        self.points.push(TrendPoint {
            label: label.into(),
            facts,
        });
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no periods.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent period.
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.first()
    }

    /// Period before the most recent one.
    pub fn previous(&self) -> Option<&TrendPoint> {
        self.points.get(1)
    }

    /// Period labels in series order.
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }
}

impl FromIterator<TrendPoint> for TrendSeries {
    fn from_iter<I: IntoIterator<Item = TrendPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Everything extracted from one annual report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReportRecord {
    /// Filing or document identifier
    pub document_id: Option<String>,
    /// Organisation number as tagged
    pub entity_id: Option<String>,
    /// Company name as tagged
    pub entity_name: Option<String>,
    /// Fiscal period
    pub period: Option<FiscalPeriod>,
    /// Filing or signing date
    pub filing_date: Option<NaiveDate>,
    /// Current-period facts and ratios
    pub facts: FinancialFacts,
    /// Registered share capital at the balance-sheet date
    #[serde(default)]
    pub share_capital: Option<i64>,
    /// Deduplicated persons
    pub persons: Vec<Person>,
    /// Persons grouped by role
    pub person_groups: PersonGroups,
    /// Auditor's report, when tagged
    #[serde(default)]
    pub audit_report: Option<AuditReport>,
    /// Adoption certificate, when tagged
    #[serde(default)]
    pub adoption_certificate: Option<AdoptionCertificate>,
    /// Current and earlier periods tagged in the multi-year overview
    pub overview: TrendSeries,
    /// Taxonomy versions referenced
    pub taxonomies: Vec<DetectedTaxonomy>,
    /// Group (consolidated) report
    pub consolidated: bool,
    /// Source of each resolved base fact
    pub provenance: Vec<FactProvenance>,
    /// Non-fatal problems, in detection order
    pub warnings: Vec<ParseWarning>,
}

impl AnnualReportRecord {
    /// No base fact could be read.
    pub fn is_insufficient(&self) -> bool {
        self.facts.is_insufficient()
    }

    /// Facts bound through the context-ignoring fallback.
    pub fn fallback_bindings(&self) -> impl Iterator<Item = &FactProvenance> + '_ {
        self.provenance.iter().filter(|p| p.fallback_scope)
    }

    /// Facts of the period before this one, from the in-document overview.
    pub fn previous_facts(&self) -> Option<&FinancialFacts> {
        self.overview.previous().map(|p| &p.facts)
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ParseWarning> + '_ {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
