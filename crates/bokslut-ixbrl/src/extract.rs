//! Annual-report extraction.
//!
//! [`Extractor`] runs the whole pipeline over one document: markup loading,
//! context classification, concept resolution, validation, ratios, persons,
//! the signed statements, metadata and the multi-year overview. It holds configuration only, so one
//! extractor can serve any number of documents from any number of threads.

use crate::attestation::{AdoptionCertificate, AuditReport, read_date};
use crate::concepts::{Concept, ConceptRegistry, is_consolidated_concept};
use crate::context::{ScopeCandidates, ScopeKind};
use crate::document::{Document, local_part};
use crate::error::Result;
use crate::model::{
    AnnualReportRecord, FilingMeta, FinancialFacts, FiscalPeriod, ParseWarning, TrendSeries,
    WarningKind,
};
use crate::persons::{PersonGroups, extract_persons};
use crate::resolve::{FactIndex, ResolutionPlan, resolve_concept};
use crate::taxonomy::{TaxonomyFamily, detect_taxonomies};
use crate::validate::{ConsistencyValidator, ValidatorConfig};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ENTITY_NAME_TAGS: &[&str] = &["ForetagetsNamn"];
const ENTITY_ID_TAGS: &[&str] = &["Organisationsnummer"];
const PERIOD_START_TAGS: &[&str] = &["RakenskapsarForstaDag"];
const PERIOD_END_TAGS: &[&str] = &["RakenskapsarSistaDag"];
const SIGNING_DATE_TAGS: &[&str] = &["UndertecknandeDatum", "UndertecknandeArsredovisningDatum"];
const SHARE_CAPITAL_TAGS: &[&str] = &["Aktiekapital"];

/// Configuration for [`Extractor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Duration contexts tried after the classified ones (default: `period0`, `current`)
    pub duration_fallbacks: Vec<String>,
    /// Instant contexts tried after the classified ones (default: `balans0`, `balance0`)
    pub instant_fallbacks: Vec<String>,
    /// Bind a concept regardless of context when nothing else matches (default: true)
    pub allow_global_fallback: bool,
    /// Periods read from the multi-year overview, current included (default: 4)
    pub overview_periods: usize,
    /// Additional tag names per concept, tried after the built-in ones
    pub extra_aliases: BTreeMap<Concept, Vec<String>>,
    /// Plausibility checks
    pub validator: ValidatorConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            duration_fallbacks: vec!["period0".to_string(), "current".to_string()],
            instant_fallbacks: vec!["balans0".to_string(), "balance0".to_string()],
            allow_global_fallback: true,
            overview_periods: 4,
            extra_aliases: BTreeMap::new(),
            validator: ValidatorConfig::default(),
        }
    }
}

/// Extracts [`AnnualReportRecord`]s from inline-XBRL documents.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractorConfig,
    registry: ConceptRegistry,
    validator: ConsistencyValidator,
}

impl Extractor {
    /// Extractor with default configuration.
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Extractor with custom configuration.
    pub fn with_config(config: ExtractorConfig) -> Self {
        let mut registry = ConceptRegistry::new();
        for (concept, aliases) in &config.extra_aliases {
            for alias in aliases {
                registry.add_alias(*concept, alias.clone());
            }
        }
        let validator = ConsistencyValidator::new(config.validator.clone());
        Self {
            config,
            registry,
            validator,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a record from document text.
    pub fn extract(&self, text: &str) -> Result<AnnualReportRecord> {
        self.extract_with_meta(text, &FilingMeta::default())
    }

    /// Extract a record, preferring caller-known filing facts over tagged ones.
    ///
    /// Fails only when the text is not markup at all; everything else ends
    /// up in the record's warnings.
    pub fn extract_with_meta(&self, text: &str, meta: &FilingMeta) -> Result<AnnualReportRecord> {
        let doc = Document::parse(text)?;
        let mut warnings: Vec<ParseWarning> = Vec::new();

        let taxonomies = detect_taxonomies(text);
        for taxonomy in &taxonomies {
            if let Some(warning) = taxonomy.warning() {
                warn!("{}", warning.message);
                warnings.push(warning);
            }
        }

        let scopes = ScopeCandidates::from_document(&doc);
        let numeric = FactIndex::numeric(&doc);
        let textual = FactIndex::textual(&doc);
        let plan = ResolutionPlan::standard(self.config.allow_global_fallback);

        let mut facts = FinancialFacts::default();
        let mut provenance = Vec::new();
        for concept in Concept::ALL {
            let candidates = self.scope_list(&scopes, concept);
            let resolution = resolve_concept(
                &plan,
                &numeric,
                concept,
                self.registry.aliases(concept),
                &candidates,
            );
            facts.set(concept, resolution.value);
            provenance.extend(resolution.provenance);
            warnings.extend(resolution.warning);
        }
        warnings.extend(self.validator.validate(&facts));
        let facts = facts.with_ratios();

        let share_capital = self.share_capital(&numeric);
        let metadata = Metadata::read(&textual, &mut warnings);
        let period = reconcile_period(meta, &metadata, &scopes, &mut warnings);

        let persons = extract_persons(&doc);
        let person_groups = PersonGroups::from_persons(&persons);
        let audit_report = AuditReport::read(&doc, &textual, &mut warnings);
        let adoption_certificate = AdoptionCertificate::read(&doc, &textual, &mut warnings);

        let current_label = period
            .map(|p| p.end.to_string())
            .unwrap_or_else(|| "period0".to_string());
        let overview = self.overview(&numeric, &scopes, &facts, current_label);

        let consolidated = taxonomies.iter().any(|t| t.family == TaxonomyFamily::K3K)
            || numeric
                .all()
                .any(|f| is_consolidated_concept(local_part(f.name())) && f.is_usable());

        let document_id = meta.document_id.clone().or_else(|| {
            let entity = metadata.entity_id.as_deref()?;
            let digits: String = entity.chars().filter(char::is_ascii_digit).collect();
            Some(format!("{digits}-{}", period?.end.format("%Y%m%d")))
        });

        info!(
            "extracted {} of {} base facts, {} persons, {} warnings",
            facts.populated(),
            Concept::ALL.len(),
            persons.len(),
            warnings.len()
        );

        Ok(AnnualReportRecord {
            document_id,
            entity_id: metadata.entity_id,
            entity_name: metadata.entity_name,
            period,
            filing_date: meta.filing_date.or(metadata.signing_date),
            facts,
            share_capital,
            persons,
            person_groups,
            audit_report,
            adoption_certificate,
            overview,
            taxonomies,
            consolidated,
            provenance,
            warnings,
        })
    }

    /// Classified candidates for the concept's period kind, then the
    /// configured fallbacks.
    fn scope_list(&self, scopes: &ScopeCandidates, concept: Concept) -> Vec<String> {
        let kind = concept.scope_kind();
        let fallbacks = match kind {
            ScopeKind::Instant => &self.config.instant_fallbacks,
            ScopeKind::Duration | ScopeKind::Ambiguous => &self.config.duration_fallbacks,
        };
        let mut list = scopes.for_kind(kind).to_vec();
        for fallback in fallbacks {
            if !list.contains(fallback) {
                list.push(fallback.clone());
            }
        }
        list
    }

    /// Registered share capital, read from the configured current
    /// balance-sheet contexts only.
    fn share_capital(&self, index: &FactIndex<'_>) -> Option<i64> {
        let tags: Vec<String> = SHARE_CAPITAL_TAGS.iter().map(ToString::to_string).collect();
        ResolutionPlan::exact()
            .find(index, &tags, &self.config.instant_fallbacks)
            .and_then(|(_, fact)| fact.value())
    }

    /// Current facts followed by earlier periods from the overview table.
    ///
    /// Earlier periods use exact `period{k}` / `balans{k}` contexts only.
    /// A period with no facts is left out and later ones are still read.
    fn overview(
        &self,
        index: &FactIndex<'_>,
        scopes: &ScopeCandidates,
        current: &FinancialFacts,
        current_label: String,
    ) -> TrendSeries {
        let mut series = TrendSeries::new();
        series.push(current_label, current.clone());

        let plan = ResolutionPlan::exact();
        for k in 1..self.config.overview_periods {
            let duration = vec![format!("period{k}")];
            let instant = vec![format!("balans{k}")];
            let mut facts = FinancialFacts::default();
            for concept in Concept::ALL {
                let candidates = match concept.scope_kind() {
                    ScopeKind::Instant => &instant,
                    ScopeKind::Duration | ScopeKind::Ambiguous => &duration,
                };
                if let Some((_, fact)) =
                    plan.find(index, self.registry.aliases(concept), candidates)
                {
                    facts.set(concept, fact.value());
                }
            }
            if facts.is_insufficient() {
                debug!("overview period {k} has no facts");
                continue;
            }
            let label = [&duration[0], &instant[0]]
                .iter()
                .find_map(|id| scopes.definition(id).and_then(|d| d.end))
                .map_or_else(|| duration[0].clone(), |end| end.to_string());
            series.push(label, facts.with_ratios());
        }
        series
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Document-level text facts.
#[derive(Debug, Default)]
struct Metadata {
    entity_name: Option<String>,
    entity_id: Option<String>,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
    signing_date: Option<NaiveDate>,
}

impl Metadata {
    fn read(index: &FactIndex<'_>, warnings: &mut Vec<ParseWarning>) -> Self {
        let period_start = read_date(index, PERIOD_START_TAGS, "period_start", warnings);
        let period_end = read_date(index, PERIOD_END_TAGS, "period_end", warnings);
        let signing_date = read_date(index, SIGNING_DATE_TAGS, "signing_date", warnings);

        Self {
            entity_name: index.first_text(ENTITY_NAME_TAGS),
            entity_id: index.first_text(ENTITY_ID_TAGS),
            period_start,
            period_end,
            signing_date,
        }
    }
}

/// Pick the fiscal period: caller first, then tagged dates, then the
/// current duration context. Warns when the caller disagrees with the tags.
fn reconcile_period(
    meta: &FilingMeta,
    metadata: &Metadata,
    scopes: &ScopeCandidates,
    warnings: &mut Vec<ParseWarning>,
) -> Option<FiscalPeriod> {
    let tagged = match (metadata.period_start, metadata.period_end) {
        (Some(start), Some(end)) => Some(FiscalPeriod::new(start, end)),
        _ => scopes.duration.iter().find_map(|id| {
            let definition = scopes.definition(id)?;
            Some(FiscalPeriod::new(definition.start?, definition.end?))
        }),
    };

    match (meta.period, tagged) {
        (Some(known), Some(tagged)) if known != tagged => {
            warnings.push(
                ParseWarning::new(
                    WarningKind::InconsistentData,
                    "period",
                    format!("filing period {known} differs from tagged period"),
                )
                .with_value(tagged.to_string()),
            );
            Some(known)
        }
        (Some(known), _) => Some(known),
        (None, tagged) => tagged,
    }
}
