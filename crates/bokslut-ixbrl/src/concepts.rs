//! Canonical financial concepts and their tag aliases.

use crate::context::ScopeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tag-namespace prefixes in lookup priority order.
///
/// Facts tagged under an unlisted prefix are still considered, after these.
pub const NAMESPACE_PREFIXES: &[&str] = &[
    "se-gen-base",
    "se-comp-base",
    "se-cd-base",
    "se-gaap-ext",
    "se-k2-type",
    "se-mem-base",
];

/// Tag names used only by consolidated (group) reports.
pub const CONSOLIDATED_CONCEPTS: &[&str] = &[
    "KoncernensNettoomsattning",
    "NettoomsattningKoncern",
    "KoncernensRorelseresultat",
    "RorelseresultatKoncern",
    "KoncernensResultatEfterFinansiellaPoster",
    "KoncernensAretsResultat",
    "AretsResultatKoncern",
    "KoncernmassigGoodwill",
    "KoncernensEgetKapital",
    "EgetKapitalKoncern",
    "MinoritetsandelEgetKapital",
    "Minoritetsintresse",
    "KoncernensSummaTillgangar",
    "TillgangarKoncern",
];

/// The six base facts read from every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    /// Net revenue (nettoomsättning)
    Revenue,
    /// Result after financial items (pre-tax)
    ProfitAfterFinancialItems,
    /// Net result for the year (årets resultat)
    NetResult,
    /// Total equity
    Equity,
    /// Total assets (balansomslutning)
    TotalAssets,
    /// Average number of employees
    AverageEmployees,
}

impl Concept {
    /// All base concepts in extraction order.
    pub const ALL: [Self; 6] = [
        Self::Revenue,
        Self::ProfitAfterFinancialItems,
        Self::NetResult,
        Self::Equity,
        Self::TotalAssets,
        Self::AverageEmployees,
    ];

    /// Stable field name, matching the serialized `FinancialFacts` field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::ProfitAfterFinancialItems => "profit_after_financial_items",
            Self::NetResult => "net_result",
            Self::Equity => "equity",
            Self::TotalAssets => "total_assets",
            Self::AverageEmployees => "average_employees",
        }
    }

    /// Kind of context the concept is reported in.
    pub const fn scope_kind(&self) -> ScopeKind {
        match self {
            Self::Equity | Self::TotalAssets => ScopeKind::Instant,
            Self::Revenue
            | Self::ProfitAfterFinancialItems
            | Self::NetResult
            | Self::AverageEmployees => ScopeKind::Duration,
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Maps each concept to the tag names it may be filed under.
///
/// Taxonomy versions and consolidated reports spell the same concept
/// differently. Aliases are tried in order; the first is the canonical name.
#[derive(Debug, Clone)]
pub struct ConceptRegistry {
    aliases: HashMap<Concept, Vec<String>>,
}

impl ConceptRegistry {
    /// Create a registry with the standard Swedish GAAP mappings.
    pub fn new() -> Self {
        let mut aliases: HashMap<Concept, Vec<String>> = HashMap::new();

        // Income statement
        aliases.insert(
            Concept::Revenue,
            strings(&[
                "Nettoomsattning",
                "KoncernensNettoomsattning",
                "NettoomsattningKoncern",
                "Omsattning",
            ]),
        );

        aliases.insert(
            Concept::ProfitAfterFinancialItems,
            strings(&[
                "ResultatEfterFinansiellaPoster",
                "KoncernensResultatEfterFinansiellaPoster",
                "ResultatEfterFinansiellaPosterKoncern",
                "ResultatForeSkatt",
            ]),
        );

        aliases.insert(
            Concept::NetResult,
            strings(&[
                "AretsResultat",
                "KoncernensAretsResultat",
                "AretsResultatKoncern",
                "AretsResultatEfterSkatt",
            ]),
        );

        // Balance sheet
        aliases.insert(
            Concept::Equity,
            strings(&[
                "EgetKapital",
                "SummaEgetKapital",
                "KoncernensEgetKapital",
                "EgetKapitalKoncern",
            ]),
        );

        aliases.insert(
            Concept::TotalAssets,
            strings(&[
                "Tillgangar",
                "SummaTillgangar",
                "KoncernensSummaTillgangar",
                "Balansomslutning",
                "EgetKapitalSkulder",
                "SummaEgetKapitalSkulder",
            ]),
        );

        // Notes
        aliases.insert(
            Concept::AverageEmployees,
            strings(&[
                "MedelantaletAnstallda",
                "MedelantalAnstallda",
                "MedelantaletAnstalldaKoncern",
                "AntalAnstallda",
            ]),
        );

        Self { aliases }
    }

    /// Tag names for a concept, canonical name first.
    pub fn aliases(&self, concept: Concept) -> &[String] {
        self.aliases
            .get(&concept)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append an alias, keeping existing ones ahead of it.
    pub fn add_alias(&mut self, concept: Concept, alias: impl Into<String>) {
        let alias = alias.into();
        let entry = self.aliases.entry(concept).or_default();
        if !entry.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
            entry.push(alias);
        }
    }
}

impl Default for ConceptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Lookup rank of a tag prefix; unknown or missing prefixes sort last.
pub fn namespace_rank(prefix: Option<&str>) -> usize {
    prefix
        .and_then(|p| {
            NAMESPACE_PREFIXES
                .iter()
                .position(|known| known.eq_ignore_ascii_case(p))
        })
        .unwrap_or(NAMESPACE_PREFIXES.len())
}

/// Whether a tag name belongs to a consolidated report.
pub fn is_consolidated_concept(local_name: &str) -> bool {
    CONSOLIDATED_CONCEPTS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(local_name))
}
