//! Period-context classification.
//!
//! Every fact in an inline report points at a context through `contextRef`.
//! Income-statement items live in duration contexts (`period0`, `period1`, ...)
//! and balance-sheet items in instant contexts (`balans0`, `balans1`, ...).
//! The classifier reads the explicit `xbrli:context` definitions first and
//! falls back to identifier heuristics for references it cannot find a
//! definition for.

use crate::document::Document;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Substrings marking an instant (point-in-time) identifier.
const INSTANT_HINTS: &[&str] = &["instant", "balance", "balans"];

/// Substrings marking a duration identifier.
const DURATION_HINTS: &[&str] = &["period", "duration", "current"];

/// Kind of period a context covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Point in time (balance sheet)
    Instant,
    /// Start/end range (income statement)
    Duration,
    /// Could not be told apart; usable as either
    Ambiguous,
}

/// Classify a context identifier from its spelling alone.
///
/// Instant hints are checked first, so `current_balance` is an instant.
pub fn classify_scope_id(id: &str) -> ScopeKind {
    let lower = id.to_lowercase();
    if INSTANT_HINTS.iter().any(|hint| lower.contains(hint)) {
        ScopeKind::Instant
    } else if DURATION_HINTS.iter().any(|hint| lower.contains(hint)) {
        ScopeKind::Duration
    } else {
        ScopeKind::Ambiguous
    }
}

/// An explicitly defined context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    /// Context identifier
    pub id: String,
    /// Instant or duration
    pub kind: ScopeKind,
    /// Start date (durations only)
    pub start: Option<NaiveDate>,
    /// End date, or the instant date
    pub end: Option<NaiveDate>,
}

/// Ordered context candidates found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCandidates {
    /// Duration-like identifiers, shortest first
    pub duration: Vec<String>,
    /// Instant-like identifiers, shortest first
    pub instant: Vec<String>,
    /// Explicit definitions, in document order
    pub definitions: Vec<ScopeDefinition>,
}

impl ScopeCandidates {
    /// Scan a document for context definitions and references.
    pub fn from_document(doc: &Document) -> Self {
        let mut candidates = Self::default();

        for context in doc.elements_named("context") {
            let Some(id) = context.attr("id") else {
                continue;
            };
            let mut instant = None;
            let mut start = None;
            let mut end = None;
            for child in context.descendants() {
                match child.local_name() {
                    "instant" => instant = Some(parse_date(&child.trimmed_text())),
                    "startdate" => start = Some(parse_date(&child.trimmed_text())),
                    "enddate" => end = Some(parse_date(&child.trimmed_text())),
                    _ => {}
                }
            }

            let definition = match (instant, start, end) {
                (Some(date), _, _) => ScopeDefinition {
                    id: id.to_string(),
                    kind: ScopeKind::Instant,
                    start: None,
                    end: date,
                },
                (None, Some(start), Some(end)) => ScopeDefinition {
                    id: id.to_string(),
                    kind: ScopeKind::Duration,
                    start,
                    end,
                },
                // `forever` or incomplete periods are left to the heuristics.
                _ => continue,
            };
            candidates.definitions.push(definition);
        }

        let defined: HashSet<&str> = candidates
            .definitions
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        let mut duration: Vec<String> = Vec::new();
        let mut instant: Vec<String> = Vec::new();

        for def in &candidates.definitions {
            match def.kind {
                ScopeKind::Instant => instant.push(def.id.clone()),
                _ => duration.push(def.id.clone()),
            }
        }

        for el in doc.elements() {
            let Some(id) = el.attr("contextref") else {
                continue;
            };
            if defined.contains(id) {
                continue;
            }
            match classify_scope_id(id) {
                ScopeKind::Instant => instant.push(id.to_string()),
                ScopeKind::Duration => duration.push(id.to_string()),
                ScopeKind::Ambiguous => {
                    instant.push(id.to_string());
                    duration.push(id.to_string());
                }
            }
        }

        candidates.duration = ordered(duration);
        candidates.instant = ordered(instant);
        candidates
    }

    /// Candidates for a kind of period. `Ambiguous` yields the duration list.
    pub fn for_kind(&self, kind: ScopeKind) -> &[String] {
        match kind {
            ScopeKind::Instant => &self.instant,
            ScopeKind::Duration | ScopeKind::Ambiguous => &self.duration,
        }
    }

    /// Explicit definition of a context identifier.
    pub fn definition(&self, id: &str) -> Option<&ScopeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Shortest identifier first, ties broken lexically, duplicates removed.
fn ordered(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    ids.dedup();
    ids
}
