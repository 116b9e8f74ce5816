//! Taxonomy version detection.
//!
//! Reports reference their taxonomy entry points through `schemaRef`
//! hrefs such as `http://xbrl.taxonomier.se/se/fr/gaap/k2/2021-10-31/...`.
//! Versions Bolagsverket no longer accepts are flagged as archived.

use crate::model::{ParseWarning, WarningKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Matches a taxonomy entry-point path and captures family and version date.
static ENTRY_POINT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"se/fr/(gaap/k3k|gaap/k3|gaap/k2|ar|ci)/(\d{4}-\d{2}-\d{2})").ok()
});

/// Taxonomy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxonomyFamily {
    /// Annual report, smaller companies
    K2,
    /// Annual report, larger companies
    K3,
    /// Consolidated annual report
    K3K,
    /// Audit report
    AuditReport,
    /// Adoption certificate
    Certificate,
}

impl TaxonomyFamily {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "gaap/k2" => Some(Self::K2),
            "gaap/k3" => Some(Self::K3),
            "gaap/k3k" => Some(Self::K3K),
            "ar" => Some(Self::AuditReport),
            "ci" => Some(Self::Certificate),
            _ => None,
        }
    }
}

impl fmt::Display for TaxonomyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::K2 => "K2",
            Self::K3 => "K3",
            Self::K3K => "K3K",
            Self::AuditReport => "audit report",
            Self::Certificate => "adoption certificate",
        };
        f.write_str(name)
    }
}

/// A known taxonomy release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyVersion {
    /// Family
    pub family: TaxonomyFamily,
    /// Release date
    pub version: &'static str,
    /// No longer accepted for filing
    pub archived: bool,
}

/// Releases recognized by the extractor.
pub const KNOWN_TAXONOMIES: &[TaxonomyVersion] = &[
    release(TaxonomyFamily::K2, "2024-09-12", false),
    release(TaxonomyFamily::K2, "2021-10-31", false),
    release(TaxonomyFamily::K2, "2017-09-30", true),
    release(TaxonomyFamily::K3, "2021-10-31", false),
    release(TaxonomyFamily::K3, "2020-12-01", false),
    release(TaxonomyFamily::K3, "2018-12-17", true),
    release(TaxonomyFamily::K3K, "2021-10-31", false),
    release(TaxonomyFamily::K3K, "2020-12-01", false),
    release(TaxonomyFamily::AuditReport, "2020-12-01", false),
    release(TaxonomyFamily::Certificate, "2022-09-01", false),
    release(TaxonomyFamily::Certificate, "2020-12-01", false),
];

const fn release(family: TaxonomyFamily, version: &'static str, archived: bool) -> TaxonomyVersion {
    TaxonomyVersion {
        family,
        version,
        archived,
    }
}

/// A taxonomy reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectedTaxonomy {
    /// Family
    pub family: TaxonomyFamily,
    /// Release date as referenced
    pub version: String,
    /// Release is archived
    pub archived: bool,
    /// Release is in the known registry
    pub known: bool,
}

impl DetectedTaxonomy {
    /// Warning for archived or unknown releases.
    pub fn warning(&self) -> Option<ParseWarning> {
        let message = if self.archived {
            format!(
                "{} taxonomy {} is archived and no longer accepted for filing",
                self.family, self.version
            )
        } else if !self.known {
            format!("{} taxonomy {} is not a supported release", self.family, self.version)
        } else {
            return None;
        };
        Some(
            ParseWarning::new(WarningKind::TaxonomyMismatch, "taxonomy", message)
                .with_value(self.version.clone()),
        )
    }
}

/// Find every taxonomy release referenced in raw document text, in order of
/// first appearance.
pub fn detect_taxonomies(text: &str) -> Vec<DetectedTaxonomy> {
    let Some(pattern) = ENTRY_POINT.as_ref() else {
        return Vec::new();
    };
    let lower = text.to_lowercase();
    let mut detected: Vec<DetectedTaxonomy> = Vec::new();

    for captures in pattern.captures_iter(&lower) {
        let Some(family) = captures.get(1).and_then(|m| TaxonomyFamily::from_path(m.as_str()))
        else {
            continue;
        };
        let Some(version) = captures.get(2).map(|m| m.as_str()) else {
            continue;
        };
        if detected
            .iter()
            .any(|d| d.family == family && d.version == version)
        {
            continue;
        }

        let known = KNOWN_TAXONOMIES
            .iter()
            .find(|t| t.family == family && t.version == version);
        detected.push(DetectedTaxonomy {
            family,
            version: version.to_string(),
            archived: known.is_some_and(|t| t.archived),
            known: known.is_some(),
        });
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_current_release() {
        let text = r#"<link:schemaRef xlink:href="http://xbrl.taxonomier.se/se/fr/gaap/k2/2021-10-31/se-k2-ix-2021-10-31.xsd"/>"#;
        let detected = detect_taxonomies(text);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].family, TaxonomyFamily::K2);
        assert_eq!(detected[0].version, "2021-10-31");
        assert!(detected[0].known);
        assert!(detected[0].warning().is_none());
    }

    #[test]
    fn test_archived_release_warns() {
        let detected = detect_taxonomies("http://xbrl.taxonomier.se/se/fr/gaap/k3/2018-12-17/entry.xsd");
        let warning = detected[0].warning().unwrap();
        assert_eq!(warning.kind, WarningKind::TaxonomyMismatch);
        assert!(warning.message.contains("archived"));
    }

    #[test]
    fn test_unknown_release_of_known_family_warns() {
        let detected = detect_taxonomies("SE/FR/GAAP/K3K/2030-01-01/x.xsd");
        assert_eq!(detected[0].family, TaxonomyFamily::K3K);
        assert!(!detected[0].known);
        assert!(detected[0].warning().unwrap().message.contains("not a supported"));
    }

    #[test]
    fn test_multiple_references_deduplicated() {
        let text = "se/fr/gaap/k2/2024-09-12/a.xsd se/fr/ci/2020-12-01/b.xsd se/fr/gaap/k2/2024-09-12/c.xsd";
        let detected = detect_taxonomies(text);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[1].family, TaxonomyFamily::Certificate);
    }

    #[test]
    fn test_no_reference() {
        assert!(detect_taxonomies("<html><body/></html>").is_empty());
    }
}
