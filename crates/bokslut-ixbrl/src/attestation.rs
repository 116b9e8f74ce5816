//! Audit report and adoption certificate.
//!
//! Both sections are signed statements appended to the annual report. Only
//! the tagged parts are read: who signed, when and where, and whether the
//! auditor made remarks.

use crate::document::Document;
use crate::model::{ParseWarning, WarningKind};
use crate::persons::{AUDIT_SIGNERS, CERTIFICATE_SIGNERS, extract_signers};
use crate::resolve::FactIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const AUDIT_FIRM_TAGS: &[&str] = &["UnderskriftRevisionsberattelseRevisionsbolag"];
const AUDIT_DATE_TAGS: &[&str] = &["UnderskriftRevisionsberattelseDatum"];
const AUDIT_PLACE_TAGS: &[&str] = &["UnderskriftRevisionsberattelseOrt"];
const AUDIT_OPINION_TAGS: &[&str] = &["RevisorsUttalandeOmArsredovisningen"];
const AUDIT_REMARK_TAGS: &[&str] = &["AnmarkningarRevisionsberattelse"];
const CERTIFICATE_DATE_TAGS: &[&str] = &["UnderskriftFaststallelseintygDatum"];
const MEETING_DATE_TAGS: &[&str] = &["ArsstammaDatum", "Arsstamma"];

/// The auditor's report as tagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Signing auditor, "First Last"
    pub auditor: Option<String>,
    /// Title, e.g. "Auktoriserad revisor"
    pub title: Option<String>,
    /// Audit firm
    pub firm: Option<String>,
    /// Signing date
    pub date: Option<NaiveDate>,
    /// Signing place
    pub place: Option<String>,
    /// Opinion on the annual report
    pub opinion: Option<String>,
    /// Remarks, empty for a clean report
    pub remarks: Vec<String>,
}

impl AuditReport {
    /// Read the audit report; `None` when neither an auditor nor a date is tagged.
    pub fn read(doc: &Document, index: &FactIndex<'_>, warnings: &mut Vec<ParseWarning>) -> Option<Self> {
        let signer = extract_signers(doc, &AUDIT_SIGNERS).into_iter().next();
        let report = Self {
            auditor: signer.as_ref().map(|p| p.full_name()),
            title: signer
                .map(|p| p.role)
                .filter(|role| role != AUDIT_SIGNERS.default_role),
            firm: index.first_text(AUDIT_FIRM_TAGS),
            date: read_date(index, AUDIT_DATE_TAGS, "audit_report.date", warnings),
            place: index.first_text(AUDIT_PLACE_TAGS),
            opinion: index.first_text(AUDIT_OPINION_TAGS),
            remarks: index.first_text(AUDIT_REMARK_TAGS).into_iter().collect(),
        };
        (report.auditor.is_some() || report.date.is_some()).then_some(report)
    }

    /// The auditor made no remarks.
    pub fn is_clean(&self) -> bool {
        self.remarks.is_empty()
    }
}

/// The certificate that the annual meeting adopted the accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionCertificate {
    /// Date the certificate was signed
    pub date: Option<NaiveDate>,
    /// Date of the annual general meeting
    pub meeting_date: Option<NaiveDate>,
    /// Signers, "First Last", in document order
    pub signers: Vec<String>,
}

impl AdoptionCertificate {
    /// Read the certificate; `None` when neither a date nor a signer is tagged.
    pub fn read(doc: &Document, index: &FactIndex<'_>, warnings: &mut Vec<ParseWarning>) -> Option<Self> {
        let certificate = Self {
            date: read_date(index, CERTIFICATE_DATE_TAGS, "adoption_certificate.date", warnings),
            meeting_date: read_date(
                index,
                MEETING_DATE_TAGS,
                "adoption_certificate.meeting_date",
                warnings,
            ),
            signers: extract_signers(doc, &CERTIFICATE_SIGNERS)
                .iter()
                .map(|p| p.full_name())
                .collect(),
        };
        (certificate.date.is_some() || !certificate.signers.is_empty()).then_some(certificate)
    }

    /// The accounts were adopted at a dated meeting.
    pub const fn is_adopted(&self) -> bool {
        self.meeting_date.is_some()
    }
}

/// First tagged date for any of the tags; warns when it is not `YYYY-MM-DD`.
pub(crate) fn read_date(
    index: &FactIndex<'_>,
    tags: &[&str],
    field: &str,
    warnings: &mut Vec<ParseWarning>,
) -> Option<NaiveDate> {
    let text = index.first_text(tags)?;
    let parsed = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok();
    if parsed.is_none() {
        warnings.push(
            ParseWarning::new(WarningKind::ParseError, field, "not a YYYY-MM-DD date")
                .with_value(text),
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> (Option<AuditReport>, Option<AdoptionCertificate>, Vec<ParseWarning>) {
        let doc = Document::parse(text).unwrap();
        let index = FactIndex::textual(&doc);
        let mut warnings = Vec::new();
        let audit = AuditReport::read(&doc, &index, &mut warnings);
        let certificate = AdoptionCertificate::read(&doc, &index, &mut warnings);
        (audit, certificate, warnings)
    }

    #[test]
    fn test_audit_report_with_firm_and_remarks() {
        let (audit, certificate, warnings) = read(
            r#"<div><p>
              <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorTilltalsnamn" contextRef="period0">Eva</ix:nonNumeric>
              <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorEfternamn" contextRef="period0">Eriksson</ix:nonNumeric>
              <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorTitel" contextRef="period0">Auktoriserad revisor</ix:nonNumeric>
            </p>
            <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisionsbolag" contextRef="period0">Revisionsbyrån Norr AB</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseOrt" contextRef="period0">Umeå</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseDatum" contextRef="period0">2024-04-02</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:AnmarkningarRevisionsberattelse" contextRef="period0">Skatter har inte betalats i rätt tid.</ix:nonNumeric>
            </div>"#,
        );
        let audit = audit.unwrap();
        assert_eq!(audit.auditor.as_deref(), Some("Eva Eriksson"));
        assert_eq!(audit.title.as_deref(), Some("Auktoriserad revisor"));
        assert_eq!(audit.firm.as_deref(), Some("Revisionsbyrån Norr AB"));
        assert_eq!(audit.place.as_deref(), Some("Umeå"));
        assert_eq!(audit.date, NaiveDate::from_ymd_opt(2024, 4, 2));
        assert!(!audit.is_clean());
        assert!(certificate.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_untitled_auditor_has_no_title() {
        let (audit, _, _) = read(
            r#"<p><ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorTilltalsnamn">Olle</ix:nonNumeric></p>"#,
        );
        let audit = audit.unwrap();
        assert_eq!(audit.auditor.as_deref(), Some("Olle"));
        assert_eq!(audit.title, None);
        assert!(audit.is_clean());
    }

    #[test]
    fn test_adoption_certificate() {
        let (audit, certificate, _) = read(
            r#"<div>
            <ix:nonNumeric name="se-bol-base:ArsstammaDatum" contextRef="period0">2024-05-20</ix:nonNumeric>
            <ix:nonNumeric name="se-bol-base:UnderskriftFaststallelseintygDatum" contextRef="period0">2024-05-21</ix:nonNumeric>
            <ix:nonNumeric name="se-bol-base:UnderskriftFaststallelseintygForetradareTilltalsnamn" tupleRef="f1" contextRef="period0">Karin</ix:nonNumeric>
            <ix:nonNumeric name="se-bol-base:UnderskriftFaststallelseintygForetradareEfternamn" tupleRef="f1" contextRef="period0">Nord</ix:nonNumeric>
            </div>"#,
        );
        assert!(audit.is_none());
        let certificate = certificate.unwrap();
        assert_eq!(certificate.date, NaiveDate::from_ymd_opt(2024, 5, 21));
        assert_eq!(certificate.meeting_date, NaiveDate::from_ymd_opt(2024, 5, 20));
        assert_eq!(certificate.signers, vec!["Karin Nord"]);
        assert!(certificate.is_adopted());
    }

    #[test]
    fn test_bad_certificate_date_warns() {
        let (_, certificate, warnings) = read(
            r#"<p><ix:nonNumeric name="se-bol-base:UnderskriftFaststallelseintygDatum" contextRef="period0">21 maj 2024</ix:nonNumeric></p>"#,
        );
        assert!(certificate.is_none());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "adoption_certificate.date");
        assert_eq!(warnings[0].value.as_deref(), Some("21 maj 2024"));
    }
}
