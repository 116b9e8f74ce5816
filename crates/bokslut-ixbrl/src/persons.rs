//! Signatory extraction.
//!
//! Names are tagged as separate `ix:nonNumeric` facts for first name, last
//! name and role. Taxonomy releases tie the parts together differently:
//! some through a shared `tupleRef`, some only through a shared context, and
//! some only by placing them next to each other in the markup.

use crate::document::{Document, Element, local_part};
use crate::model::Person;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Role label used when a name was found without any role information.
pub const ROLE_UNKNOWN: &str = "unknown";

/// Ancestor levels searched when pairing by proximity.
const MAX_PROXIMITY_DEPTH: usize = 3;

const FIRST_NAME_HINTS: &[&str] = &["tilltalsnamn", "fornamn", "förnamn", "firstname", "givenname"];
const LAST_NAME_HINTS: &[&str] = &["efternamn", "lastname", "surname", "familyname"];

/// Tag names making up one signature convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonPattern {
    /// First-name tag
    pub first_name: &'static str,
    /// Last-name tag
    pub last_name: &'static str,
    /// Role tag, if the convention has one
    pub role: Option<&'static str>,
    /// Role used when no role text is found
    pub default_role: &'static str,
}

/// Signers of the adoption certificate.
pub const CERTIFICATE_SIGNERS: PersonPattern = PersonPattern {
    first_name: "UnderskriftFaststallelseintygForetradareTilltalsnamn",
    last_name: "UnderskriftFaststallelseintygForetradareEfternamn",
    role: Some("UnderskriftFaststallelseintygForetradareForetradarroll"),
    default_role: "Företrädare",
};

/// Signers of the audit report.
pub const AUDIT_SIGNERS: PersonPattern = PersonPattern {
    first_name: "UnderskriftRevisionsberattelseRevisorTilltalsnamn",
    last_name: "UnderskriftRevisionsberattelseRevisorEfternamn",
    role: Some("UnderskriftRevisionsberattelseRevisorTitel"),
    default_role: "Revisor",
};

/// Signature conventions, tried in order.
pub const PERSON_PATTERNS: &[PersonPattern] = &[
    CERTIFICATE_SIGNERS,
    PersonPattern {
        first_name: "UnderskriftHandlingTilltalsnamn",
        last_name: "UnderskriftHandlingEfternamn",
        role: Some("UnderskriftHandlingRoll"),
        default_role: "Styrelseledamot",
    },
    AUDIT_SIGNERS,
];

/// Extract deduplicated persons in discovery order.
///
/// Falls back to a generic first/last-name scan labelled [`ROLE_UNKNOWN`]
/// when no known convention matches.
pub fn extract_persons(doc: &Document) -> Vec<Person> {
    let tagged = tagged_facts(doc);
    let mut persons = PersonSet::default();
    for pattern in PERSON_PATTERNS {
        collect_pattern(&tagged, pattern, &mut persons);
    }

    if persons.is_empty() {
        generic_scan(doc, &mut persons);
    }
    persons.into_vec()
}

/// Deduplicated persons of one convention only.
pub fn extract_signers(doc: &Document, pattern: &PersonPattern) -> Vec<Person> {
    let mut persons = PersonSet::default();
    collect_pattern(&tagged_facts(doc), pattern, &mut persons);
    persons.into_vec()
}

/// Text facts keyed by lowercase local tag name.
fn tagged_facts(doc: &Document) -> Vec<(String, Element<'_>)> {
    doc.elements()
        .filter(|el| el.local_name() == "nonnumeric")
        .filter_map(|el| {
            el.attr("name")
                .map(|name| (local_part(name).to_lowercase(), el))
        })
        .collect()
}

fn collect_pattern(tagged: &[(String, Element<'_>)], pattern: &PersonPattern, persons: &mut PersonSet) {
    let last_names = tagged_matching(tagged, pattern.last_name);
    let roles = pattern
        .role
        .map(|role| tagged_matching(tagged, role))
        .unwrap_or_default();

    let first_names = tagged_matching(tagged, pattern.first_name);
    for first in first_names.iter().copied() {
        let last_name = find_partner(first, &first_names, &last_names)
            .map(|el| el.trimmed_text())
            .unwrap_or_default();
        let role = find_partner(first, &first_names, &roles)
            .map(|el| el.trimmed_text())
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| pattern.default_role.to_string());
        persons.insert(Person::new(first.trimmed_text(), last_name, role));
    }
}

fn tagged_matching<'d>(tagged: &[(String, Element<'d>)], pattern: &str) -> Vec<Element<'d>> {
    let pattern = pattern.to_lowercase();
    tagged
        .iter()
        .filter(|(name, _)| name.contains(&pattern))
        .map(|(_, el)| *el)
        .collect()
}

fn generic_scan(doc: &Document, persons: &mut PersonSet) {
    let first_names = elements_hinted(doc, FIRST_NAME_HINTS);
    let last_names = elements_hinted(doc, LAST_NAME_HINTS);
    for first in first_names.iter().copied() {
        let last_name = find_partner(first, &first_names, &last_names)
            .map(|el| el.trimmed_text())
            .unwrap_or_default();
        persons.insert(Person::new(first.trimmed_text(), last_name, ROLE_UNKNOWN));
    }
}

/// Elements whose tag name (the `name` attribute for inline facts, the
/// element name otherwise) contains one of the hints.
fn elements_hinted<'d>(doc: &'d Document, hints: &[&str]) -> Vec<Element<'d>> {
    doc.elements()
        .filter(|el| {
            let name = el
                .attr("name")
                .map_or_else(|| el.local_name().to_string(), |n| local_part(n).to_lowercase());
            hints.iter().any(|hint| name.contains(hint))
        })
        .collect()
}

/// Find the tag belonging to the same person as `anchor`.
///
/// `anchors` are all first-name tags of the same convention. A shared
/// `tupleRef` wins. Otherwise the innermost container (up to a few ancestor
/// levels) holding a candidate decides. When that container also holds
/// other signers of the same context, only a candidate between `anchor` and
/// the next first name is taken. Candidates in another context or another
/// tuple are never chosen; a shared context alone is the last resort.
fn find_partner<'d>(
    anchor: Element<'d>,
    anchors: &[Element<'d>],
    candidates: &[Element<'d>],
) -> Option<Element<'d>> {
    if let Some(group) = anchor.attr("tupleref")
        && let Some(found) = candidates.iter().find(|c| c.attr("tupleref") == Some(group))
    {
        return Some(*found);
    }

    let scope = anchor.attr("contextref");
    let eligible: Vec<Element<'d>> = candidates
        .iter()
        .filter(|c| c.attr("tupleref").is_none())
        .filter(|c| same_scope(scope, c))
        .copied()
        .collect();

    let next_anchor = anchors
        .iter()
        .filter(|a| same_scope(scope, a))
        .map(Element::index)
        .filter(|i| *i > anchor.index())
        .min();

    let mut ancestor = anchor.parent();
    for _ in 0..MAX_PROXIMITY_DEPTH {
        let Some(container) = ancestor else {
            break;
        };
        let inside: Vec<Element<'d>> = eligible
            .iter()
            .filter(|c| container.contains(c))
            .copied()
            .collect();
        if !inside.is_empty() {
            let shared = anchors.iter().any(|a| {
                a.index() != anchor.index() && container.contains(a) && same_scope(scope, a)
            });
            if shared {
                return inside.iter().copied().find(|c| {
                    c.index() > anchor.index() && next_anchor.is_none_or(|next| c.index() < next)
                });
            }
            return nearest(anchor, inside.iter());
        }
        ancestor = container.parent();
    }

    scope.and_then(|_| nearest(anchor, eligible.iter().filter(|c| c.attr("contextref").is_some())))
}

/// A missing context is compatible with any context.
fn same_scope(scope: Option<&str>, other: &Element<'_>) -> bool {
    match (scope, other.attr("contextref")) {
        (Some(own), Some(theirs)) => own == theirs,
        _ => true,
    }
}

/// Closest candidate in document order; ties go to the one after the anchor.
fn nearest<'a, 'd: 'a>(
    anchor: Element<'d>,
    candidates: impl Iterator<Item = &'a Element<'d>>,
) -> Option<Element<'d>> {
    candidates
        .filter(|c| c.index() != anchor.index())
        .min_by_key(|c| (c.index().abs_diff(anchor.index()), c.index() < anchor.index()))
        .copied()
}

/// Insertion-ordered set keyed on the case-insensitive (first, last, role).
#[derive(Debug, Default)]
struct PersonSet {
    seen: HashSet<(String, String, String)>,
    persons: Vec<Person>,
}

impl PersonSet {
    fn insert(&mut self, person: Person) {
        if person.first_name.is_empty() {
            return;
        }
        if self.seen.insert(person.dedup_key()) {
            self.persons.push(person);
        }
    }

    fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    fn into_vec(self) -> Vec<Person> {
        self.persons
    }
}

/// Role category of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonCategory {
    /// Board member, chair, deputy or company representative
    Board,
    /// Auditor
    Auditor,
    /// Managing director
    Ceo,
    /// Anything else
    Other,
}

const AUDITOR_KEYWORDS: &[&str] = &["revisor", "auditor"];
const CEO_KEYWORDS: &[&str] = &[
    "verkställande direktör",
    "verkstallande direktor",
    "managing director",
    "chief executive",
    "ceo",
];
const BOARD_KEYWORDS: &[&str] = &[
    "styrelse",
    "ordförande",
    "ordforande",
    "ledamot",
    "suppleant",
    "board",
    "chair",
    "företrädare",
    "foretradare",
];
const CHAIR_KEYWORDS: &[&str] = &["ordförande", "ordforande", "chair"];

/// Classify a role label. Auditor is checked first, then CEO, then board.
pub fn categorize(role: &str) -> PersonCategory {
    let role = role.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| role.contains(k));

    if has(AUDITOR_KEYWORDS) {
        PersonCategory::Auditor
    } else if has(CEO_KEYWORDS) || role.split(|c: char| !c.is_alphanumeric()).any(|t| t == "vd") {
        PersonCategory::Ceo
    } else if has(BOARD_KEYWORDS) {
        PersonCategory::Board
    } else {
        PersonCategory::Other
    }
}

/// Persons grouped by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonGroups {
    /// Board, chair first
    pub board: Vec<Person>,
    /// Auditors
    pub auditors: Vec<Person>,
    /// Managing director
    pub ceo: Option<Person>,
    /// Unclassified roles, including further CEO matches
    pub other: Vec<Person>,
}

impl PersonGroups {
    /// Group persons, keeping input order within each group.
    pub fn from_persons(persons: &[Person]) -> Self {
        let mut groups = Self::default();
        let mut chairs = 0;
        for person in persons {
            match categorize(&person.role) {
                PersonCategory::Auditor => groups.auditors.push(person.clone()),
                PersonCategory::Ceo if groups.ceo.is_none() => groups.ceo = Some(person.clone()),
                PersonCategory::Board => {
                    let role = person.role.to_lowercase();
                    if CHAIR_KEYWORDS.iter().any(|k| role.contains(k)) {
                        groups.board.insert(chairs, person.clone());
                        chairs += 1;
                    } else {
                        groups.board.push(person.clone());
                    }
                }
                PersonCategory::Ceo | PersonCategory::Other => groups.other.push(person.clone()),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_pairs_by_tuple_reference() {
        let doc = Document::parse(
            r#"<div>
            <ix:nonNumeric name="se-gen-base:UnderskriftFaststallelseintygForetradareTilltalsnamn" tupleRef="t1" contextRef="c">Anna</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftFaststallelseintygForetradareTilltalsnamn" tupleRef="t2" contextRef="c">Bo</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftFaststallelseintygForetradareEfternamn" tupleRef="t2" contextRef="c">Berg</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftFaststallelseintygForetradareEfternamn" tupleRef="t1" contextRef="c">Ek</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftFaststallelseintygForetradareForetradarroll" tupleRef="t2" contextRef="c">Styrelseordförande</ix:nonNumeric>
            </div>"#,
        )
        .unwrap();
        let persons = extract_persons(&doc);
        assert_eq!(
            persons,
            vec![
                Person::new("Anna", "Ek", "Företrädare"),
                Person::new("Bo", "Berg", "Styrelseordförande"),
            ]
        );
    }

    #[test]
    fn test_pairs_by_context_then_proximity() {
        let doc = Document::parse(
            r#"<body>
            <ix:nonNumeric name="se-gen-base:UnderskriftHandlingTilltalsnamn" contextRef="s1">Cecilia</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftHandlingTilltalsnamn" contextRef="s2">David</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftHandlingEfternamn" contextRef="s2">Dahl</ix:nonNumeric>
            <ix:nonNumeric name="se-gen-base:UnderskriftHandlingEfternamn" contextRef="s1">Carlsson</ix:nonNumeric>
            <p><span>
              <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorTilltalsnamn">Eva</ix:nonNumeric>
              <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorEfternamn">Eriksson</ix:nonNumeric>
            </span>
            <ix:nonNumeric name="se-gen-base:UnderskriftRevisionsberattelseRevisorTitel">Auktoriserad revisor</ix:nonNumeric></p>
            </body>"#,
        )
        .unwrap();
        let persons = extract_persons(&doc);
        assert_eq!(
            persons,
            vec![
                Person::new("Cecilia", "Carlsson", "Styrelseledamot"),
                Person::new("David", "Dahl", "Styrelseledamot"),
                Person::new("Eva", "Eriksson", "Auktoriserad revisor"),
            ]
        );
    }

    #[test]
    fn test_untupled_name_skips_tupled_roles() {
        let doc = Document::parse(
            r#"<div>
            <ix:nonNumeric name="a:UnderskriftHandlingTilltalsnamn" tupleRef="t1">Hanna</ix:nonNumeric>
            <ix:nonNumeric name="a:UnderskriftHandlingRoll" tupleRef="t1">Ordförande</ix:nonNumeric>
            <ix:nonNumeric name="a:UnderskriftHandlingTilltalsnamn">Ivar</ix:nonNumeric>
            <ix:nonNumeric name="a:UnderskriftHandlingEfternamn">Ek</ix:nonNumeric>
            </div>"#,
        )
        .unwrap();
        let persons = extract_persons(&doc);
        assert_eq!(persons[0].role, "Ordförande");
        assert_eq!(persons[1], Person::new("Ivar", "Ek", "Styrelseledamot"));
    }

    #[test]
    fn test_deduplicates_case_insensitively() {
        let doc = Document::parse(
            r#"<div>
            <span><ix:nonNumeric name="a:UnderskriftHandlingTilltalsnamn">Anna</ix:nonNumeric>
            <ix:nonNumeric name="a:UnderskriftHandlingEfternamn">Ek</ix:nonNumeric></span>
            <span><ix:nonNumeric name="a:UnderskriftHandlingTilltalsnamn">ANNA</ix:nonNumeric>
            <ix:nonNumeric name="a:UnderskriftHandlingEfternamn">ek</ix:nonNumeric></span>
            </div>"#,
        )
        .unwrap();
        assert_eq!(extract_persons(&doc).len(), 1);
    }

    #[test]
    fn test_generic_fallback_marks_role_unknown() {
        let doc = Document::parse(
            r#"<div>
            <p><ix:nonNumeric name="x:SignaturFornamn" contextRef="c1">Frida</ix:nonNumeric>
               <ix:nonNumeric name="x:SignaturEfternamn" contextRef="c1">Falk</ix:nonNumeric></p>
            <p><firstname>Gustav</firstname><surname>Gran</surname></p>
            </div>"#,
        )
        .unwrap();
        let persons = extract_persons(&doc);
        assert_eq!(
            persons,
            vec![
                Person::new("Frida", "Falk", ROLE_UNKNOWN),
                Person::new("Gustav", "Gran", ROLE_UNKNOWN),
            ]
        );
    }

    #[test]
    fn test_no_names_no_persons() {
        let doc = Document::parse("<div><p>Ingen underskrift</p></div>").unwrap();
        assert!(extract_persons(&doc).is_empty());
    }

    #[rstest]
    #[case("Huvudansvarig revisor", PersonCategory::Auditor)]
    #[case("Verkställande direktör", PersonCategory::Ceo)]
    #[case("Styrelseledamot, VD", PersonCategory::Ceo)]
    #[case("Styrelseordförande", PersonCategory::Board)]
    #[case("Styrelsesuppleant", PersonCategory::Board)]
    #[case("Företrädare", PersonCategory::Board)]
    #[case("unknown", PersonCategory::Other)]
    fn test_categorize(#[case] role: &str, #[case] expected: PersonCategory) {
        assert_eq!(categorize(role), expected);
    }

    #[test]
    fn test_groups_put_chair_first() {
        let persons = vec![
            Person::new("A", "A", "Styrelseledamot"),
            Person::new("B", "B", "Ordförande"),
            Person::new("C", "C", "Revisor"),
            Person::new("D", "D", "Verkställande direktör"),
            Person::new("E", "E", "Vice verkställande direktör"),
        ];
        let groups = PersonGroups::from_persons(&persons);
        assert_eq!(groups.board[0].first_name, "B");
        assert_eq!(groups.board.len(), 2);
        assert_eq!(groups.auditors.len(), 1);
        assert_eq!(groups.ceo.unwrap().first_name, "D");
        assert_eq!(groups.other[0].first_name, "E");
    }
}
