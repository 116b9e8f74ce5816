//! Concept resolution strategies.
//!
//! A concept is resolved by walking an ordered [`ResolutionPlan`]: each
//! [`Strategy`] either finds a usable tagged fact or hands over to the next.
//! Within a strategy the loop order is alias, then context, then namespace,
//! so an earlier alias in an unusual namespace beats a later alias in the
//! preferred one.

use crate::concepts::{Concept, namespace_rank};
use crate::document::{Document, Element, local_part, prefix_part};
use crate::model::{FactProvenance, ParseWarning, WarningKind};
use crate::normalize::{NumberFormat, NumericAttributes, Precision, is_placeholder, normalize};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Alias × candidate context, first usable fact wins
    Scoped,
    /// Alias only, context ignored; last resort
    Global,
}

impl Strategy {
    /// Find the first usable fact for any alias under this strategy.
    pub fn find<'d>(
        &self,
        index: &FactIndex<'d>,
        aliases: &[String],
        scopes: &[String],
    ) -> Option<TaggedFact<'d>> {
        match self {
            Self::Scoped => aliases.iter().find_map(|alias| {
                let facts = index.facts(alias);
                scopes.iter().find_map(|scope| {
                    facts
                        .iter()
                        .find(|fact| fact.context() == Some(scope.as_str()) && fact.is_usable())
                        .copied()
                })
            }),
            Self::Global => aliases
                .iter()
                .find_map(|alias| index.facts(alias).iter().find(|f| f.is_usable()).copied()),
        }
    }
}

/// Ordered list of strategies, evaluated until one matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    strategies: Vec<Strategy>,
}

impl ResolutionPlan {
    /// Plan from an explicit strategy list.
    pub const fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Scoped lookup, optionally followed by the global fallback.
    pub fn standard(allow_global_fallback: bool) -> Self {
        if allow_global_fallback {
            Self::new(vec![Strategy::Scoped, Strategy::Global])
        } else {
            Self::exact()
        }
    }

    /// Scoped lookup only.
    pub fn exact() -> Self {
        Self::new(vec![Strategy::Scoped])
    }

    /// Strategies in evaluation order.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// First match along the chain, with the strategy that produced it.
    pub fn find<'d>(
        &self,
        index: &FactIndex<'d>,
        aliases: &[String],
        scopes: &[String],
    ) -> Option<(Strategy, TaggedFact<'d>)> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.find(index, aliases, scopes).map(|f| (*strategy, f)))
    }
}

/// A tagged fact element.
#[derive(Debug, Clone, Copy)]
pub struct TaggedFact<'d> {
    element: Element<'d>,
    rank: usize,
}

impl<'d> TaggedFact<'d> {
    /// Underlying element.
    pub const fn element(&self) -> Element<'d> {
        self.element
    }

    /// Qualified tag name from the `name` attribute.
    pub fn name(&self) -> &'d str {
        self.element.attr("name").unwrap_or_default()
    }

    /// Context reference.
    pub fn context(&self) -> Option<&'d str> {
        self.element.attr("contextref")
    }

    /// Displayed text, whitespace collapsed.
    pub fn text(&self) -> String {
        self.element.trimmed_text()
    }

    /// Declared number format.
    pub fn format(&self) -> NumberFormat {
        NumberFormat::from_attribute(self.element.attr("format"))
    }

    /// Whether the fact carries a reportable value.
    ///
    /// Explicit nils, empty text and dash placeholders are skipped unless a
    /// zero-dash format turns the dash into zero.
    pub fn is_usable(&self) -> bool {
        if self
            .element
            .attr("xsi:nil")
            .is_some_and(|nil| nil.trim().eq_ignore_ascii_case("true"))
        {
            return false;
        }
        !is_placeholder(&self.text(), self.format())
    }

    /// Normalized integer value; `None` when the text is not a number.
    pub fn value(&self) -> Option<i64> {
        let attrs = NumericAttributes {
            format: self.element.attr("format"),
            scale: self.element.attr("scale"),
            sign: self.element.attr("sign"),
        };
        normalize(&self.element.text(), &attrs)
    }

    /// Scale, decimals, unit and format as declared.
    pub fn precision(&self) -> Precision {
        Precision::from_attributes(
            self.element.attr("scale"),
            self.element.attr("decimals"),
            self.element.attr("unitref"),
            self.element.attr("format"),
        )
    }
}

/// Tagged facts of one kind, grouped by lowercase local tag name.
///
/// Each group is ordered by namespace rank, then document order.
#[derive(Debug, Clone, Default)]
pub struct FactIndex<'d> {
    by_name: HashMap<String, Vec<TaggedFact<'d>>>,
}

impl<'d> FactIndex<'d> {
    /// Index numeric facts (`ix:nonFraction`).
    pub fn numeric(doc: &'d Document) -> Self {
        Self::build(doc, "nonfraction")
    }

    /// Index text facts (`ix:nonNumeric`).
    pub fn textual(doc: &'d Document) -> Self {
        Self::build(doc, "nonnumeric")
    }

    fn build(doc: &'d Document, element_name: &str) -> Self {
        let mut by_name: HashMap<String, Vec<TaggedFact<'d>>> = HashMap::new();
        for element in doc.elements().filter(|el| el.local_name() == element_name) {
            let Some(name) = element.attr("name") else {
                continue;
            };
            let rank = namespace_rank(prefix_part(name));
            by_name
                .entry(local_part(name).to_lowercase())
                .or_default()
                .push(TaggedFact { element, rank });
        }
        for facts in by_name.values_mut() {
            facts.sort_by_key(|f| (f.rank, f.element.index()));
        }
        Self { by_name }
    }

    /// Facts filed under a local tag name, case-insensitive.
    pub fn facts(&self, tag: &str) -> &[TaggedFact<'d>] {
        self.by_name
            .get(&tag.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every indexed fact, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &TaggedFact<'d>> + '_ {
        self.by_name.values().flatten()
    }

    /// Number of distinct tag names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// First usable text for any of the tag names, context ignored.
    pub fn first_text(&self, tags: &[&str]) -> Option<String> {
        tags.iter().find_map(|tag| {
            self.facts(tag)
                .iter()
                .find(|f| f.is_usable())
                .map(TaggedFact::text)
        })
    }
}

/// Outcome of resolving one concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Concept requested
    pub concept: Concept,
    /// Normalized value
    pub value: Option<i64>,
    /// Where the value came from, when a fact was found
    pub provenance: Option<FactProvenance>,
    /// Problem found while resolving
    pub warning: Option<ParseWarning>,
}

/// Resolve a concept to a value along a plan.
///
/// The first usable fact decides the outcome: text that fails to normalize
/// gives a null value with a parse-error warning, not a second search.
pub fn resolve_concept(
    plan: &ResolutionPlan,
    index: &FactIndex<'_>,
    concept: Concept,
    aliases: &[String],
    scopes: &[String],
) -> Resolution {
    let Some((strategy, fact)) = plan.find(index, aliases, scopes) else {
        debug!("{concept}: no tagged value under {} aliases", aliases.len());
        return Resolution {
            concept,
            value: None,
            provenance: None,
            warning: Some(ParseWarning::new(
                WarningKind::MissingData,
                concept.field(),
                format!("no tagged value found for {concept}"),
            )),
        };
    };

    let scope = fact.context().map(str::to_string);
    let fallback_scope = strategy == Strategy::Global;
    if fallback_scope {
        warn!(
            "{concept}: bound via global fallback to {} in context {}",
            fact.name(),
            scope.as_deref().unwrap_or("<none>")
        );
    } else {
        debug!(
            "{concept}: matched {} in context {}",
            fact.name(),
            scope.as_deref().unwrap_or("<none>")
        );
    }

    let raw_text = fact.text();
    let value = fact.value();
    let warning = value.is_none().then(|| {
        ParseWarning::new(
            WarningKind::ParseError,
            concept.field(),
            format!("could not read a number from {}", fact.name()),
        )
        .with_value(raw_text.clone())
    });

    Resolution {
        concept,
        value,
        provenance: Some(FactProvenance {
            concept,
            tag: fact.name().to_string(),
            scope,
            strategy,
            fallback_scope,
            raw_text,
            precision: fact.precision(),
        }),
        warning,
    }
}
