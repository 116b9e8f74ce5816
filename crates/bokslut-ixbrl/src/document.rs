//! Tolerant markup loading for inline-tagged reports.
//!
//! Filed reports are nominally XHTML, but real filings contain unclosed
//! elements, HTML void tags and named HTML entities. The loader reads them
//! with `quick-xml` in a lenient configuration and builds a small arena tree
//! in document order. Element names and attribute keys are lowercased;
//! attribute values and text keep their original case.

use crate::error::{IxbrlError, Result};
use quick_xml::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// HTML elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone)]
enum Content {
    Element(usize),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<Content>,
    /// One past the last node index inside this element's subtree.
    subtree_end: usize,
}

/// A parsed markup document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

/// Borrowed handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'d> {
    doc: &'d Document,
    index: usize,
}

impl Document {
    /// Parse document text.
    ///
    /// Mismatched or missing end tags are tolerated. Returns
    /// [`IxbrlError::Markup`] when the reader cannot make sense of the input
    /// and [`IxbrlError::EmptyDocument`] when no element is found.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
        config.trim_text(false);

        let mut doc = Self { nodes: Vec::new() };
        let mut stack: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let index = doc.open(&e, stack.last().copied());
                    if VOID_ELEMENTS.contains(&doc.nodes[index].name.as_str()) {
                        doc.nodes[index].subtree_end = index + 1;
                    } else {
                        stack.push(index);
                    }
                }
                Ok(Event::Empty(e)) => {
                    let index = doc.open(&e, stack.last().copied());
                    doc.nodes[index].subtree_end = index + 1;
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                    // Pop back to the matching open element; stray end tags are ignored.
                    if let Some(pos) = stack.iter().rposition(|&i| doc.nodes[i].name == name) {
                        let end = doc.nodes.len();
                        for &open in &stack[pos..] {
                            doc.nodes[open].subtree_end = end;
                        }
                        stack.truncate(pos);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(&parent) = stack.last() {
                        let raw = String::from_utf8_lossy(&e);
                        doc.push_text(parent, unescape(&raw));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(&parent) = stack.last() {
                        doc.push_text(parent, String::from_utf8_lossy(&e).into_owned());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(IxbrlError::Markup {
                        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                        message: err.to_string(),
                    });
                }
            }
        }

        let end = doc.nodes.len();
        for open in stack {
            doc.nodes[open].subtree_end = end;
        }

        if doc.nodes.is_empty() {
            return Err(IxbrlError::EmptyDocument);
        }
        Ok(doc)
    }

    fn open(&mut self, start: &BytesStart<'_>, parent: Option<usize>) -> usize {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
        let attributes = start
            .html_attributes()
            .with_checks(false)
            .filter_map(|attr| attr.ok())
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
                let value = unescape(&String::from_utf8_lossy(&attr.value));
                (key, value)
            })
            .collect();

        let index = self.nodes.len();
        self.nodes.push(Node {
            name,
            attributes,
            parent,
            children: Vec::new(),
            subtree_end: index + 1,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(Content::Element(index));
        }
        index
    }

    fn push_text(&mut self, parent: usize, text: String) {
        if !text.is_empty() {
            self.nodes[parent].children.push(Content::Text(text));
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no elements. Always false for a parsed document.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element at a document-order index.
    pub fn element(&self, index: usize) -> Option<Element<'_>> {
        (index < self.nodes.len()).then_some(Element { doc: self, index })
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        (0..self.nodes.len()).map(move |index| Element { doc: self, index })
    }

    /// Elements whose local name (prefix stripped) equals `local`, in document order.
    ///
    /// `local` must be lowercase.
    pub fn elements_named<'d>(&'d self, local: &'d str) -> impl Iterator<Item = Element<'d>> + 'd {
        self.elements().filter(move |el| el.local_name() == local)
    }
}

impl<'d> Element<'d> {
    fn node(&self) -> &'d Node {
        &self.doc.nodes[self.index]
    }

    /// Position in document order.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Lowercased qualified element name, e.g. `ix:nonfraction`.
    pub fn name(&self) -> &'d str {
        &self.node().name
    }

    /// Lowercased element name without its prefix.
    pub fn local_name(&self) -> &'d str {
        local_part(self.name())
    }

    /// Attribute value by lowercase key, prefix included (`xsi:nil`).
    pub fn attr(&self, key: &str) -> Option<&'d str> {
        self.node()
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parent element.
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|index| Self {
            doc: self.doc,
            index,
        })
    }

    /// Direct child elements.
    pub fn children(self) -> impl Iterator<Item = Element<'d>> + 'd {
        let doc = self.doc;
        self.node().children.iter().filter_map(move |c| match c {
            Content::Element(index) => Some(Element { doc, index: *index }),
            Content::Text(_) => None,
        })
    }

    /// All elements below this one, in document order.
    pub fn descendants(self) -> impl Iterator<Item = Element<'d>> + 'd {
        let doc = self.doc;
        (self.index + 1..self.node().subtree_end).map(move |index| Element { doc, index })
    }

    /// Whether `other` lies inside this element's subtree.
    pub fn contains(&self, other: &Element<'_>) -> bool {
        other.index > self.index && other.index < self.node().subtree_end
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for content in &self.node().children {
            match content {
                Content::Text(text) => out.push_str(text),
                Content::Element(index) => Element {
                    doc: self.doc,
                    index: *index,
                }
                .collect_text(out),
            }
        }
    }

    /// Text with whitespace runs collapsed to single spaces and trimmed.
    pub fn trimmed_text(&self) -> String {
        self.text().split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Local part of a qualified name (`se-gen-base:Nettoomsattning` → `Nettoomsattning`).
pub fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Prefix of a qualified name, if any.
pub fn prefix_part(qname: &str) -> Option<&str> {
    qname.split_once(':').map(|(prefix, _)| prefix)
}

fn unescape(raw: &str) -> String {
    escape::unescape_with(raw, resolve_entity)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// XML predefined entities plus the HTML ones common in Swedish filings.
fn resolve_entity(name: &str) -> Option<&'static str> {
    let resolved = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "thinsp" => "\u{2009}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "minus" => "\u{2212}",
        "aring" => "å",
        "auml" => "ä",
        "ouml" => "ö",
        "Aring" => "Å",
        "Auml" => "Ä",
        "Ouml" => "Ö",
        "eacute" => "é",
        _ => return None,
    };
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_elements_in_order() {
        let doc = Document::parse(
            r#"<html><body><div id="a"><span>one</span></div><p>two</p></body></html>"#,
        )
        .unwrap();
        let names: Vec<_> = doc.elements().map(|el| el.name()).collect();
        assert_eq!(names, vec!["html", "body", "div", "span", "p"]);

        let div = doc.element(2).unwrap();
        assert_eq!(div.attr("id"), Some("a"));
        assert_eq!(div.descendants().count(), 1);
        assert!(div.contains(&doc.element(3).unwrap()));
        assert!(!div.contains(&doc.element(4).unwrap()));
    }

    #[test]
    fn test_lowercases_names_and_attribute_keys() {
        let doc = Document::parse(
            r#"<ix:nonFraction name="se-gen-base:Nettoomsattning" contextRef="period0">1</ix:nonFraction>"#,
        )
        .unwrap();
        let el = doc.element(0).unwrap();
        assert_eq!(el.name(), "ix:nonfraction");
        assert_eq!(el.local_name(), "nonfraction");
        assert_eq!(el.attr("contextref"), Some("period0"));
        assert_eq!(el.attr("name"), Some("se-gen-base:Nettoomsattning"));
    }

    #[test]
    fn test_tolerates_void_and_unclosed_elements() {
        let doc = Document::parse("<div><br><p>text<img src=x></div><span>after</span>").unwrap();
        let div = doc.elements_named("div").next().unwrap();
        let span = doc.elements_named("span").next().unwrap();
        assert!(!div.contains(&span));
        assert_eq!(span.text(), "after");
        assert_eq!(div.trimmed_text(), "text");
    }

    #[test]
    fn test_resolves_html_entities() {
        let doc = Document::parse("<p>1&nbsp;234 &amp; Bolag&#160;AB</p>").unwrap();
        assert_eq!(doc.element(0).unwrap().text(), "1\u{a0}234 & Bolag\u{a0}AB");
    }

    #[test]
    fn test_empty_document_is_an_error() {
        assert!(matches!(
            Document::parse("just text, no markup"),
            Err(IxbrlError::EmptyDocument)
        ));
        assert!(matches!(Document::parse(""), Err(IxbrlError::EmptyDocument)));
    }

    #[test]
    fn test_unterminated_markup_is_an_error() {
        let result = Document::parse("<html><body><p>x</p><!-- never closed");
        assert!(matches!(result, Err(IxbrlError::Markup { .. })));
    }

    #[test]
    fn test_qname_parts() {
        assert_eq!(local_part("se-gen-base:AretsResultat"), "AretsResultat");
        assert_eq!(local_part("AretsResultat"), "AretsResultat");
        assert_eq!(prefix_part("se-gen-base:AretsResultat"), Some("se-gen-base"));
        assert_eq!(prefix_part("AretsResultat"), None);
    }
}
