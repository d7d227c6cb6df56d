//! Minimal element tree used as the protocol document.
//!
//! Only what the protocol needs is modelled: named elements, attributes in
//! insertion order and nested child elements. Text content, comments and
//! processing instructions are dropped on parse.
//!
//! ```
//! use horizon_proptree_core::xml::{Document, Element};
//!
//! let mut root = Element::new("Parameter");
//! root.set_attribute("Name", "gain");
//! root.push_child(Element::new("VecX"));
//!
//! let text = Document::new(root).to_xml_string();
//! let parsed = Document::parse(&text).unwrap();
//! assert_eq!(parsed.root().attribute("Name"), Some("gain"));
//! assert_eq!(parsed.root().child_count(), 1);
//! ```

use std::fmt;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ProtocolError, ProtocolResult};

// ============================================================================
// Document
// ============================================================================

/// A document with exactly one root element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wrap a root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Parse a document from XML text.
    pub fn parse(text: &str) -> ProtocolResult<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(start) => {
                    let element = element_from_start(&start)?;
                    stack.push(element);
                }
                Event::Empty(empty) => {
                    let element = element_from_start(&empty)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        return Err(ProtocolError::Malformed("unexpected closing tag".into()));
                    };
                    attach(&mut stack, &mut root, element)?;
                }
                // Text, comments, CDATA, declarations and processing instructions
                // carry nothing the protocol reads.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ProtocolError::Malformed(format!(
                "element '{}' is never closed",
                open.name()
            )));
        }
        root.map(Document::new)
            .ok_or_else(|| ProtocolError::Malformed("document has no root element".into()))
    }

    /// Serialize without indentation.
    pub fn to_xml_string(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    /// Serialize with two-space indentation.
    pub fn to_xml_string_pretty(&self) -> String {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) {
        let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        self.root.write_to(writer);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}

// ============================================================================
// Element
// ============================================================================

/// A named element with ordered attributes and child elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Gets an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    // ========================================================================
    // Children
    // ========================================================================

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            let _ = writer.write_event(Event::Empty(start));
        } else {
            let _ = writer.write_event(Event::Start(start));
            for child in &self.children {
                child.write_to(writer);
            }
            let _ = writer.write_event(Event::End(BytesEnd::new(self.name.as_str())));
        }
    }
}

// ============================================================================
// Internal Parsing
// ============================================================================

fn element_from_start(start: &BytesStart<'_>) -> ProtocolResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> ProtocolResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ProtocolError::Malformed(format!(
                "second root element '{}'",
                element.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse(
            r#"<?xml version="1.0"?>
            <Parameter Name="root" ID="1">
                <Parameter Name="child" ID="2"/>
                <Parameter Name="other" ID="3"></Parameter>
            </Parameter>"#,
        )
        .unwrap();
        assert_eq!(doc.root().name(), "Parameter");
        assert_eq!(doc.root().attribute("ID"), Some("1"));
        assert_eq!(doc.root().child_count(), 2);
        assert_eq!(doc.root().children()[1].attribute("Name"), Some("other"));
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let element = Element::new("Parameter")
            .with_attribute("Name", "x")
            .with_attribute("Enable", 1)
            .with_attribute("Type", 4);
        let keys: Vec<_> = element.attributes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Name", "Enable", "Type"]);
        assert_eq!(
            Document::new(element).to_xml_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Parameter Name="x" Enable="1" Type="4"/>"#
        );
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut element = Element::new("e").with_attribute("a", 1);
        element.set_attribute("a", 2);
        assert_eq!(element.attribute("a"), Some("2"));
        assert_eq!(element.attributes().count(), 1);
        assert_eq!(element.remove_attribute("a"), Some("2".to_string()));
        assert!(!element.has_attribute("a"));
    }

    #[test]
    fn test_escaped_values_round_trip() {
        let element = Element::new("Parameter").with_attribute("Name", "a<b & \"c\"");
        let text = Document::new(element).to_xml_string_pretty();
        let parsed = Document::parse(&text).unwrap();
        assert_eq!(parsed.root().attribute("Name"), Some("a<b & \"c\""));
    }

    #[test]
    fn test_parse_rejects_two_roots() {
        let err = Document::parse("<a/><b/>").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        let err = Document::parse("   ").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_unclosed_element() {
        assert!(Document::parse("<a><b/>").is_err());
    }
}
