//! A small, forgiving element tree for metadata documents.
//!
//! Documents are tokenized with [quick_xml] into a tree owned by the caller.
//! Elements are matched on their qualified name exactly as written, so no
//! namespace declarations are needed and an undeclared prefix in one entry
//! doesn't stop the rest of the document from being read. Mismatched end
//! tags and unknown entity references are tolerated. Only input that can't be
//! tokenized at all, or that holds no element, is an error.
use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Prefix metadata elements are expected to be written under.
pub const METADATA_PREFIX: &str = "md";
/// Prefix XML digital signature elements are expected to be written under.
pub const DSIG_PREFIX: &str = "ds";

/// A `prefix:name` element name, e.g. `md:EntityDescriptor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName {
    pub prefix: &'static str,
    pub local: &'static str,
}

impl QName {
    pub const fn new(prefix: &'static str, local: &'static str) -> Self {
        Self { prefix, local }
    }

    /// Check whether `element` was written as `prefix:local`.
    pub fn matches(&self, element: &Element) -> bool {
        let data = element.data();
        data.prefix == self.prefix && data.local == self.local
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

pub const ENTITY_DESCRIPTOR: QName = QName::new(METADATA_PREFIX, "EntityDescriptor");
pub const SINGLE_SIGN_ON_SERVICE: QName = QName::new(METADATA_PREFIX, "SingleSignOnService");
pub const SINGLE_LOGOUT_SERVICE: QName = QName::new(METADATA_PREFIX, "SingleLogoutService");
pub const X509_CERTIFICATE: QName = QName::new(DSIG_PREFIX, "X509Certificate");

/// Why a document couldn't be read at all.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("document has no root element")]
    NoRootElement,
}

#[derive(Debug)]
struct ElementData {
    prefix: String,
    local: String,
    /// Attributes keyed by their name as written, e.g. `entityID`.
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
    /// One past the index of the element's last descendant.
    end: usize,
}

impl ElementData {
    fn new(qualified: &str) -> Self {
        let (prefix, local) = match qualified.find(':') {
            Some(i) => (&qualified[..i], &qualified[i + 1..]),
            None => ("", qualified),
        };
        ElementData {
            prefix: prefix.to_owned(),
            local: local.to_owned(),
            attributes: Vec::new(),
            children: Vec::new(),
            end: 0,
        }
    }

    fn qualified(&self) -> String {
        if self.prefix.is_empty() {
            self.local.clone()
        } else {
            format!("{}:{}", self.prefix, self.local)
        }
    }
}

#[derive(Debug)]
enum Child {
    Element(usize),
    Text(String),
}

/// A parsed document.
///
/// Elements are stored in document order with the document node at index 0,
/// so an element's descendants are the contiguous run after it.
#[derive(Debug)]
pub struct Document {
    elements: Vec<ElementData>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Document, ParseError> {
        let mut reader = quick_xml::Reader::from_str(text);
        reader.trim_text(false).check_end_names(false);

        let mut elements = vec![ElementData::new("")];
        let mut open: Vec<usize> = vec![0];

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let id = push_element(&mut elements, &open, &start);
                    open.push(id);
                }
                Event::Empty(start) => {
                    let id = push_element(&mut elements, &open, &start);
                    elements[id].end = id + 1;
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    // Close up to the nearest open element with this name; a
                    // stray end tag is ignored.
                    if let Some(depth) = open
                        .iter()
                        .skip(1)
                        .rposition(|&id| elements[id].qualified() == name)
                    {
                        close(&mut elements, &mut open, depth + 1);
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    push_text(&mut elements, &open, value);
                }
                Event::CData(cdata) => {
                    push_text(&mut elements, &open, String::from_utf8_lossy(&cdata).into_owned());
                }
                Event::Eof => break,
                _ => {}
            }
        }
        close(&mut elements, &mut open, 1);
        elements[0].end = elements.len();

        if elements.len() == 1 {
            return Err(ParseError::NoRootElement);
        }
        Ok(Document { elements })
    }

    /// The document node, parent of the root element.
    pub fn root(&self) -> Element<'_> {
        Element { doc: self, id: 0 }
    }
}

fn push_element(elements: &mut Vec<ElementData>, open: &[usize], start: &BytesStart) -> usize {
    let mut data = ElementData::new(&String::from_utf8_lossy(start.name().as_ref()));
    // A malformed attribute only loses that attribute.
    for attribute in start.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned());
        data.attributes.push((key, value));
    }

    let id = elements.len();
    let parent = open.last().copied().unwrap_or(0);
    elements.push(data);
    elements[parent].children.push(Child::Element(id));
    id
}

fn push_text(elements: &mut [ElementData], open: &[usize], text: String) {
    let parent = open.last().copied().unwrap_or(0);
    elements[parent].children.push(Child::Text(text));
}

/// Pop open elements until only `depth` remain, marking where each ends.
fn close(elements: &mut [ElementData], open: &mut Vec<usize>, depth: usize) {
    let end = elements.len();
    while open.len() > depth {
        if let Some(id) = open.pop() {
            elements[id].end = end;
        }
    }
}

/// A borrowed element of a [Document].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: usize,
}

impl<'a> Element<'a> {
    fn data(&self) -> &'a ElementData {
        &self.doc.elements[self.id]
    }

    /// This element followed by all its descendants, in document order.
    pub fn descendants(self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        (self.id..self.data().end).map(move |id| Element { doc, id })
    }
}

/// All elements below (and including) `root` named `name`, in document order.
pub fn elements<'a>(root: Element<'a>, name: QName) -> impl Iterator<Item = Element<'a>> + 'a {
    root.descendants().filter(move |element| name.matches(element))
}

/// First element strictly below `element` named `name`.
pub fn first_nested<'a>(element: Element<'a>, name: QName) -> Option<Element<'a>> {
    element.descendants().skip(1).find(|e| name.matches(e))
}

/// Value of the attribute written as `attr` on `element`, if present.
pub fn attribute<'a>(element: Element<'a>, attr: &str) -> Option<&'a str> {
    element
        .data()
        .attributes
        .iter()
        .find(|(key, _)| key == attr)
        .map(|(_, value)| value.as_str())
}

/// Concatenated text content of `element`, empty if it has none.
///
/// Certificates are sometimes split over several text nodes (e.g. around
/// comments or CDATA sections) so every descendant text node is joined.
pub fn text_content(element: Element) -> String {
    let mut text = String::new();
    collect_text(element.doc, element.id, &mut text);
    text
}

fn collect_text(doc: &Document, id: usize, text: &mut String) {
    for child in &doc.elements[id].children {
        match child {
            Child::Text(t) => text.push_str(t),
            Child::Element(child) => collect_text(doc, *child, text),
        }
    }
}
