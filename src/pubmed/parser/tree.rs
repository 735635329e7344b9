//! Minimal element tree over quick-xml events
//!
//! Lookups use a small subset of ElementPath syntax: `Tag`, `A/B`,
//! `.//A/B` and a trailing `[@attr='value']` predicate on any step.
//! `.//` matches descendants of the context node, never the node itself.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and mixed content
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::XmlError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::XmlError(e.to_string()))?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(XmlNode::Text(existing)) => existing.push_str(text),
            _ => self.children.push(XmlNode::Text(text.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text before the first child element, `None` if there is none
    pub fn text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// All text in this subtree, in document order
    pub fn itertext(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    fn collect_descendants<'a>(&'a self, step: &Step<'_>, out: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if step.matches(child) {
                out.push(child);
            }
            child.collect_descendants(step, out);
        }
    }

    /// Every element matching `path`, in document order
    pub fn findall(&self, path: &str) -> Vec<&XmlElement> {
        let (descendant, steps) = parse_path(path);
        let mut current: Vec<&XmlElement> = vec![self];

        for (i, step) in steps.iter().enumerate() {
            let mut next = Vec::new();
            for &element in &current {
                if i == 0 && descendant {
                    element.collect_descendants(step, &mut next);
                } else {
                    next.extend(element.child_elements().filter(|&child| step.matches(child)));
                }
            }
            current = next;
        }

        if steps.is_empty() { Vec::new() } else { current }
    }

    /// First element matching `path`
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.findall(path).into_iter().next()
    }

    /// Text of the first match; `Some("")` when that element has no text
    pub fn findtext(&self, path: &str) -> Option<&str> {
        self.find(path).map(|element| element.text().unwrap_or(""))
    }
}

#[derive(Debug, PartialEq)]
struct Step<'p> {
    tag: &'p str,
    predicate: Option<(&'p str, &'p str)>,
}

impl Step<'_> {
    fn matches(&self, element: &XmlElement) -> bool {
        if self.tag != "*" && element.name != self.tag {
            return false;
        }
        match self.predicate {
            Some((key, value)) => element.attribute(key) == Some(value),
            None => true,
        }
    }
}

fn parse_path(path: &str) -> (bool, Vec<Step<'_>>) {
    let (descendant, rest) = match path.strip_prefix(".//") {
        Some(rest) => (true, rest),
        None => (false, path.strip_prefix("./").unwrap_or(path)),
    };

    let steps = rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(parse_step)
        .collect();
    (descendant, steps)
}

fn parse_step(segment: &str) -> Step<'_> {
    let Some((tag, predicate)) = segment.split_once('[') else {
        return Step {
            tag: segment,
            predicate: None,
        };
    };

    let predicate = predicate
        .strip_suffix(']')
        .and_then(|p| p.strip_prefix('@'))
        .and_then(|p| p.split_once('='))
        .map(|(key, value)| (key, value.trim_matches(|c| c == '\'' || c == '"')));

    Step { tag, predicate }
}

/// Parse a complete document and return its root element
///
/// Mismatched closing tags, elements left open at the end of input, and
/// elements or non-blank text after the root element are all errors.
pub fn parse_document(xml: &str) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(ParseError::XmlError(
                        "junk after document element".to_string(),
                    ));
                }
                stack.push(XmlElement::from_start(e)?);
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let Some(element) = stack.pop() else {
                    return Err(ParseError::XmlError(format!(
                        "unexpected closing tag </{}>",
                        name
                    )));
                };
                if element.name != name {
                    return Err(ParseError::XmlError(format!(
                        "mismatched tag: expected </{}>, found </{}>",
                        element.name, name
                    )));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ParseError::XmlError(err.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.push_text(&text),
                    None if root.is_some() && !text.trim().is_empty() => {
                        return Err(ParseError::XmlError(
                            "junk after document element".to_string(),
                        ));
                    }
                    None => {}
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::XmlError(format!(
                    "{} at position {}",
                    e,
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::XmlError(format!("unclosed tag <{}>", open.name)));
    }

    root.ok_or_else(|| ParseError::XmlError("no element found".to_string()))
}
