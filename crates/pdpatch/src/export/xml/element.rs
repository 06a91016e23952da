//! A minimal element tree and its quick-xml reader and writer.
//!
//! Patches are converted to and from this tree; only element names,
//! attributes and child elements are kept. Text content is ignored.

use indexmap::IndexMap;
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};

use crate::export::Error;

/// An element with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// The first child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Write the tree as an indented document with an XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Xml`] when an event cannot be
    /// written.
    pub fn to_xml(&self, encoding: &str) -> Result<String, Error> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))?;

        let mut stack = vec![Visit::Enter(self)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(element) => {
                    let mut start = BytesStart::new(element.name.as_str());
                    for (key, value) in element.attributes() {
                        start.push_attribute((key, value));
                    }
                    if element.children.is_empty() {
                        writer.write_event(Event::Empty(start))?;
                    } else {
                        writer.write_event(Event::Start(start))?;
                        stack.push(Visit::Exit(&element.name));
                        stack.extend(element.children.iter().rev().map(Visit::Enter));
                    }
                }
                Visit::Exit(name) => {
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                }
            }
        }

        String::from_utf8(writer.into_inner()).map_err(|err| Error::Malformed(err.to_string()))
    }

    /// Read the root element of a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] for syntax errors and [`Error::Malformed`]
    /// when the document has no root element, more than one, or an
    /// unclosed element.
    pub fn from_xml(text: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text_start = true;
        reader.config_mut().trim_text_end = true;

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    close(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Malformed("unexpected closing tag".to_string()))?;
                    close(element, &mut stack, &mut root)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Malformed(format!("element `{}` is not closed", open.name)));
        }
        root.ok_or_else(|| Error::Malformed("the document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, Error> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned();
            element.attributes.insert(key, value);
        }
        Ok(element)
    }
}

enum Visit<'a> {
    Enter(&'a Element),
    Exit(&'a str),
}

/// Attach a finished element to its parent, or make it the root.
fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Error::Malformed("the document has more than one root element".to_string()));
        }
        None => *root = Some(element),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nested_elements() {
        let tree = Element::new("patch")
            .with_attribute("name", "a&b")
            .with_child(
                Element::new("canvas").with_child(Element::new("atom").with_attribute("v", "1")),
            );

        let text = tree.to_xml("utf-8").unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("<patch name=\"a&amp;b\">"));
        assert!(text.contains("<atom v=\"1\"/>"));
        assert!(text.trim_end().ends_with("</patch>"));
    }

    #[test]
    fn test_read_back_keeps_attribute_order() {
        let tree = Element::new("node")
            .with_attribute("z", "1")
            .with_attribute("a", "<2>")
            .with_child(Element::new("empty"))
            .with_child(Element::new("full").with_child(Element::new("leaf")));

        let read = Element::from_xml(&tree.to_xml("utf-8").unwrap()).unwrap();

        assert_eq!(read, tree);
        let keys: Vec<_> = read.attributes().map(|(key, _)| key).collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(read.attribute("a"), Some("<2>"));
    }

    #[test]
    fn test_reject_broken_documents() {
        assert!(matches!(Element::from_xml(""), Err(Error::Malformed(_))));
        assert!(Element::from_xml("<a>").is_err());
        assert!(matches!(Element::from_xml("<a/><b/>"), Err(Error::Malformed(_))));
        assert!(Element::from_xml("<a></b>").is_err());
    }
}
