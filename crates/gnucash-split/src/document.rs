//! A small owned XML tree.
//!
//! The ledger is loaded whole, edited in place and written back. Everything
//! that is not touched (whitespace, comments, unknown elements) survives the
//! round trip.

use std::io::{BufRead, Write};

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::namespaces::{Name, Namespaces};
use crate::{Result, SplitError};

#[derive(Debug, Clone)]
pub struct Document {
    prolog: Vec<Event<'static>>,
    root: Element,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
    name: String,
    namespace: Option<String>,
    local_name: String,
    value: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
    /// Comments, CDATA sections and processing instructions, written back as read.
    Verbatim(Event<'static>),
}

impl Document {
    pub fn read(input: impl BufRead) -> Result<Self> {
        let mut reader = NsReader::from_reader(input);
        let mut buf = Vec::new();
        let mut open: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut root = None;

        loop {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            let namespace = namespace_uri(resolved)?;
            match event {
                Event::Start(start) => open.push(Element::from_start(&reader, namespace, &start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&reader, namespace, &start)?;
                    close(&mut open, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = open
                        .pop()
                        .ok_or_else(|| SplitError::Malformed("unbalanced end tag".to_string()))?;
                    close(&mut open, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = open.last_mut() {
                        parent.children.push(Node::Text(text.unescape()?.into_owned()));
                    }
                }
                Event::Decl(_) => {}
                Event::Eof => break,
                other => match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Verbatim(other.into_owned())),
                    None if root.is_none() => prolog.push(other.into_owned()),
                    None => {}
                },
            }
            buf.clear();
        }

        if let Some(element) = open.last() {
            return Err(SplitError::Malformed(format!(
                "document ends inside <{}>",
                element.name
            )));
        }
        let root =
            root.ok_or_else(|| SplitError::Malformed("document has no root element".to_string()))?;
        Ok(Document { prolog, root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn write(&self, output: impl Write) -> Result<()> {
        let mut writer = Writer::new(output);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.get_mut().write_all(b"\n")?;
        for event in &self.prolog {
            writer.write_event(event.borrow())?;
            writer.get_mut().write_all(b"\n")?;
        }
        write_element(&mut writer, &self.root)?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

fn close(open: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(SplitError::Malformed(
                "document has more than one root element".to_string(),
            ));
        }
    }
    Ok(())
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(lossy(uri))),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(SplitError::Malformed(format!(
            "undeclared namespace prefix '{}'",
            lossy(&prefix)
        ))),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attribute in &element.attributes {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
                    text.as_str(),
                ))))?;
            }
            Node::Verbatim(event) => writer.write_event(event.borrow())?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

impl Element {
    /// Create an element from a qualified name such as `trn:id`.
    pub fn new(ns: &Namespaces, qualified: &str) -> Result<Self> {
        let name = ns.name(qualified)?;
        Ok(Element {
            name: qualified.to_string(),
            namespace: name.namespace,
            local_name: name.local,
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    fn from_start<R>(
        reader: &NsReader<R>,
        namespace: Option<String>,
        start: &BytesStart<'_>,
    ) -> Result<Self> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let (resolved, local_name) = reader.resolve_attribute(attribute.key);
            // declarations are kept as plain attributes
            let namespace = match attribute.key.as_namespace_binding() {
                Some(_) => None,
                None => namespace_uri(resolved)?,
            };
            attributes.push(Attribute {
                name: lossy(attribute.key.as_ref()),
                namespace,
                local_name: lossy(local_name.as_ref()),
                value: attribute.unescape_value()?.into_owned(),
            });
        }
        Ok(Element {
            name: lossy(start.name().as_ref()),
            namespace,
            local_name: lossy(start.local_name().as_ref()),
            attributes,
            children: Vec::new(),
        })
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_attribute(
        mut self,
        ns: &Namespaces,
        qualified: &str,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = ns.name(qualified)?;
        self.attributes.push(Attribute {
            name: qualified.to_string(),
            namespace: name.namespace,
            local_name: name.local,
            value: value.into(),
        });
        Ok(self)
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_line(child);
        self
    }

    /// Append a child on a line of its own.
    pub fn push_line(&mut self, child: Element) {
        if self.children.is_empty() {
            self.children.push(Node::Text("\n".to_string()));
        }
        self.children.push(Node::Element(child));
        self.children.push(Node::Text("\n".to_string()));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, name: &Name) -> bool {
        self.local_name == name.local && self.namespace == name.namespace
    }

    /// Text before the first child element.
    pub fn text(&self) -> Option<&str> {
        match self.children.first() {
            Some(Node::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    pub fn attribute(&self, name: &Name) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.local_name == name.local && attribute.namespace == name.namespace
            })
            .map(|attribute| attribute.value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// All descendants reached by a `/`-separated path of qualified names.
    pub fn find_all(&self, ns: &Namespaces, path: &str) -> Result<Vec<&Element>> {
        let mut found = vec![self];
        for step in path.split('/') {
            let name = ns.name(step)?;
            found = found
                .into_iter()
                .flat_map(Element::elements)
                .filter(|element| element.is(&name))
                .collect();
        }
        Ok(found)
    }

    pub fn find(&self, ns: &Namespaces, path: &str) -> Result<Option<&Element>> {
        Ok(self.find_all(ns, path)?.into_iter().next())
    }

    pub fn required(&self, ns: &Namespaces, path: &str) -> Result<&Element> {
        self.find(ns, path)?
            .ok_or_else(|| SplitError::Malformed(format!("<{}> has no <{}>", self.name, path)))
    }

    /// Text of a required descendant; an empty element yields `""`.
    pub fn required_text(&self, ns: &Namespaces, path: &str) -> Result<&str> {
        Ok(self.required(ns, path)?.text().unwrap_or_default())
    }

    pub fn optional_text(&self, ns: &Namespaces, path: &str) -> Result<Option<&str>> {
        Ok(self.find(ns, path)?.and_then(Element::text))
    }

    /// Drop the child elements `keep` rejects, along with the whitespace that
    /// followed each of them.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        let mut dropped = false;
        self.children.retain(|node| match node {
            Node::Element(element) => {
                dropped = !keep(element);
                !dropped
            }
            Node::Text(text) if dropped && text.trim().is_empty() => {
                dropped = false;
                false
            }
            _ => {
                dropped = false;
                true
            }
        });
    }

    pub fn write(&self, output: impl Write) -> Result<()> {
        write_element(&mut Writer::new(output), self)
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write(&mut output)?;
        Ok(lossy(&output))
    }
}
