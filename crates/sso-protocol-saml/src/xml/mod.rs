//! Minimal XML element tree.
//!
//! SAML messages are assembled as a tree of [`Element`]s and only turned into
//! text by [`to_xml_string`] (document form, attributes in insertion order)
//! or [`c14n::canonicalize`] (exclusive canonical form, used for digests).
//! Values are stored unescaped; both writers escape them.

pub mod c14n;
mod reader;
mod writer;

use std::borrow::Cow;
use std::collections::BTreeMap;

pub use reader::parse;
pub use writer::to_xml_string;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// In-scope namespace bindings, keyed by prefix (`""` is the default namespace).
pub type NamespaceMap = BTreeMap<String, String>;

/// A namespace declaration (`xmlns` or `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Declared prefix, empty for the default namespace.
    pub prefix: String,
    /// Namespace URI.
    pub uri: String,
}

/// An attribute with an optional prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    prefix: Option<String>,
    local_name: String,
    /// Unescaped value.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a possibly prefixed name.
    #[must_use]
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        let (prefix, local_name) = split_name(name);
        Self {
            prefix,
            local_name,
            value: value.into(),
        }
    }

    /// Returns the prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the name as written, `prefix:local` or `local`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.local_name)
    }
}

/// A child node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data (unescaped).
    Text(String),
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    prefix: Option<String>,
    local_name: String,
    namespaces: Vec<Namespace>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element from a possibly prefixed name such as `saml:Issuer`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let (prefix, local_name) = split_name(name);
        Self {
            prefix,
            local_name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds a namespace declaration. Use an empty prefix for the default namespace.
    #[must_use]
    pub fn with_namespace(mut self, prefix: &str, uri: impl Into<String>) -> Self {
        self.namespaces.push(Namespace {
            prefix: prefix.to_string(),
            uri: uri.into(),
        });
        self
    }

    /// Appends an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Appends a text node.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends a child element in place.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Appends a text node in place.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Inserts a child element at `index` in the child node list.
    ///
    /// `index` is clamped to the number of children.
    pub fn insert_child(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Removes and returns the child nodes for which `predicate` holds.
    pub fn remove_children<F>(&mut self, mut predicate: F) -> Vec<Element>
    where
        F: FnMut(&Element) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in std::mem::take(&mut self.children) {
            match node {
                Node::Element(element) if predicate(&element) => removed.push(element),
                other => kept.push(other),
            }
        }
        self.children = kept;
        removed
    }

    /// Returns the prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the name as written, `prefix:local` or `local`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.local_name)
    }

    /// Returns the namespace declarations made on this element.
    #[must_use]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Returns the attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute value by its name as written.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let (prefix, local_name) = split_name(name);
        self.attributes
            .iter()
            .find(|a| a.prefix == prefix && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Returns all child nodes.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Iterates over child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Returns the first child element with the given local name.
    #[must_use]
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.local_name == local_name)
    }

    /// Returns the index in [`children`](Self::children) of the first child
    /// element with the given local name.
    #[must_use]
    pub fn child_position(&self, local_name: &str) -> Option<usize> {
        self.children.iter().position(
            |node| matches!(node, Node::Element(element) if element.local_name == local_name),
        )
    }

    /// Returns the concatenated direct text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Resolves this element's namespace URI given the bindings in scope at its parent.
    #[must_use]
    pub fn namespace_uri(&self, parent_scope: &NamespaceMap) -> Option<String> {
        let scope = self.scope(parent_scope);
        scope.get(self.prefix.as_deref().unwrap_or("")).cloned()
    }

    /// Returns the bindings in scope on this element.
    #[must_use]
    pub fn scope(&self, parent_scope: &NamespaceMap) -> NamespaceMap {
        let mut scope = parent_scope.clone();
        for ns in &self.namespaces {
            scope.insert(ns.prefix.clone(), ns.uri.clone());
        }
        scope
    }
}

/// Returns true if every character is allowed in an XML 1.0 document.
#[must_use]
pub fn is_valid_xml_text(value: &str) -> bool {
    value.chars().all(|c| {
        matches!(c,
            '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}')
    })
}

/// Escapes character data.
///
/// `&`, `<` and `>` become entity references and carriage returns become
/// `&#xD;` so that they survive line-end normalization.
#[must_use]
pub fn escape_text(value: &str) -> Cow<'_, str> {
    escape(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Escapes an attribute value for a double-quoted attribute.
///
/// Tabs and line breaks are written as character references so that
/// attribute-value normalization leaves them intact.
#[must_use]
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

fn escape(value: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !value.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match replacement(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn split_name(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name.to_string()),
    }
}

fn qualify(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local_name}"),
        None => local_name.to_string(),
    }
}
