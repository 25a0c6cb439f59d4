//! Exclusive XML canonicalization (without comments).
//!
//! Implements `http://www.w3.org/2001/10/xml-exc-c14n#` for element trees:
//!
//! - a namespace declaration is rendered on an element only when the element
//!   or one of its attributes uses the prefix and the nearest rendering
//!   ancestor has not already emitted the same binding
//! - declarations are sorted by prefix (default first), attributes by
//!   namespace URI then local name
//! - empty elements are written as start/end tag pairs
//! - text and attribute values use the canonical escaping rules
//!
//! No `InclusiveNamespaces` prefix list is supported.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::error::{SamlError, SamlResult};

use super::{escape_attribute, escape_text, Attribute, Element, NamespaceMap, Node, XML_NS};

/// Canonicalizes a standalone element.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] if a prefix is used without being declared.
pub fn canonicalize(element: &Element) -> SamlResult<String> {
    canonicalize_in_scope(element, &NamespaceMap::new())
}

/// Canonicalizes an element that sits inside a larger document.
///
/// `inherited` holds the namespace bindings in scope at the element's parent.
/// Exclusive canonicalization only consults them to resolve prefixes; nothing
/// from the ancestors is copied unless the subtree uses it.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] if a prefix is used without being declared.
pub fn canonicalize_in_scope(element: &Element, inherited: &NamespaceMap) -> SamlResult<String> {
    let mut out = String::new();
    write_element(element, inherited, &NamespaceMap::new(), &mut out)?;
    Ok(out)
}

fn write_element(
    element: &Element,
    parent_scope: &NamespaceMap,
    rendered: &NamespaceMap,
    out: &mut String,
) -> SamlResult<()> {
    let scope = element.scope(parent_scope);

    let mut utilized = BTreeSet::new();
    utilized.insert(element.prefix().unwrap_or(""));
    for attribute in element.attributes() {
        match attribute.prefix() {
            Some("xml") | None => {}
            Some(prefix) => {
                utilized.insert(prefix);
            }
        }
    }

    let mut rendered_here = rendered.clone();
    let mut declarations = Vec::new();
    for prefix in utilized {
        let uri = match scope.get(prefix) {
            Some(uri) => uri.as_str(),
            None if prefix.is_empty() => "",
            None => return Err(undeclared(prefix)),
        };

        let current = rendered.get(prefix).map(String::as_str);
        let needed = if prefix.is_empty() {
            current.unwrap_or("") != uri
        } else {
            current != Some(uri)
        };

        if needed {
            declarations.push((prefix, uri));
            rendered_here.insert(prefix.to_string(), uri.to_string());
        }
    }

    let mut attributes = element
        .attributes()
        .iter()
        .map(|attribute| -> SamlResult<_> {
            Ok((attribute_namespace(attribute, &scope)?, attribute))
        })
        .collect::<SamlResult<Vec<_>>>()?;
    attributes.sort_by(|(a_ns, a), (b_ns, b)| {
        a_ns.cmp(b_ns).then_with(|| a.local_name().cmp(b.local_name()))
    });

    let name = element.qualified_name();
    out.push('<');
    out.push_str(&name);
    for (prefix, uri) in declarations {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            let _ = write!(out, " xmlns:{prefix}=\"");
        }
        out.push_str(&escape_attribute(uri));
        out.push('"');
    }
    for (_, attribute) in attributes {
        let _ = write!(
            out,
            " {}=\"{}\"",
            attribute.qualified_name(),
            escape_attribute(&attribute.value)
        );
    }
    out.push('>');

    for child in element.children() {
        match child {
            Node::Element(child) => write_element(child, &scope, &rendered_here, out)?,
            Node::Text(text) => out.push_str(&escape_text(text)),
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
    Ok(())
}

fn attribute_namespace<'a>(attribute: &Attribute, scope: &'a NamespaceMap) -> SamlResult<&'a str> {
    match attribute.prefix() {
        None => Ok(""),
        Some("xml") => Ok(XML_NS),
        Some(prefix) => scope
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| undeclared(prefix)),
    }
}

fn undeclared(prefix: &str) -> SamlError {
    SamlError::Encoding(format!("namespace prefix '{prefix}' is not declared"))
}
