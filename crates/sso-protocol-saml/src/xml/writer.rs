//! Document serialization.

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute as RawAttribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::error::{SamlError, SamlResult};

use super::{escape_attribute, escape_text, is_valid_xml_text, Element, Node};

/// Serializes an element tree without an XML declaration.
///
/// Namespace declarations come first, then attributes in insertion order.
/// Childless elements are written in the short `<x/>` form.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] if a value contains characters that XML
/// cannot represent.
pub fn to_xml_string(root: &Element) -> SamlResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| SamlError::Encoding(format!("serialized XML is not UTF-8: {e}")))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> SamlResult<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());

    for ns in element.namespaces() {
        let key = if ns.prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", ns.prefix)
        };
        push_attribute(&mut start, &key, &ns.uri)?;
    }
    for attribute in element.attributes() {
        push_attribute(&mut start, &attribute.qualified_name(), &attribute.value)?;
    }

    if element.children().is_empty() {
        return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => {
                check_chars(text)?;
                write_event(writer, Event::Text(BytesText::from_escaped(escape_text(text))))?;
            }
        }
    }
    write_event(writer, Event::End(BytesEnd::new(name.as_str())))
}

fn push_attribute(start: &mut BytesStart<'_>, key: &str, value: &str) -> SamlResult<()> {
    check_chars(value)?;
    let escaped = escape_attribute(value).into_owned();
    start.push_attribute(RawAttribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    });
    Ok(())
}

fn check_chars(value: &str) -> SamlResult<()> {
    if is_valid_xml_text(value) {
        Ok(())
    } else {
        Err(SamlError::Encoding(
            "value contains characters not allowed in XML".to_string(),
        ))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> SamlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| SamlError::Encoding(format!("XML write failed: {e}")))
}
