//! Parsing serialized documents back into element trees.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};

use super::Element;

/// Parses a document into its root element.
///
/// Comments, processing instructions and the XML declaration are dropped,
/// which matches what exclusive canonicalization without comments sees.
/// Character data is kept as written, including whitespace between elements.
///
/// # Errors
///
/// Returns [`SamlError::XmlParse`] for malformed documents, text outside the
/// root element or more than one root element.
pub fn parse(xml: &str) -> SamlResult<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SamlError::XmlParse("unexpected end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text.into_owned()),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(SamlError::XmlParse(
                            "character data outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| SamlError::XmlParse(format!("CDATA is not UTF-8: {e}")))?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text),
                    None => {
                        return Err(SamlError::XmlParse(
                            "CDATA outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(SamlError::XmlParse("unclosed element".to_string()));
    }
    root.ok_or_else(|| SamlError::XmlParse("document has no root element".to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> SamlResult<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| SamlError::XmlParse(format!("element name is not UTF-8: {e}")))?
        .to_string();
    let mut element = Element::new(&name);

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| SamlError::XmlParse(format!("attribute name is not UTF-8: {e}")))?
            .to_string();
        let value = attribute.unescape_value()?.into_owned();

        element = if key == "xmlns" {
            element.with_namespace("", value)
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            element.with_namespace(prefix, value)
        } else {
            element.with_attribute(&key, value)
        };
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> SamlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(SamlError::XmlParse("more than one root element".to_string()));
    }
    *root = Some(element);
    Ok(())
}
