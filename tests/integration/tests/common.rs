//! Common test utilities and fixtures.

use chrono::{TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value};

use sso_protocol_saml::ids::{FixedClock, FixedIdSource};
use sso_protocol_saml::RequestConfiguration;

/// RSA-2048 private key (PKCS#8) matching [`SP_CERT`].
pub const SP_KEY: &str = include_str!("../../fixtures/sp-key.pem");

/// The same key in PKCS#1 form.
pub const SP_KEY_PKCS1: &str = include_str!("../../fixtures/sp-key-pkcs1.pem");

/// Self-signed certificate for `sp.example.com`.
pub const SP_CERT: &str = include_str!("../../fixtures/sp-cert.pem");

/// An unrelated RSA key.
pub const OTHER_KEY: &str = include_str!("../../fixtures/other-key.pem");

pub const SP_ENTITY_ID: &str = "https://sp.example.com/metadata";
pub const ACS_URL: &str = "https://sp.example.com/acs";
pub const IDP_SSO_URL: &str = "https://idp.example.com/sso";

/// Installs a test subscriber once; `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "sso_protocol_saml=debug".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Settings as the settings collaborator would hand them over.
pub fn settings() -> Value {
    json!({
        "sp": {
            "entityId": SP_ENTITY_ID,
            "assertionConsumerService": {
                "url": ACS_URL,
                "binding": "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
            },
            "NameIDFormat": "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
        },
        "idp": {
            "entityId": "https://idp.example.com/metadata",
            "singleSignOnService": { "url": IDP_SSO_URL }
        },
        "organization": {
            "en-US": { "name": "sp", "displayname": "Example SP", "url": "https://sp.example.com" }
        },
        "security": {}
    })
}

/// Parses settings after applying `customize`.
pub fn config_with(customize: impl FnOnce(&mut Value)) -> anyhow::Result<RequestConfiguration> {
    let mut value = settings();
    customize(&mut value);
    Ok(serde_json::from_value(value)?)
}

/// The default settings.
pub fn config() -> anyhow::Result<RequestConfiguration> {
    config_with(|_| {})
}

/// Settings with request signing and the fixture credentials.
pub fn signing_config() -> anyhow::Result<RequestConfiguration> {
    config_with(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["sp"]["credentials"] = json!({ "privateKey": SP_KEY, "certificate": SP_CERT });
    })
}

pub fn fixed_id(id: &str) -> FixedIdSource {
    FixedIdSource::new(id)
}

pub fn fixed_clock(hour: u32) -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 2, hour, 4, 5).unwrap())
}

/// A start or empty tag seen while reading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub depth: usize,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

impl Tag {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|(key, _)| key.as_str()).collect()
    }
}

/// Reads `xml` with quick-xml and returns every element in document order.
///
/// Fails on anything that is not well-formed.
pub fn read_tags(xml: &str) -> anyhow::Result<Vec<Tag>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut tags: Vec<Tag> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                tags.push(tag(&start, open.len())?);
                open.push(tags.len() - 1);
            }
            Event::Empty(start) => tags.push(tag(&start, open.len())?),
            Event::End(_) => {
                open.pop();
            }
            Event::Text(text) => {
                if let Some(&index) = open.last() {
                    tags[index].text.push_str(&text.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    anyhow::ensure!(open.is_empty(), "unclosed elements");
    Ok(tags)
}

fn tag(start: &quick_xml::events::BytesStart<'_>, depth: usize) -> anyhow::Result<Tag> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        attributes.push((
            String::from_utf8(attribute.key.as_ref().to_vec())?,
            attribute.unescape_value()?.into_owned(),
        ));
    }

    Ok(Tag {
        depth,
        name: String::from_utf8(start.name().as_ref().to_vec())?,
        attributes,
        text: String::new(),
    })
}

/// Returns the names of the root's direct children, in order.
pub fn root_children(tags: &[Tag]) -> Vec<&str> {
    tags.iter()
        .filter(|tag| tag.depth == 1)
        .map(|tag| tag.name.as_str())
        .collect()
}

/// Finds the first element with the given qualified name.
pub fn find<'a>(tags: &'a [Tag], name: &str) -> Option<&'a Tag> {
    tags.iter().find(|tag| tag.name == name)
}
