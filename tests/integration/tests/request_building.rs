//! AuthnRequest construction tests.
//!
//! Document shape, option scenarios and configuration-driven content.

use serde_json::json;
use sso_protocol_saml::ids::parse_saml_time;
use sso_protocol_saml::{AuthnRequest, AuthnRequestBuilder, RequestOptions};

use crate::common::{
    self, config, config_with, find, fixed_clock, fixed_id, read_tags, root_children,
    ACS_URL, IDP_SSO_URL, SP_ENTITY_ID,
};

/// Tests the root element and its mandatory attributes.
#[test]
fn test_root_element_shape() -> anyhow::Result<()> {
    common::init_tracing();
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;
    let root = &tags[0];

    assert_eq!(root.name, "samlp:AuthnRequest");
    assert_eq!(root.attribute("xmlns:samlp"), Some("urn:oasis:names:tc:SAML:2.0:protocol"));
    assert_eq!(root.attribute("xmlns:saml"), Some("urn:oasis:names:tc:SAML:2.0:assertion"));
    assert_eq!(root.attribute_names().iter().filter(|n| **n == "ID").count(), 1);
    assert_eq!(root.attribute("ID"), Some(request.id()));
    assert_eq!(root.attribute("Version"), Some("2.0"));
    assert_eq!(root.attribute("Destination"), Some(IDP_SSO_URL));
    assert_eq!(root.attribute("AssertionConsumerServiceURL"), Some(ACS_URL));
    assert_eq!(
        root.attribute("ProtocolBinding"),
        Some("urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST")
    );

    let instant = root.attribute("IssueInstant").unwrap_or_default();
    assert_eq!(instant.len(), "2024-01-02T03:04:05Z".len());
    assert!(instant.ends_with('Z'));
    assert_eq!(parse_saml_time(instant), Some(request.issue_instant()));

    assert_eq!(find(&tags, "saml:Issuer").map(|t| t.text.as_str()), Some(SP_ENTITY_ID));
    Ok(())
}

/// Tests that attributes come out in the fixed order.
#[test]
fn test_attribute_order() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["sp"]["attributeConsumingService"] = json!({ "serviceName": "Directory" });
    })?;
    let request = AuthnRequest::new(
        &config,
        RequestOptions::default().force_authn(true).is_passive(true),
    )?;
    let tags = read_tags(request.xml())?;

    assert_eq!(
        tags[0].attribute_names(),
        [
            "xmlns:samlp",
            "xmlns:saml",
            "ID",
            "Version",
            "IssueInstant",
            "Destination",
            "ProtocolBinding",
            "AssertionConsumerServiceURL",
            "ForceAuthn",
            "IsPassive",
            "ProviderName",
            "AttributeConsumingServiceIndex",
        ]
    );
    Ok(())
}

/// Scenario a: ForceAuthn is present only when requested.
#[test]
fn test_force_authn_scenario() -> anyhow::Result<()> {
    let config = config()?;

    let forced = AuthnRequest::new(&config, RequestOptions::default().force_authn(true))?;
    assert!(forced.xml().contains(r#"ForceAuthn="true""#));

    let default = AuthnRequest::new(&config, RequestOptions::default())?;
    assert!(!default.xml().contains("ForceAuthn"));
    assert!(!default.xml().contains("IsPassive"));
    assert!(!default.xml().contains("\"false\""));

    let passive = AuthnRequest::new(&config, RequestOptions::default().is_passive(true))?;
    assert!(passive.xml().contains(r#"IsPassive="true""#));
    Ok(())
}

/// Scenario b: encrypted NameID format wins over the configured one.
#[test]
fn test_encrypted_name_id_scenario() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["security"]["wantNameIdEncrypted"] = json!(true);
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    let policy = find(&tags, "samlp:NameIDPolicy").expect("NameIDPolicy");
    assert_eq!(
        policy.attribute("Format"),
        Some("urn:oasis:names:tc:SAML:2.0:nameid-format:encrypted")
    );
    assert_eq!(policy.attribute("AllowCreate"), Some("true"));
    Ok(())
}

/// Tests the configured NameID format and turning the policy off.
#[test]
fn test_name_id_policy_option() -> anyhow::Result<()> {
    let config = config()?;

    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;
    assert_eq!(
        find(&tags, "samlp:NameIDPolicy").and_then(|t| t.attribute("Format")),
        Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
    );

    let without = AuthnRequest::new(&config, RequestOptions::default().set_name_id_policy(false))?;
    assert!(!without.xml().contains("NameIDPolicy"));
    Ok(())
}

/// Scenario c: one class reference per configured value, exact by default.
#[test]
fn test_requested_authn_context_list_scenario() -> anyhow::Result<()> {
    let kerberos = "urn:oasis:names:tc:SAML:2.0:ac:classes:Kerberos";
    let config = config_with(|value| {
        value["security"]["requestedAuthnContext"] = json!([kerberos]);
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    let context = find(&tags, "samlp:RequestedAuthnContext").expect("RequestedAuthnContext");
    assert_eq!(context.attribute("Comparison"), Some("exact"));

    let refs: Vec<_> = tags
        .iter()
        .filter(|t| t.name == "saml:AuthnContextClassRef")
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(refs, [kerberos]);
    Ok(())
}

/// Tests the boolean form and an overridden comparison.
#[test]
fn test_requested_authn_context_flag() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["security"]["requestedAuthnContext"] = json!(true);
        value["security"]["requestedAuthnContextComparison"] = json!("minimum");
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    assert_eq!(
        find(&tags, "samlp:RequestedAuthnContext").and_then(|t| t.attribute("Comparison")),
        Some("minimum")
    );
    assert_eq!(
        find(&tags, "saml:AuthnContextClassRef").map(|t| t.text.as_str()),
        Some("urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport")
    );

    let disabled = AuthnRequest::new(&common::config()?, RequestOptions::default())?;
    assert!(!disabled.xml().contains("RequestedAuthnContext"));

    let empty = config_with(|value| {
        value["security"]["requestedAuthnContext"] = json!([]);
    })?;
    let empty = AuthnRequest::new(&empty, RequestOptions::default())?;
    assert!(!empty.xml().contains("RequestedAuthnContext"));
    Ok(())
}

/// Scenario d: no attribute consuming service, no index.
#[test]
fn test_attribute_consuming_service_scenario() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;
    assert!(!request.xml().contains("AttributeConsumingServiceIndex"));

    let config = config_with(|value| {
        value["sp"]["attributeConsumingService"] = json!({ "index": 3 });
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    assert!(request.xml().contains(r#"AttributeConsumingServiceIndex="3""#));
    Ok(())
}

/// Tests the ProviderName language preference.
#[test]
fn test_provider_name_fallback() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["organization"] = json!({
            "fr-FR": { "displayname": "SP Exemple" },
            "en-US": { "displayname": "Example SP" },
            "de-DE": { "displayname": "Beispiel SP" }
        });
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    assert!(request.xml().contains(r#"ProviderName="Example SP""#));

    let config = config_with(|value| {
        value["organization"] = json!({
            "fr-FR": { "displayname": "SP Exemple" },
            "de-DE": { "displayname": "Beispiel SP" }
        });
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    assert!(request.xml().contains(r#"ProviderName="Beispiel SP""#));

    let config = config_with(|value| {
        value["organization"] = json!({});
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    assert!(!request.xml().contains("ProviderName"));
    Ok(())
}

/// Tests that user-controlled values are escaped by the serializer.
#[test]
fn test_values_are_escaped() -> anyhow::Result<()> {
    let display_name = r#"Tom & Jerry's "<SP>""#;
    let config = config_with(|value| {
        value["organization"]["en-US"]["displayname"] = json!(display_name);
        value["sp"]["entityId"] = json!("https://sp.example.com/?a=1&b=<2>");
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;

    assert!(!request.xml().contains("Jerry's \"<SP>"));
    let tags = read_tags(request.xml())?;
    assert_eq!(tags[0].attribute("ProviderName"), Some(display_name));
    assert_eq!(
        find(&tags, "saml:Issuer").map(|t| t.text.as_str()),
        Some("https://sp.example.com/?a=1&b=<2>")
    );
    Ok(())
}

/// Tests that builds with different ID and time sources differ only there.
#[test]
fn test_structure_is_independent_of_sources() -> anyhow::Result<()> {
    let config = config()?;
    let (id_a, clock_a) = (fixed_id("ID_aaaa"), fixed_clock(3));
    let (id_b, clock_b) = (fixed_id("ID_bbbb"), fixed_clock(17));

    let a = AuthnRequestBuilder::new(&config)
        .id_source(&id_a)
        .clock(&clock_a)
        .build()?;
    let b = AuthnRequestBuilder::new(&config)
        .id_source(&id_b)
        .clock(&clock_b)
        .build()?;

    assert_ne!(a.xml(), b.xml());
    let normalized = b
        .xml()
        .replace("ID_bbbb", "ID_aaaa")
        .replace("2024-01-02T17:04:05Z", "2024-01-02T03:04:05Z");
    assert_eq!(a.xml(), normalized);

    let again = AuthnRequestBuilder::new(&config)
        .id_source(&id_a)
        .clock(&clock_a)
        .build()?;
    assert_eq!(a.xml(), again.xml());
    Ok(())
}

/// Tests that the document reads back with Issuer as the first child.
#[test]
fn test_child_order() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["security"]["requestedAuthnContext"] = json!(true);
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    assert_eq!(
        root_children(&tags),
        ["saml:Issuer", "samlp:NameIDPolicy", "samlp:RequestedAuthnContext"]
    );
    Ok(())
}

/// Tests that each request gets a fresh ID.
#[test]
fn test_ids_are_unique() -> anyhow::Result<()> {
    let config = config()?;
    let ids: std::collections::HashSet<_> = (0..64)
        .map(|_| AuthnRequest::new(&config, RequestOptions::default()).map(|r| r.id().to_string()))
        .collect::<Result<_, _>>()?;
    assert_eq!(ids.len(), 64);
    Ok(())
}
