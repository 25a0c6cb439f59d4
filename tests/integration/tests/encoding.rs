//! Transport encoding tests.
//!
//! POST and Redirect payloads, redirect URLs and the encode/decode round trip.

use std::io::Read;

use base64::Engine;
use flate2::read::DeflateDecoder;
use proptest::prelude::*;
use sso_protocol_saml::bindings::{self, HttpPostBinding, HttpRedirectBinding};
use sso_protocol_saml::signature::{XmlSigner, XmlSignatureValidator};
use sso_protocol_saml::{AuthnRequest, RequestOptions, SamlBinding};

use crate::common::{config, read_tags, signing_config, IDP_SSO_URL, SP_CERT, SP_KEY};

/// Tests that the Redirect payload is raw DEFLATE under base64.
#[test]
fn test_redirect_payload_inflates_to_xml() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;
    let payload = request.encoded(true)?;

    let compressed = base64::engine::general_purpose::STANDARD.decode(&payload)?;
    let mut xml = String::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut xml)?;

    assert_eq!(xml, request.xml());
    assert_eq!(
        payload,
        bindings::encode_for_binding(request.xml(), SamlBinding::HttpRedirect)?
    );
    Ok(())
}

/// Tests that the POST payload is plain base64 of the XML.
#[test]
fn test_post_payload_is_base64() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&signing_config()?, RequestOptions::default())?;
    let payload = request.encoded(false)?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(&payload)?;
    assert_eq!(bytes, request.xml().as_bytes());
    assert_eq!(HttpPostBinding::encode_request(request.xml())?, payload);
    assert_eq!(HttpPostBinding::decode(Some(&payload), None)?.xml, request.xml());
    Ok(())
}

/// Tests the redirect URL through a real URL parser.
#[test]
fn test_redirect_url_parses() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;
    let relay_state = "https://sp.example.com/app?page=1&sort=name";
    let redirect = request.redirect_url(Some(relay_state))?;

    let url = url::Url::parse(&redirect)?;
    assert_eq!(
        format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or_default(), url.path()),
        IDP_SSO_URL
    );

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, "SAMLRequest");
    assert_eq!(pairs[1], ("RelayState".to_string(), relay_state.to_string()));
    assert_eq!(bindings::decode(&pairs[0].1, true)?, request.xml());

    let decoded = HttpRedirectBinding::decode_url(&redirect)?;
    assert_eq!(decoded.xml, request.xml());
    read_tags(&decoded.xml)?;
    Ok(())
}

/// Tests a detached Redirect signature over an unsigned request.
#[test]
fn test_detached_redirect_signature() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;
    let signer = XmlSigner::from_pem(SP_KEY, SP_CERT)?;
    let url = HttpRedirectBinding::encode_signed_request(
        request.xml(),
        IDP_SSO_URL,
        Some("state"),
        &signer,
    )?;

    let decoded = HttpRedirectBinding::decode_url(&url)?;
    let signed_query = HttpRedirectBinding::extract_signed_query(&url)?;
    XmlSignatureValidator::from_pem(&[SP_CERT])?.validate_redirect_binding(
        &signed_query,
        decoded.signature.as_deref().unwrap_or_default(),
        decoded.sig_alg.as_deref().unwrap_or_default(),
    )?;
    assert_eq!(decoded.xml, request.xml());
    Ok(())
}

proptest! {
    /// Round trip through both encodings for arbitrary text.
    #[test]
    fn prop_encode_decode_roundtrip(xml in "\\PC{0,512}", deflate in any::<bool>()) {
        let encoded = bindings::encode(&xml, deflate).unwrap();
        prop_assert!(!encoded.contains('\n'));
        prop_assert_eq!(bindings::decode(&encoded, deflate).unwrap(), xml);
    }

    /// Round trip for built requests with arbitrary display names.
    #[test]
    fn prop_built_request_roundtrip(name in "[a-zA-Z0-9 &<>\"']{1,40}") {
        let config = crate::common::config_with(|value| {
            value["organization"]["en-US"]["displayname"] = serde_json::json!(name);
        }).unwrap();
        let request = AuthnRequest::new(&config, RequestOptions::default()).unwrap();

        let payload = request.encoded(true).unwrap();
        prop_assert_eq!(bindings::decode(&payload, true).unwrap(), request.xml());

        let tags = read_tags(request.xml()).unwrap();
        prop_assert_eq!(tags[0].attribute("ProviderName"), Some(name.as_str()));
    }
}
