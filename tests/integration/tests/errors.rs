//! Error classification tests.
//!
//! Misconfiguration and key-management failures must be told apart.

use serde_json::json;
use sso_protocol_saml::signature::XmlSigner;
use sso_protocol_saml::{AuthnRequest, ErrorCategory, RequestOptions, SamlError};

use crate::common::{config_with, OTHER_KEY, SP_CERT, SP_KEY};

fn build(customize: impl FnOnce(&mut serde_json::Value)) -> anyhow::Result<Result<AuthnRequest, SamlError>> {
    let config = config_with(customize)?;
    Ok(AuthnRequest::new(&config, RequestOptions::default()))
}

/// Tests that missing required settings are configuration errors.
#[test]
fn test_missing_required_settings() -> anyhow::Result<()> {
    let result = build(|value| value["sp"]["entityId"] = json!(""))?;
    let error = result.expect_err("empty entity ID must fail");
    assert!(matches!(error, SamlError::Configuration(_)));
    assert_eq!(error.category(), ErrorCategory::Configuration);

    let result = build(|value| value["idp"]["singleSignOnService"]["url"] = json!(""))?;
    assert!(matches!(result, Err(SamlError::Configuration(_))));

    let result = build(|value| value["sp"]["assertionConsumerService"]["url"] = json!("  "))?;
    assert!(matches!(result, Err(SamlError::Configuration(_))));
    Ok(())
}

/// Tests an unknown authn context comparison.
#[test]
fn test_unknown_comparison() -> anyhow::Result<()> {
    let result = build(|value| {
        value["security"]["requestedAuthnContext"] = json!(true);
        value["security"]["requestedAuthnContextComparison"] = json!("sometimes");
    })?;
    assert!(matches!(result, Err(SamlError::Configuration(_))));

    let request = build(|value| {
        value["security"]["requestedAuthnContextComparison"] = json!("sometimes");
    })??;
    assert!(!request.xml().contains("RequestedAuthnContext"));
    Ok(())
}

/// Tests that signing without credentials fails instead of sending unsigned.
#[test]
fn test_signing_without_credentials() -> anyhow::Result<()> {
    let result = build(|value| value["security"]["authnRequestsSigned"] = json!(true))?;
    let error = result.expect_err("signing was requested");

    assert!(matches!(error, SamlError::SigningKey(_)));
    assert!(error.is_cryptographic());
    assert_eq!(error.category(), ErrorCategory::Cryptographic);
    Ok(())
}

/// Tests malformed key and certificate material.
#[test]
fn test_malformed_credentials() -> anyhow::Result<()> {
    let result = build(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["sp"]["credentials"] = json!({ "privateKey": "garbage", "certificate": SP_CERT });
    })?;
    assert!(matches!(result, Err(SamlError::SigningKey(_))));

    let result = build(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["sp"]["credentials"] = json!({ "privateKey": SP_KEY, "certificate": "garbage" });
    })?;
    assert!(matches!(result, Err(SamlError::Certificate(_))));
    Ok(())
}

/// Tests a certificate that belongs to another key.
#[test]
fn test_mismatched_certificate() -> anyhow::Result<()> {
    let result = build(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["sp"]["credentials"] = json!({ "privateKey": OTHER_KEY, "certificate": SP_CERT });
    })?;
    let error = result.expect_err("certificate does not match the key");

    assert!(matches!(error, SamlError::Certificate(_)));
    assert_eq!(error.category(), ErrorCategory::Cryptographic);
    Ok(())
}

/// Tests unsupported and unknown algorithm URIs.
#[test]
fn test_unsupported_algorithms() -> anyhow::Result<()> {
    for (signature, digest) in [
        (
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            "http://www.w3.org/2001/04/xmlenc#sha256",
        ),
        (
            "http://www.w3.org/2000/09/xmldsig#dsa-sha1",
            "http://www.w3.org/2001/04/xmlenc#sha256",
        ),
        (
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            "http://www.w3.org/2001/04/xmldsig-more#md5",
        ),
    ] {
        let result = build(|value| {
            value["security"]["authnRequestsSigned"] = json!(true);
            value["security"]["signatureAlgorithm"] = json!(signature);
            value["security"]["digestAlgorithm"] = json!(digest);
            value["sp"]["credentials"] = json!({ "privateKey": SP_KEY, "certificate": SP_CERT });
        })?;
        let error = result.expect_err("algorithm must be rejected");
        assert!(matches!(error, SamlError::UnsupportedAlgorithm(_)), "{error}");
        assert_eq!(error.category(), ErrorCategory::Cryptographic);
    }
    Ok(())
}

/// Tests that unsigned requests never need credentials.
#[test]
fn test_unsigned_ignores_credentials() -> anyhow::Result<()> {
    let request = build(|value| {
        value["sp"]["credentials"] = json!({ "privateKey": "garbage", "certificate": "garbage" });
    })??;
    assert!(!request.is_signed());
    Ok(())
}

/// Tests that a signer cannot be built from mismatched material directly.
#[test]
fn test_signer_rejects_mismatch() {
    assert!(matches!(
        XmlSigner::from_pem(OTHER_KEY, SP_CERT),
        Err(SamlError::Certificate(_))
    ));
}
