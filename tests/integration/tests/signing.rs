//! Signed AuthnRequest tests.
//!
//! Signature placement, verification and tamper detection.

use serde_json::json;
use sso_protocol_saml::signature::{
    verify_signed_document, DigestAlgorithm, SignatureAlgorithm, SignatureConfig, XmlSigner,
    XmlSignatureValidator,
};
use sso_protocol_saml::{AuthnRequest, AuthnRequestDocument, RequestOptions, SamlError, UnsignedAuthnRequest};

use crate::common::{
    self, config, config_with, find, read_tags, root_children, signing_config, SP_CERT, SP_KEY,
    SP_KEY_PKCS1,
};

fn validator() -> XmlSignatureValidator {
    XmlSignatureValidator::from_pem(&[SP_CERT]).expect("fixture certificate")
}

/// Tests that an unsigned request carries no signature.
#[test]
fn test_unsigned_has_no_signature() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&config()?, RequestOptions::default())?;

    assert!(!request.is_signed());
    assert!(!request.xml().contains("Signature"));
    Ok(())
}

/// Tests that the signature is the Issuer's immediate next sibling.
#[test]
fn test_signature_follows_issuer() -> anyhow::Result<()> {
    common::init_tracing();
    let config = config_with(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["security"]["requestedAuthnContext"] = json!(true);
        value["sp"]["credentials"] = json!({ "privateKey": common::SP_KEY, "certificate": SP_CERT });
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    assert!(request.is_signed());
    assert_eq!(
        root_children(&tags),
        [
            "saml:Issuer",
            "ds:Signature",
            "samlp:NameIDPolicy",
            "samlp:RequestedAuthnContext"
        ]
    );
    assert_eq!(tags.iter().filter(|t| t.name == "ds:Signature").count(), 1);
    assert_eq!(
        find(&tags, "ds:Reference").and_then(|t| t.attribute("URI")),
        Some(format!("#{}", request.id()).as_str())
    );
    Ok(())
}

/// Tests the algorithms and certificate written into the signature.
#[test]
fn test_signature_contents() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&signing_config()?, RequestOptions::default())?;
    let tags = read_tags(request.xml())?;

    assert_eq!(
        find(&tags, "ds:CanonicalizationMethod").and_then(|t| t.attribute("Algorithm")),
        Some("http://www.w3.org/2001/10/xml-exc-c14n#")
    );
    assert_eq!(
        find(&tags, "ds:SignatureMethod").and_then(|t| t.attribute("Algorithm")),
        Some("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256")
    );
    assert_eq!(
        find(&tags, "ds:DigestMethod").and_then(|t| t.attribute("Algorithm")),
        Some("http://www.w3.org/2001/04/xmlenc#sha256")
    );

    let certificate = find(&tags, "ds:X509Certificate").map(|t| t.text.clone());
    let expected = sso_protocol_saml::signature::SigningCertificate::from_pem(SP_CERT)?.to_base64();
    assert_eq!(certificate, Some(expected));
    Ok(())
}

/// Tests that the signed document verifies from its serialized form.
#[test]
fn test_signed_document_verifies() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&signing_config()?, RequestOptions::default())?;
    let signature = validator().validate(request.xml())?;

    assert_eq!(signature.reference_uri, format!("#{}", request.id()));
    match request.document() {
        AuthnRequestDocument::Signed(signed) => {
            verify_signed_document(signed, SP_CERT)?;
            assert_eq!(signed.signature().digest_value, signature.digest_value);
        }
        AuthnRequestDocument::Unsigned(_) => panic!("expected a signed document"),
    }
    Ok(())
}

/// Tests that signing the same content twice verifies both times.
#[test]
fn test_repeated_signing_verifies() -> anyhow::Result<()> {
    let config = config()?;
    let ids = common::fixed_id("ID_repeat");
    let clock = common::fixed_clock(9);
    let signer = XmlSigner::from_pem(SP_KEY_PKCS1, SP_CERT)?;

    let build = || {
        sso_protocol_saml::AuthnRequestBuilder::new(&config)
            .id_source(&ids)
            .clock(&clock)
            .build()
    };
    let first = build()?.sign(&signer)?;
    let second = build()?.sign(&signer)?;

    validator().validate(first.xml())?;
    validator().validate(second.xml())?;
    assert_eq!(first.signature().digest_value, second.signature().digest_value);
    Ok(())
}

/// Tests that any change to signed content breaks verification.
#[test]
fn test_tampering_is_detected() -> anyhow::Result<()> {
    let request = AuthnRequest::new(
        &signing_config()?,
        RequestOptions::default().force_authn(true),
    )?;
    let xml = request.xml();

    let tampered = [
        xml.replace(r#"ForceAuthn="true""#, r#"ForceAuthn="false""#),
        xml.replace("https://sp.example.com/acs", "https://evil.example.com/acs"),
        xml.replace(
            "nameid-format:emailAddress",
            "nameid-format:persistent",
        ),
    ];
    for xml in tampered {
        assert!(matches!(
            validator().validate(&xml),
            Err(SamlError::SignatureInvalid(_))
        ));
    }
    Ok(())
}

/// Tests that a signature only verifies with the signer's certificate.
#[test]
fn test_wrong_certificate_is_rejected() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&signing_config()?, RequestOptions::default())?;

    let empty = XmlSignatureValidator::new(Vec::new());
    assert!(empty.validate(request.xml()).is_err());
    Ok(())
}

/// Tests configured signature and digest algorithms.
#[test]
fn test_configured_algorithms() -> anyhow::Result<()> {
    let config = config_with(|value| {
        value["security"]["authnRequestsSigned"] = json!(true);
        value["security"]["signatureAlgorithm"] =
            json!("http://www.w3.org/2001/04/xmldsig-more#rsa-sha512");
        value["security"]["digestAlgorithm"] = json!("http://www.w3.org/2001/04/xmlenc#sha512");
        value["sp"]["credentials"] = json!({ "privateKey": SP_KEY, "certificate": SP_CERT });
    })?;
    let request = AuthnRequest::new(&config, RequestOptions::default())?;
    let signature = validator().validate(request.xml())?;

    assert_eq!(signature.algorithm, SignatureAlgorithm::RsaSha512);
    assert_eq!(signature.digest, DigestAlgorithm::Sha512);
    Ok(())
}

/// Tests that SHA-1 signatures are produced but need opting in to verify.
#[test]
fn test_sha1_signing() -> anyhow::Result<()> {
    let signer = XmlSigner::from_pem(SP_KEY, SP_CERT)?
        .with_config(SignatureConfig::with_algorithm(SignatureAlgorithm::RsaSha1));
    let signed =
        UnsignedAuthnRequest::build(&config()?, RequestOptions::default())?.sign(&signer)?;

    assert!(validator().validate(signed.xml()).is_err());
    let signature = validator().allow_sha1(true).validate(signed.xml())?;
    assert_eq!(signature.digest, DigestAlgorithm::Sha1);
    Ok(())
}
