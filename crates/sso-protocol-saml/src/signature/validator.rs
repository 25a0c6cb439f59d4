//! XML Signature validation.
//!
//! Checks enveloped signatures on SAML documents and detached
//! HTTP-Redirect signatures against a set of trusted certificates.

use base64::Engine;

use crate::document::SignedAuthnRequest;
use crate::error::{SamlError, SamlResult};
use crate::types::{transform_algorithms, XMLDSIG_NS};
use crate::xml::{self, c14n, Element, NamespaceMap};

use super::{
    decode_base64_lenient, CanonicalizationAlgorithm, DigestAlgorithm, SignatureAlgorithm,
    SigningCertificate, XmlSignature,
};

/// XML signature validator.
///
/// Validates signatures on SAML documents using configured trusted certificates.
/// An embedded `ds:X509Certificate` is only used when it is one of them.
#[derive(Debug, Clone)]
pub struct XmlSignatureValidator {
    trusted: Vec<SigningCertificate>,
    allow_sha1: bool,
}

impl XmlSignatureValidator {
    /// Creates a new validator with the given trusted certificates.
    #[must_use]
    pub fn new(trusted: Vec<SigningCertificate>) -> Self {
        Self {
            trusted,
            allow_sha1: false,
        }
    }

    /// Creates a validator from PEM-encoded certificates.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Certificate`] if any certificate cannot be parsed.
    pub fn from_pem(certificates_pem: &[&str]) -> SamlResult<Self> {
        let trusted = certificates_pem
            .iter()
            .map(|pem| SigningCertificate::from_pem(pem))
            .collect::<SamlResult<Vec<_>>>()?;
        Ok(Self::new(trusted))
    }

    /// Allows SHA-1 based signatures (not recommended).
    #[must_use]
    pub const fn allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    /// Parses `xml` and validates the enveloped signature on its root.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlParse`] for malformed XML,
    /// [`SamlError::UnsupportedAlgorithm`] for algorithms outside the
    /// supported set and [`SamlError::SignatureInvalid`] for anything that
    /// does not verify.
    pub fn validate(&self, xml: &str) -> SamlResult<XmlSignature> {
        let root = xml::parse(xml)?;
        self.validate_element(&root)
    }

    /// Validates the enveloped signature that is a direct child of `root`.
    ///
    /// # Errors
    ///
    /// See [`XmlSignatureValidator::validate`].
    pub fn validate_element(&self, root: &Element) -> SamlResult<XmlSignature> {
        if self.trusted.is_empty() {
            return Err(SamlError::SignatureInvalid(
                "no trusted certificates configured".to_string(),
            ));
        }

        let root_scope = root.scope(&NamespaceMap::new());
        let is_signature = |element: &Element| {
            element.local_name() == "Signature"
                && element.namespace_uri(&root_scope).as_deref() == Some(XMLDSIG_NS)
        };

        let mut signatures = root.child_elements().filter(|e| is_signature(e));
        let signature_element = signatures
            .next()
            .ok_or_else(|| SamlError::SignatureInvalid("document is not signed".to_string()))?;
        if signatures.next().is_some() {
            return Err(SamlError::SignatureInvalid(
                "document carries more than one signature".to_string(),
            ));
        }

        let signed_info = required_child(signature_element, "SignedInfo")?;
        let canonicalization =
            algorithm_of(signed_info, "CanonicalizationMethod").and_then(|uri| {
                CanonicalizationAlgorithm::from_uri(uri)
                    .ok_or_else(|| unsupported("canonicalization", uri))
            })?;
        let algorithm = algorithm_of(signed_info, "SignatureMethod").and_then(|uri| {
            SignatureAlgorithm::from_uri(uri).ok_or_else(|| unsupported("signature", uri))
        })?;
        let hash = algorithm.rsa_hash()?;

        let mut references = signed_info
            .child_elements()
            .filter(|e| e.local_name() == "Reference");
        let reference = references.next().ok_or_else(|| missing("Reference"))?;
        if references.next().is_some() {
            return Err(SamlError::SignatureInvalid(
                "signature has more than one reference".to_string(),
            ));
        }

        let reference_uri = reference.attribute("URI").unwrap_or_default().to_string();
        let root_id = root.attribute("ID").unwrap_or_default();
        if root_id.is_empty() || reference_uri != format!("#{root_id}") {
            return Err(SamlError::SignatureInvalid(format!(
                "reference '{reference_uri}' does not point at the signed element"
            )));
        }
        check_transforms(reference)?;

        let digest = algorithm_of(reference, "DigestMethod").and_then(|uri| {
            DigestAlgorithm::from_uri(uri).ok_or_else(|| unsupported("digest", uri))
        })?;

        if (algorithm.is_deprecated() || digest.is_deprecated()) && !self.allow_sha1 {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 signatures are not allowed".to_string(),
            ));
        }

        let digest_value = compact(&required_child(reference, "DigestValue")?.text());
        let signature_value = compact(&required_child(signature_element, "SignatureValue")?.text());
        let x509_certificate = signature_element
            .find_child("KeyInfo")
            .and_then(|info| info.find_child("X509Data"))
            .and_then(|data| data.find_child("X509Certificate"))
            .map(|cert| compact(&cert.text()));

        let mut unsigned = root.clone();
        unsigned.remove_children(|e| is_signature(e));
        let computed = digest.digest_base64(c14n::canonicalize(&unsigned)?.as_bytes());
        if computed != digest_value {
            return Err(SamlError::SignatureInvalid(
                "digest value does not match the document".to_string(),
            ));
        }

        let signature_scope = signature_element.scope(&root_scope);
        let canonical_signed_info = c14n::canonicalize_in_scope(signed_info, &signature_scope)?;
        let signature_bytes = base64::engine::general_purpose::STANDARD
            .decode(&signature_value)
            .map_err(|e| SamlError::SignatureInvalid(format!("invalid signature encoding: {e}")))?;

        let candidates = self.candidates(x509_certificate.as_deref())?;
        if !verify_any(&candidates, hash, canonical_signed_info.as_bytes(), &signature_bytes) {
            return Err(SamlError::SignatureInvalid(
                "signature value does not verify".to_string(),
            ));
        }

        tracing::debug!(
            reference = %reference_uri,
            signature_algorithm = algorithm.uri(),
            "signature verified"
        );

        Ok(XmlSignature {
            algorithm,
            digest,
            canonicalization,
            reference_uri,
            digest_value,
            signature_value,
            x509_certificate,
        })
    }

    /// Validates a detached signature for HTTP-Redirect binding.
    ///
    /// `signed_query` is the exact octet string that was signed.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SignatureInvalid`] if no trusted certificate verifies it.
    pub fn validate_redirect_binding(
        &self,
        signed_query: &str,
        signature_b64: &str,
        sig_alg: &str,
    ) -> SamlResult<()> {
        let algorithm = SignatureAlgorithm::from_uri(sig_alg)
            .ok_or_else(|| unsupported("signature", sig_alg))?;
        let hash = algorithm.rsa_hash()?;

        if algorithm.is_deprecated() && !self.allow_sha1 {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 signatures are not allowed".to_string(),
            ));
        }

        let signature = base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|e| SamlError::SignatureInvalid(format!("invalid signature encoding: {e}")))?;

        let candidates: Vec<_> = self.trusted.iter().collect();
        if verify_any(&candidates, hash, signed_query.as_bytes(), &signature) {
            Ok(())
        } else {
            Err(SamlError::SignatureInvalid(
                "signature verification failed with all trusted certificates".to_string(),
            ))
        }
    }

    fn candidates(&self, embedded: Option<&str>) -> SamlResult<Vec<&SigningCertificate>> {
        let Some(embedded) = embedded else {
            return Ok(self.trusted.iter().collect());
        };

        let der = decode_base64_lenient(embedded).ok_or_else(|| {
            SamlError::SignatureInvalid("invalid embedded certificate encoding".to_string())
        })?;
        let matching: Vec<_> = self.trusted.iter().filter(|c| c.der() == der).collect();
        if matching.is_empty() {
            return Err(SamlError::SignatureInvalid(
                "embedded certificate is not trusted".to_string(),
            ));
        }
        Ok(matching)
    }
}

/// Verifies a signed request against one PEM certificate.
///
/// The serialized form is re-parsed, so this checks exactly what would be sent.
///
/// # Errors
///
/// See [`XmlSignatureValidator::validate`]; an unusable certificate is a
/// [`SamlError::Certificate`].
pub fn verify_signed_document(
    document: &SignedAuthnRequest,
    certificate_pem: &str,
) -> SamlResult<XmlSignature> {
    XmlSignatureValidator::from_pem(&[certificate_pem])?.validate(document.xml())
}

fn verify_any(
    candidates: &[&SigningCertificate],
    hash: sso_crypto::HashAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> bool {
    candidates.iter().any(|certificate| {
        certificate
            .public_key()
            .verify(hash, data, signature)
            .unwrap_or(false)
    })
}

fn check_transforms(reference: &Element) -> SamlResult<()> {
    let Some(transforms) = reference.find_child("Transforms") else {
        return Ok(());
    };

    for transform in transforms.child_elements() {
        let uri = transform.attribute("Algorithm").unwrap_or_default();
        let allowed = uri == transform_algorithms::ENVELOPED_SIGNATURE
            || CanonicalizationAlgorithm::from_uri(uri).is_some();
        if !allowed {
            return Err(unsupported("transform", uri));
        }
    }
    Ok(())
}

fn required_child<'a>(parent: &'a Element, local_name: &str) -> SamlResult<&'a Element> {
    parent.find_child(local_name).ok_or_else(|| missing(local_name))
}

fn algorithm_of<'a>(parent: &'a Element, local_name: &str) -> SamlResult<&'a str> {
    required_child(parent, local_name)?
        .attribute("Algorithm")
        .ok_or_else(|| {
            SamlError::SignatureInvalid(format!("{local_name} has no Algorithm attribute"))
        })
}

fn missing(local_name: &str) -> SamlError {
    SamlError::SignatureInvalid(format!("signature has no {local_name} element"))
}

fn unsupported(kind: &str, uri: &str) -> SamlError {
    SamlError::UnsupportedAlgorithm(format!("unsupported {kind} algorithm: {uri}"))
}

fn compact(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
