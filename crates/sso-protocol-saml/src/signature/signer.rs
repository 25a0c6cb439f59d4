//! XML Signature creation.
//!
//! Provides enveloped XML-DSig signing of SAML elements and the detached
//! query-string signature of the HTTP-Redirect binding.

use std::fmt;

use base64::Engine;
use sso_crypto::RsaSigningKey;

use crate::config::RequestConfiguration;
use crate::error::{SamlError, SamlResult};
use crate::types::{transform_algorithms, DS_PREFIX, XMLDSIG_NS};
use crate::xml::{c14n, Element, NamespaceMap};

use super::{SignatureConfig, SigningCertificate, XmlSignature};

/// XML document signer.
///
/// Holds an RSA private key and the certificate that belongs to it.
pub struct XmlSigner {
    key: RsaSigningKey,
    certificate: SigningCertificate,
    config: SignatureConfig,
}

impl fmt::Debug for XmlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlSigner")
            .field("key_id", &self.key.key_id())
            .field("certificate", &self.certificate)
            .field("config", &self.config)
            .finish()
    }
}

impl XmlSigner {
    /// Creates a signer from a key and its certificate.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Certificate`] if the certificate's public key is
    /// not the public half of `key`.
    pub fn new(key: RsaSigningKey, certificate: SigningCertificate) -> SamlResult<Self> {
        if !certificate.matches_key(&key) {
            return Err(SamlError::Certificate(format!(
                "certificate '{}' does not belong to signing key {}",
                certificate.subject(),
                key.key_id()
            )));
        }

        Ok(Self {
            key,
            certificate,
            config: SignatureConfig::default(),
        })
    }

    /// Creates a signer from a PEM private key (PKCS#8 or PKCS#1) and a PEM certificate.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SigningKey`] for an unusable key and
    /// [`SamlError::Certificate`] for an unusable or mismatched certificate.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> SamlResult<Self> {
        let key = RsaSigningKey::from_pem(private_key_pem)
            .map_err(|e| SamlError::SigningKey(e.to_string()))?;
        let certificate = SigningCertificate::from_pem(certificate_pem)?;
        Self::new(key, certificate)
    }

    /// Creates a signer from the SP credentials and security settings.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SigningKey`] when no credentials are configured,
    /// and [`SamlError::UnsupportedAlgorithm`] for unusable algorithm URIs.
    pub fn from_config(config: &RequestConfiguration) -> SamlResult<Self> {
        let credentials = config.sp.credentials.as_ref().ok_or_else(|| {
            SamlError::SigningKey("signing requires an SP private key and certificate".to_string())
        })?;
        let signature_config = SignatureConfig::from_uris(
            &config.security.signature_algorithm,
            &config.security.digest_algorithm,
        )?;

        Ok(Self::from_pem(&credentials.private_key, &credentials.certificate)?
            .with_config(signature_config))
    }

    /// Sets the signature configuration.
    #[must_use]
    pub fn with_config(mut self, config: SignatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the signature configuration.
    #[must_use]
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Returns the signing certificate.
    #[must_use]
    pub fn certificate(&self) -> &SigningCertificate {
        &self.certificate
    }

    /// Signs `root` in place with an enveloped signature.
    ///
    /// The reference points at the root's `ID` attribute. The `ds:Signature`
    /// element is inserted directly after the `Issuer` child, or first when
    /// there is none.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SignatureCreation`] if the root has no `ID` or is
    /// already signed, and [`SamlError::UnsupportedAlgorithm`] for ECDSA.
    pub fn sign_element(&self, root: &mut Element) -> SamlResult<XmlSignature> {
        let reference_id = root
            .attribute("ID")
            .ok_or_else(|| {
                SamlError::SignatureCreation("element to sign has no ID attribute".to_string())
            })?
            .to_string();
        if root.find_child("Signature").is_some() {
            return Err(SamlError::SignatureCreation(format!(
                "element '{reference_id}' is already signed"
            )));
        }

        let hash = self.config.algorithm.rsa_hash()?;
        if self.config.uses_sha1() {
            tracing::warn!(
                signature_algorithm = self.config.algorithm.uri(),
                digest_algorithm = self.config.digest.uri(),
                "signing with SHA-1, which is deprecated"
            );
        }

        // Digesting before insertion is the enveloped-signature transform.
        let canonical_root = c14n::canonicalize(root)?;
        let digest_value = self.config.digest.digest_base64(canonical_root.as_bytes());
        let reference_uri = format!("#{reference_id}");

        let signed_info = self.build_signed_info(&reference_uri, &digest_value);
        let mut scope = root.scope(&NamespaceMap::new());
        scope.insert(DS_PREFIX.to_string(), XMLDSIG_NS.to_string());
        let canonical_signed_info = c14n::canonicalize_in_scope(&signed_info, &scope)?;

        let signature_bytes = self.key.sign(hash, canonical_signed_info.as_bytes())?;
        let signature_value = base64::engine::general_purpose::STANDARD.encode(signature_bytes);
        let x509_certificate = self
            .config
            .include_certificate
            .then(|| self.certificate.to_base64());

        let signature_element =
            build_signature_element(signed_info, &signature_value, x509_certificate.as_deref());
        let position = root.child_position("Issuer").map_or(0, |index| index + 1);
        root.insert_child(position, signature_element);

        tracing::debug!(
            reference = %reference_uri,
            signature_algorithm = self.config.algorithm.uri(),
            digest_algorithm = self.config.digest.uri(),
            "signed element"
        );

        Ok(XmlSignature {
            algorithm: self.config.algorithm,
            digest: self.config.digest,
            canonicalization: self.config.canonicalization,
            reference_uri,
            digest_value,
            signature_value,
            x509_certificate,
        })
    }

    /// Creates the HTTP-Redirect query string with a detached signature.
    ///
    /// `saml_request` is the deflated, base64-encoded message. The signed
    /// octets are `SAMLRequest=..[&RelayState=..]&SigAlg=..` with each value
    /// URL-encoded; `&Signature=..` is appended to them.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnsupportedAlgorithm`] for ECDSA and
    /// [`SamlError::SignatureCreation`] if RSA signing fails.
    pub fn sign_redirect_query(
        &self,
        saml_request: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let hash = self.config.algorithm.rsa_hash()?;

        let mut query = format!("SAMLRequest={}", urlencoding::encode(saml_request));
        if let Some(relay_state) = relay_state {
            query.push_str(&format!("&RelayState={}", urlencoding::encode(relay_state)));
        }
        query.push_str(&format!(
            "&SigAlg={}",
            urlencoding::encode(self.config.algorithm.uri())
        ));

        let signature = self.key.sign(hash, query.as_bytes())?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);
        query.push_str(&format!("&Signature={}", urlencoding::encode(&signature_b64)));

        Ok(query)
    }

    fn build_signed_info(&self, reference_uri: &str, digest_value: &str) -> Element {
        let canonicalization = self.config.canonicalization.uri();

        Element::new("ds:SignedInfo")
            .with_child(
                Element::new("ds:CanonicalizationMethod")
                    .with_attribute("Algorithm", canonicalization),
            )
            .with_child(
                Element::new("ds:SignatureMethod")
                    .with_attribute("Algorithm", self.config.algorithm.uri()),
            )
            .with_child(
                Element::new("ds:Reference")
                    .with_attribute("URI", reference_uri)
                    .with_child(
                        Element::new("ds:Transforms")
                            .with_child(
                                Element::new("ds:Transform").with_attribute(
                                    "Algorithm",
                                    transform_algorithms::ENVELOPED_SIGNATURE,
                                ),
                            )
                            .with_child(
                                Element::new("ds:Transform")
                                    .with_attribute("Algorithm", canonicalization),
                            ),
                    )
                    .with_child(
                        Element::new("ds:DigestMethod")
                            .with_attribute("Algorithm", self.config.digest.uri()),
                    )
                    .with_child(Element::new("ds:DigestValue").with_text(digest_value)),
            )
    }
}

fn build_signature_element(
    signed_info: Element,
    signature_value: &str,
    x509_certificate: Option<&str>,
) -> Element {
    let mut signature = Element::new("ds:Signature")
        .with_namespace(DS_PREFIX, XMLDSIG_NS)
        .with_child(signed_info)
        .with_child(Element::new("ds:SignatureValue").with_text(signature_value));

    if let Some(certificate) = x509_certificate {
        signature.push_child(
            Element::new("ds:KeyInfo").with_child(
                Element::new("ds:X509Data")
                    .with_child(Element::new("ds:X509Certificate").with_text(certificate)),
            ),
        );
    }

    signature
}
