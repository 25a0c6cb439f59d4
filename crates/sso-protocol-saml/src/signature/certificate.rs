//! X.509 certificates used for signing and verification.

use std::fmt;

use base64::Engine;
use sso_crypto::{RsaSigningKey, RsaVerifyingKey};

use crate::error::{SamlError, SamlResult};

use super::{decode_base64_lenient, pem_to_der};

/// A parsed X.509 certificate carrying an RSA public key.
///
/// Only the parts the signature engine needs are kept: the DER bytes for
/// `ds:X509Certificate`, the public key and the subject for logging. Trust
/// chains and validity periods are not evaluated.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningCertificate {
    der: Vec<u8>,
    public_key: RsaVerifyingKey,
    subject: String,
}

impl fmt::Debug for SigningCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCertificate")
            .field("subject", &self.subject)
            .field("key_id", &self.public_key.key_id())
            .finish_non_exhaustive()
    }
}

impl SigningCertificate {
    /// Parses a PEM certificate.
    ///
    /// Bare base64 without the `BEGIN CERTIFICATE` armor, as found in SAML
    /// metadata, is accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Certificate`] if the input is empty, not base64,
    /// not a certificate or not an RSA certificate.
    pub fn from_pem(pem: &str) -> SamlResult<Self> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(SamlError::Certificate("empty certificate".to_string()));
        }

        let der = if pem.contains("-----BEGIN") {
            pem_to_der(pem, "CERTIFICATE")
        } else {
            decode_base64_lenient(pem)
        }
        .ok_or_else(|| SamlError::Certificate("invalid certificate PEM".to_string()))?;

        Self::from_der(der)
    }

    /// Parses a DER certificate.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Certificate`] if the bytes are not an RSA certificate.
    pub fn from_der(der: Vec<u8>) -> SamlResult<Self> {
        let (public_key, subject) = {
            let (_, certificate) = x509_parser::parse_x509_certificate(&der)
                .map_err(|e| SamlError::Certificate(format!("failed to parse certificate: {e}")))?;

            let public_key = RsaVerifyingKey::from_spki_der(certificate.public_key().raw)
                .map_err(|e| {
                    SamlError::Certificate(format!("certificate has no usable RSA key: {e}"))
                })?;
            (public_key, certificate.subject().to_string())
        };

        Ok(Self {
            der,
            public_key,
            subject,
        })
    }

    /// Returns the DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the DER encoding as single-line base64, the `ds:X509Certificate` form.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.der)
    }

    /// Returns the certificate's public key.
    #[must_use]
    pub fn public_key(&self) -> &RsaVerifyingKey {
        &self.public_key
    }

    /// Returns the subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns true if this certificate belongs to the given private key.
    #[must_use]
    pub fn matches_key(&self, key: &RsaSigningKey) -> bool {
        key.verifying_key() == self.public_key
    }
}
