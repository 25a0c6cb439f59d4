//! XML Signature support for SAML.
//!
//! This module provides enveloped XML Digital Signature (XML-DSig) support
//! for SAML messages, plus the detached query-string signature of the
//! HTTP-Redirect binding.
//!
//! # Signing Algorithms
//!
//! The following signature algorithms are supported:
//! - RSA-SHA256 (recommended)
//! - RSA-SHA384
//! - RSA-SHA512
//! - RSA-SHA1 (legacy IdPs only)
//!
//! ECDSA algorithm URIs are recognized but rejected as unsupported.
//! Digests are chosen independently of the signature algorithm.

mod certificate;
mod signer;
mod validator;

pub use certificate::*;
pub use signer::*;
pub use validator::*;

use base64::Engine;
use sso_crypto::HashAlgorithm;

use crate::error::{SamlError, SamlResult};
use crate::types::{canonicalization_algorithms, digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
    /// Legacy RSA with SHA-1 (not recommended).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::EcdsaSha256 => signature_algorithms::ECDSA_SHA256,
            Self::EcdsaSha384 => signature_algorithms::ECDSA_SHA384,
            Self::EcdsaSha512 => signature_algorithms::ECDSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Returns the digest algorithm conventionally paired with this one.
    #[must_use]
    pub const fn default_digest(&self) -> DigestAlgorithm {
        match self {
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 => DigestAlgorithm::Sha512,
            Self::RsaSha1 => DigestAlgorithm::Sha1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            signature_algorithms::ECDSA_SHA384 => Some(Self::EcdsaSha384),
            signature_algorithms::ECDSA_SHA512 => Some(Self::EcdsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns true if this algorithm uses RSA.
    #[must_use]
    pub const fn is_rsa(&self) -> bool {
        matches!(
            self,
            Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 | Self::RsaSha1
        )
    }

    /// Returns true if this algorithm uses ECDSA.
    #[must_use]
    pub const fn is_ecdsa(&self) -> bool {
        matches!(
            self,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512
        )
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }

    /// Returns the hash for RSA PKCS#1 v1.5 signing.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnsupportedAlgorithm`] for ECDSA algorithms.
    pub fn rsa_hash(&self) -> SamlResult<HashAlgorithm> {
        match self {
            Self::RsaSha1 => Ok(HashAlgorithm::Sha1),
            Self::RsaSha256 => Ok(HashAlgorithm::Sha256),
            Self::RsaSha384 => Ok(HashAlgorithm::Sha384),
            Self::RsaSha512 => Ok(HashAlgorithm::Sha512),
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => {
                Err(SamlError::UnsupportedAlgorithm(format!(
                    "ECDSA signatures are not supported: {}",
                    self.uri()
                )))
            }
        }
    }
}

/// Digest algorithm selection for signature references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// Legacy SHA-1 (not recommended).
    Sha1,
    /// SHA-256 (recommended).
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the URI for this digest algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Sha1 => digest_algorithms::SHA1,
            Self::Sha256 => digest_algorithms::SHA256,
            Self::Sha384 => digest_algorithms::SHA384,
            Self::Sha512 => digest_algorithms::SHA512,
        }
    }

    /// Parses a digest algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            digest_algorithms::SHA1 => Some(Self::Sha1),
            digest_algorithms::SHA256 => Some(Self::Sha256),
            digest_algorithms::SHA384 => Some(Self::Sha384),
            digest_algorithms::SHA512 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Returns the underlying hash function.
    #[must_use]
    pub const fn hash_algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha1 => HashAlgorithm::Sha1,
            Self::Sha256 => HashAlgorithm::Sha256,
            Self::Sha384 => HashAlgorithm::Sha384,
            Self::Sha512 => HashAlgorithm::Sha512,
        }
    }

    /// Returns true for SHA-1.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::Sha1)
    }

    /// Digests data and returns the base64 value for `ds:DigestValue`.
    #[must_use]
    pub fn digest_base64(&self, data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD
            .encode(sso_crypto::hash(self.hash_algorithm(), data))
    }
}

/// Canonicalization algorithm selection.
///
/// Only exclusive canonicalization is implemented. Documents built here carry
/// no comments, so both variants produce the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments (recommended).
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            _ => None,
        }
    }
}

/// XML Signature structure.
///
/// Represents the `<ds:Signature>` element in signed SAML documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlSignature {
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// The digest algorithm used for the reference.
    pub digest: DigestAlgorithm,
    /// The canonicalization algorithm used.
    pub canonicalization: CanonicalizationAlgorithm,
    /// The reference URI (`#` followed by the ID of the signed element).
    pub reference_uri: String,
    /// The digest value (base64 encoded).
    pub digest_value: String,
    /// The signature value (base64 encoded).
    pub signature_value: String,
    /// Optional X.509 certificate (base64 encoded, DER format).
    pub x509_certificate: Option<String>,
}

/// Configuration for signature creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    /// The signature algorithm to use.
    pub algorithm: SignatureAlgorithm,
    /// The digest algorithm to use.
    pub digest: DigestAlgorithm,
    /// The canonicalization algorithm to use.
    pub canonicalization: CanonicalizationAlgorithm,
    /// Whether to include the X.509 certificate in the signature.
    pub include_certificate: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self::with_algorithm(SignatureAlgorithm::RsaSha256)
    }
}

impl SignatureConfig {
    /// Creates a configuration with the given algorithm and its usual digest.
    #[must_use]
    pub const fn with_algorithm(algorithm: SignatureAlgorithm) -> Self {
        Self {
            algorithm,
            digest: algorithm.default_digest(),
            canonicalization: CanonicalizationAlgorithm::ExclusiveC14N,
            include_certificate: true,
        }
    }

    /// Sets the digest algorithm.
    #[must_use]
    pub const fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Resolves a configuration from algorithm URIs.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnsupportedAlgorithm`] for unknown URIs and for
    /// ECDSA, which RSA keys cannot produce.
    pub fn from_uris(signature_uri: &str, digest_uri: &str) -> SamlResult<Self> {
        let algorithm = SignatureAlgorithm::from_uri(signature_uri).ok_or_else(|| {
            SamlError::UnsupportedAlgorithm(format!("unknown signature algorithm: {signature_uri}"))
        })?;
        algorithm.rsa_hash()?;

        let digest = DigestAlgorithm::from_uri(digest_uri).ok_or_else(|| {
            SamlError::UnsupportedAlgorithm(format!("unknown digest algorithm: {digest_uri}"))
        })?;

        Ok(Self::with_algorithm(algorithm).digest(digest))
    }

    /// Returns true if either algorithm relies on SHA-1.
    #[must_use]
    pub const fn uses_sha1(&self) -> bool {
        self.algorithm.is_deprecated() || self.digest.is_deprecated()
    }
}

/// Extracts DER data from a PEM string.
fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let end_pos = pem.find(&end)?;
    if end_pos < start {
        return None;
    }

    decode_base64_lenient(&pem[start..end_pos])
}

/// Decodes base64 that may be wrapped over several lines.
fn decode_base64_lenient(data: &str) -> Option<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(compact).ok()
}
