//! SAML error types.
//!
//! Every failure while building, signing or encoding a request maps to one
//! [`SamlError`] variant. Variants are grouped by [`ErrorCategory`] so callers
//! can tell a misconfigured deployment from a key-management problem.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Required setting missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Private key missing, unparseable or unusable for signing.
    #[error("signing key error: {0}")]
    SigningKey(String),

    /// Certificate unparseable or not matching the private key.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Signature or digest algorithm not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Serialization, compression or base64 failure.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// XML signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// XML signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),
}

/// Coarse classification of [`SamlError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The settings handed to the library are wrong.
    Configuration,
    /// Keys, certificates, algorithms or signatures.
    Cryptographic,
    /// Serialization and transport encoding.
    Encoding,
}

impl SamlError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::SigningKey(_)
            | Self::Certificate(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::SignatureCreation(_)
            | Self::SignatureInvalid(_) => ErrorCategory::Cryptographic,
            Self::Encoding(_) | Self::XmlParse(_) => ErrorCategory::Encoding,
        }
    }

    /// Returns true for errors about key material, certificates or algorithms.
    #[must_use]
    pub const fn is_cryptographic(&self) -> bool {
        matches!(self.category(), ErrorCategory::Cryptographic)
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(format!("base64 decode error: {err}"))
    }
}

impl From<sso_crypto::SignatureError> for SamlError {
    fn from(err: sso_crypto::SignatureError) -> Self {
        use sso_crypto::SignatureError;

        match err {
            SignatureError::InvalidKey(msg) => Self::SigningKey(msg),
            SignatureError::Signing(msg) => Self::SignatureCreation(msg),
            SignatureError::Verification => {
                Self::SignatureInvalid("signature verification failed".to_string())
            }
            SignatureError::UnsupportedAlgorithm(msg) => Self::UnsupportedAlgorithm(msg),
        }
    }
}
