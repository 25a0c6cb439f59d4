//! Cryptographic algorithm definitions.
//!
//! SAML deployments still meet IdPs that only accept SHA-1 based signatures,
//! so SHA-1 is available here but reported as deprecated.

use thiserror::Error;

/// Minimum accepted RSA modulus size in bits.
pub const MIN_RSA_BITS: usize = 2048;

/// Error type for algorithm operations.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Unknown algorithm.
    #[error("unknown algorithm: {0}")]
    Unknown(String),

    /// Key size too small.
    #[error("key size {0} bits is below the minimum of {1} bits")]
    KeySizeTooSmall(usize, usize),
}

/// Digest algorithms usable for XML signature references and RSA signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 (deprecated, interoperability only).
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns the algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Returns true for SHA-1.
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::Sha1)
    }

    /// Parses an algorithm name such as `SHA-256` or `sha256`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, AlgorithmError> {
        match name.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(AlgorithmError::Unknown(name.to_string())),
        }
    }
}

/// Validates that an RSA modulus is large enough for signing.
///
/// ## Errors
///
/// Returns an error if the key size is below [`MIN_RSA_BITS`].
pub const fn validate_rsa_key_size(bits: usize) -> Result<(), AlgorithmError> {
    if bits < MIN_RSA_BITS {
        return Err(AlgorithmError::KeySizeTooSmall(bits, MIN_RSA_BITS));
    }
    Ok(())
}
