//! RSA key handling and PKCS#1 v1.5 signing.
//!
//! Private keys are accepted as PKCS#8 or PKCS#1 (traditional) in either DER
//! or PEM form. Public keys come from a `SubjectPublicKeyInfo`, which is what
//! an X.509 certificate carries.

use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::algorithm::{validate_rsa_key_size, HashAlgorithm};
use crate::signature::SignatureError;

/// RSA private key for PKCS#1 v1.5 signing.
///
/// Holds the parsed key read-only; signing never mutates it.
#[derive(Clone)]
pub struct RsaSigningKey {
    key: RsaPrivateKey,
    key_id: String,
}

impl std::fmt::Debug for RsaSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSigningKey")
            .field("key_id", &self.key_id)
            .field("bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

impl RsaSigningKey {
    /// Creates a signing key from a DER-encoded private key.
    ///
    /// Both PKCS#8 and PKCS#1 (`RSAPrivateKey`) encodings are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be parsed or is too small.
    pub fn from_der(der: &[u8]) -> Result<Self, SignatureError> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(der))
            .map_err(|e| SignatureError::InvalidKey(format!("Invalid RSA DER key: {e}")))?;
        Self::from_key(key)
    }

    /// Creates a signing key from a PEM-encoded private key.
    ///
    /// Accepts `PRIVATE KEY` (PKCS#8) and `RSA PRIVATE KEY` (PKCS#1) blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be parsed or is too small.
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(SignatureError::InvalidKey("empty private key".to_string()));
        }

        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| SignatureError::InvalidKey(format!("Invalid RSA PEM key: {e}")))?;
        Self::from_key(key)
    }

    fn from_key(key: RsaPrivateKey) -> Result<Self, SignatureError> {
        validate_rsa_key_size(key.size() * 8)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;

        let public_key = key.to_public_key();
        let key_id = generate_key_id(&public_key);

        Ok(Self { key, key_id })
    }

    /// Returns the key ID (derived from the public modulus, safe to log).
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Returns the modulus size in bits.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        self.key.size() * 8
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> RsaVerifyingKey {
        RsaVerifyingKey {
            key: self.key.to_public_key(),
        }
    }

    /// Signs the given data with RSA PKCS#1 v1.5 over the given digest.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let key = self.key.clone();
        let signature = match algorithm {
            HashAlgorithm::Sha1 => SigningKey::<Sha1>::new(key).try_sign(data).map(|s| s.to_vec()),
            HashAlgorithm::Sha256 => {
                SigningKey::<Sha256>::new(key).try_sign(data).map(|s| s.to_vec())
            }
            HashAlgorithm::Sha384 => {
                SigningKey::<Sha384>::new(key).try_sign(data).map(|s| s.to_vec())
            }
            HashAlgorithm::Sha512 => {
                SigningKey::<Sha512>::new(key).try_sign(data).map(|s| s.to_vec())
            }
        };

        signature.map_err(|e| SignatureError::Signing(format!("RSA signing failed: {e}")))
    }
}

/// RSA public key for PKCS#1 v1.5 verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaVerifyingKey {
    key: RsaPublicKey,
}

impl RsaVerifyingKey {
    /// Creates a verifying key from a DER-encoded `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure is not an RSA public key.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, SignatureError> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| SignatureError::InvalidKey(format!("Invalid RSA public key: {e}")))?;
        Ok(Self { key })
    }

    /// Returns the key ID, identical to the one of the matching private key.
    #[must_use]
    pub fn key_id(&self) -> String {
        generate_key_id(&self.key)
    }

    /// Verifies an RSA PKCS#1 v1.5 signature.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature bytes are malformed.
    pub fn verify(
        &self,
        algorithm: HashAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, SignatureError> {
        let signature = Signature::try_from(signature)
            .map_err(|e| SignatureError::Signing(format!("Malformed RSA signature: {e}")))?;

        let key = self.key.clone();
        let valid = match algorithm {
            HashAlgorithm::Sha1 => VerifyingKey::<Sha1>::new(key).verify(data, &signature),
            HashAlgorithm::Sha256 => VerifyingKey::<Sha256>::new(key).verify(data, &signature),
            HashAlgorithm::Sha384 => VerifyingKey::<Sha384>::new(key).verify(data, &signature),
            HashAlgorithm::Sha512 => VerifyingKey::<Sha512>::new(key).verify(data, &signature),
        }
        .is_ok();

        Ok(valid)
    }
}

/// Generates a key ID from the public modulus.
fn generate_key_id(public_key: &RsaPublicKey) -> String {
    let hash = crate::sha256(&public_key.n().to_bytes_be());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&hash[..8])
}
