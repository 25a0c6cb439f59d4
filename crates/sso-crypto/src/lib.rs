//! # sso-crypto
//!
//! Cryptographic primitives for SAML message signing.
//!
//! This crate provides the digest and RSA PKCS#1 v1.5 operations that the
//! XML signature engine in `sso-protocol-saml` builds on. It knows nothing
//! about XML: callers hand it canonical bytes and get digests or signature
//! bytes back.
//!
//! ## Algorithms
//!
//! - Digests: SHA-1 (deprecated), SHA-256, SHA-384, SHA-512
//! - Signatures: RSA PKCS#1 v1.5 over any of the digests above
//! - RSA keys must be at least 2048 bits

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod keys;
pub mod signature;

pub use algorithm::{AlgorithmError, HashAlgorithm};
pub use hash::{hash, sha1, sha256, sha384, sha512};
pub use keys::{RsaSigningKey, RsaVerifyingKey};
pub use signature::SignatureError;
