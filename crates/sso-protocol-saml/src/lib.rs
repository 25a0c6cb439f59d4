//! SAML 2.0 AuthnRequest support for a Service Provider.
//!
//! This crate builds the authentication request an SP sends to an IdP to
//! start single sign-on:
//!
//! - **AuthnRequest construction** - From SP/IdP settings and per-request options
//! - **XML signature** - Enveloped XML-DSig signing and verification
//! - **POST and Redirect bindings** - Base64 and deflate + base64 transport encodings
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - SP, IdP and security settings
//! - [`ids`] - Request IDs and SAML timestamps
//! - [`xml`] - Element tree, serializer, reader and exclusive canonicalization
//! - [`types`] - Core SAML types and data structures
//! - [`builder`] and [`document`] - Unsigned and signed request documents
//! - [`signature`] - XML signature signing and validation
//! - [`bindings`] - POST and Redirect binding encodings
//! - [`request`] - The request handle
//! - [`error`] - Error types for SAML operations
//!
//! # Example
//!
//! ```rust,ignore
//! use sso_protocol_saml::{AuthnRequest, RequestConfiguration, RequestOptions};
//!
//! let request = AuthnRequest::new(&config, RequestOptions::default().force_authn(true))?;
//! let url = request.redirect_url(Some("/home"))?;
//! ```
//!
//! # SAML Specifications
//!
//! This implementation follows these specifications:
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod request;
pub mod signature;
pub mod types;
pub mod xml;

pub use builder::AuthnRequestBuilder;
pub use config::{RequestConfiguration, RequestOptions};
pub use document::{AuthnRequestDocument, SignedAuthnRequest, UnsignedAuthnRequest};
pub use error::{ErrorCategory, SamlError, SamlResult};
pub use request::AuthnRequest;
pub use types::*;
