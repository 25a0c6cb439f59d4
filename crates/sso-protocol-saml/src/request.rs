//! The AuthnRequest handle handed to the SSO flow.

use chrono::{DateTime, Utc};

use crate::bindings::{self, HttpRedirectBinding};
use crate::config::{RequestConfiguration, RequestOptions};
use crate::document::{AuthnRequestDocument, UnsignedAuthnRequest};
use crate::error::SamlResult;
use crate::signature::XmlSigner;

/// A built, optionally signed, AuthnRequest.
///
/// Keeps the ID for `InResponseTo` correlation and produces the transport
/// encodings. Nothing on the handle changes the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnRequest {
    document: AuthnRequestDocument,
}

impl AuthnRequest {
    /// Builds a request, signing it when `security.authnRequestsSigned` is set.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the builder. With signing enabled,
    /// missing or unusable credentials are errors too; the request is never
    /// sent unsigned instead.
    pub fn new(config: &RequestConfiguration, options: RequestOptions) -> SamlResult<Self> {
        let unsigned = UnsignedAuthnRequest::build(config, options)?;

        let document = if config.security.authn_requests_signed {
            let signer = XmlSigner::from_config(config)?;
            AuthnRequestDocument::Signed(unsigned.sign(&signer)?)
        } else {
            AuthnRequestDocument::Unsigned(unsigned)
        };

        tracing::debug!(
            id = document.id(),
            destination = %document.content().destination,
            signed = document.is_signed(),
            "created AuthnRequest"
        );
        Ok(Self { document })
    }

    /// Wraps an already built document.
    #[must_use]
    pub fn from_document(document: impl Into<AuthnRequestDocument>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        self.document.id()
    }

    /// Returns the issue instant.
    #[must_use]
    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.document.content().issue_instant
    }

    /// Returns the serialized XML.
    #[must_use]
    pub fn xml(&self) -> &str {
        self.document.xml()
    }

    /// Returns the `SAMLRequest` value: deflated for Redirect, plain base64 for POST.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`](crate::SamlError::Encoding) if compression fails.
    pub fn encoded(&self, deflate: bool) -> SamlResult<String> {
        bindings::encode(self.xml(), deflate)
    }

    /// Returns true if the document carries an enveloped signature.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.document.is_signed()
    }

    /// Returns the underlying document.
    #[must_use]
    pub fn document(&self) -> &AuthnRequestDocument {
        &self.document
    }

    /// Returns `SAMLRequest=..[&RelayState=..]` for the Redirect binding.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`](crate::SamlError::Encoding) if compression fails.
    pub fn redirect_query(&self, relay_state: Option<&str>) -> SamlResult<String> {
        HttpRedirectBinding::encode_query(self.xml(), relay_state)
    }

    /// Returns the Destination URL with the redirect query appended.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`](crate::SamlError::Encoding) if compression fails.
    pub fn redirect_url(&self, relay_state: Option<&str>) -> SamlResult<String> {
        HttpRedirectBinding::encode_request(
            self.xml(),
            &self.document.content().destination,
            relay_state,
        )
    }
}
