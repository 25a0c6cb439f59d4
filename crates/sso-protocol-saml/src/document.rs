//! Built AuthnRequest documents.
//!
//! A request is built once as an [`UnsignedAuthnRequest`]. Signing consumes
//! it and returns a [`SignedAuthnRequest`], which has no mutating operations:
//! a changed request needs a new build and with it a new ID and signature.

use chrono::{DateTime, Utc};

use crate::builder::AuthnRequestBuilder;
use crate::config::{RequestConfiguration, RequestOptions};
use crate::error::SamlResult;
use crate::signature::{XmlSignature, XmlSigner};
use crate::types::AuthnRequestContent;
use crate::xml::{to_xml_string, Element};

/// A built AuthnRequest that has not been signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedAuthnRequest {
    content: AuthnRequestContent,
    root: Element,
    xml: String,
}

impl UnsignedAuthnRequest {
    /// Builds a request with a random ID and the current time.
    ///
    /// # Errors
    ///
    /// See [`AuthnRequestBuilder::build`].
    pub fn build(config: &RequestConfiguration, options: RequestOptions) -> SamlResult<Self> {
        AuthnRequestBuilder::new(config).options(options).build()
    }

    pub(crate) fn from_content(content: AuthnRequestContent) -> SamlResult<Self> {
        let root = content.to_element();
        let xml = to_xml_string(&root)?;
        Ok(Self { content, root, xml })
    }

    /// Returns the request content.
    #[must_use]
    pub fn content(&self) -> &AuthnRequestContent {
        &self.content
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.content.id
    }

    /// Returns the issue instant.
    #[must_use]
    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.content.issue_instant
    }

    /// Returns the element tree.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the serialized document.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Signs the request, sealing it.
    ///
    /// # Errors
    ///
    /// Returns the signer's errors; the request is consumed either way.
    pub fn sign(self, signer: &XmlSigner) -> SamlResult<SignedAuthnRequest> {
        let Self {
            content, mut root, ..
        } = self;

        let signature = signer.sign_element(&mut root)?;
        let xml = to_xml_string(&root)?;

        Ok(SignedAuthnRequest {
            content,
            root,
            xml,
            signature,
        })
    }
}

/// A signed AuthnRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthnRequest {
    content: AuthnRequestContent,
    root: Element,
    xml: String,
    signature: XmlSignature,
}

impl SignedAuthnRequest {
    /// Returns the request content.
    #[must_use]
    pub fn content(&self) -> &AuthnRequestContent {
        &self.content
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.content.id
    }

    /// Returns the issue instant.
    #[must_use]
    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.content.issue_instant
    }

    /// Returns the element tree, including `ds:Signature`.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the serialized signed document.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Returns the signature that was embedded.
    #[must_use]
    pub fn signature(&self) -> &XmlSignature {
        &self.signature
    }
}

/// Either state of a built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthnRequestDocument {
    /// Built without a signature.
    Unsigned(UnsignedAuthnRequest),
    /// Built and signed.
    Signed(SignedAuthnRequest),
}

impl AuthnRequestDocument {
    /// Returns the request content.
    #[must_use]
    pub fn content(&self) -> &AuthnRequestContent {
        match self {
            Self::Unsigned(request) => request.content(),
            Self::Signed(request) => request.content(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.content().id
    }

    /// Returns the serialized document.
    #[must_use]
    pub fn xml(&self) -> &str {
        match self {
            Self::Unsigned(request) => request.xml(),
            Self::Signed(request) => request.xml(),
        }
    }

    /// Returns true for a signed document.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }

    /// Returns the embedded signature, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&XmlSignature> {
        match self {
            Self::Unsigned(_) => None,
            Self::Signed(request) => Some(request.signature()),
        }
    }
}

impl From<UnsignedAuthnRequest> for AuthnRequestDocument {
    fn from(request: UnsignedAuthnRequest) -> Self {
        Self::Unsigned(request)
    }
}

impl From<SignedAuthnRequest> for AuthnRequestDocument {
    fn from(request: SignedAuthnRequest) -> Self {
        Self::Signed(request)
    }
}
