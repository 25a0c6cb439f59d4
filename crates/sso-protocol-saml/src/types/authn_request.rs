//! SAML AuthnRequest types.
//!
//! Authentication request message sent by a service provider to an identity provider.

use chrono::{DateTime, Utc};

use crate::ids::{format_saml_time, is_valid_xml_id};
use crate::xml::Element;

use super::{
    AuthnContextClass, NameIdPolicy, SamlBinding, SAMLP_NS, SAMLP_PREFIX, SAML_NS, SAML_PREFIX,
    SAML_VERSION,
};

/// Content of a SAML authentication request.
///
/// Holds every field that ends up in the `samlp:AuthnRequest` element. The
/// builder fills it from configuration; [`to_element`](Self::to_element)
/// renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnRequestContent {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    pub version: String,

    /// Timestamp when this request was issued (whole seconds).
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the service provider issuing the request.
    pub issuer: String,

    /// The IdP single sign-on URL the request is sent to.
    pub destination: String,

    /// Binding the IdP should use to deliver the response.
    pub protocol_binding: String,

    /// The URL where the response should be sent.
    pub assertion_consumer_service_url: String,

    /// Name ID policy constraints.
    pub name_id_policy: Option<NameIdPolicy>,

    /// Requested authentication context.
    pub requested_authn_context: Option<RequestedAuthnContext>,

    /// Whether the IdP must authenticate the user directly.
    pub force_authn: bool,

    /// Whether the IdP must not interact with the user.
    pub is_passive: bool,

    /// Index into the SP's attribute consuming service list.
    pub attribute_consuming_service_index: Option<u32>,

    /// A human-readable name for the requester.
    pub provider_name: Option<String>,
}

impl AuthnRequestContent {
    /// Creates a request with the mandatory fields and no optional parts.
    ///
    /// The protocol binding defaults to HTTP-POST.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        issue_instant: DateTime<Utc>,
        issuer: impl Into<String>,
        destination: impl Into<String>,
        assertion_consumer_service_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            version: SAML_VERSION.to_string(),
            issue_instant,
            issuer: issuer.into(),
            destination: destination.into(),
            protocol_binding: SamlBinding::HttpPost.uri().to_string(),
            assertion_consumer_service_url: assertion_consumer_service_url.into(),
            name_id_policy: None,
            requested_authn_context: None,
            force_authn: false,
            is_passive: false,
            attribute_consuming_service_index: None,
            provider_name: None,
        }
    }

    /// Sets the protocol binding URI for the response.
    #[must_use]
    pub fn with_binding_uri(mut self, binding: impl Into<String>) -> Self {
        self.protocol_binding = binding.into();
        self
    }

    /// Sets the name ID policy.
    #[must_use]
    pub fn with_name_id_policy(mut self, policy: NameIdPolicy) -> Self {
        self.name_id_policy = Some(policy);
        self
    }

    /// Sets the requested authentication context.
    #[must_use]
    pub fn with_authn_context(mut self, context: RequestedAuthnContext) -> Self {
        self.requested_authn_context = Some(context);
        self
    }

    /// Sets force authentication.
    #[must_use]
    pub const fn force_authn(mut self, force: bool) -> Self {
        self.force_authn = force;
        self
    }

    /// Sets passive authentication.
    #[must_use]
    pub const fn is_passive(mut self, passive: bool) -> Self {
        self.is_passive = passive;
        self
    }

    /// Sets the attribute consuming service index.
    #[must_use]
    pub const fn with_attribute_consuming_service_index(mut self, index: u32) -> Self {
        self.attribute_consuming_service_index = Some(index);
        self
    }

    /// Sets the provider name.
    #[must_use]
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    /// Returns the parsed protocol binding.
    #[must_use]
    pub fn parsed_binding(&self) -> Option<SamlBinding> {
        SamlBinding::from_uri(&self.protocol_binding)
    }

    /// Validates the basic structure of this request.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_xml_id(&self.id) {
            return Err(format!("ID '{}' is not a valid XML ID", self.id));
        }
        if self.version != SAML_VERSION {
            return Err(format!("Unsupported SAML version: {}", self.version));
        }
        if self.issuer.is_empty() {
            return Err("Issuer is required".to_string());
        }
        if self.destination.is_empty() {
            return Err("Destination is required".to_string());
        }
        if self.assertion_consumer_service_url.is_empty() {
            return Err("AssertionConsumerServiceURL is required".to_string());
        }
        Ok(())
    }

    /// Renders the `samlp:AuthnRequest` element tree.
    ///
    /// The root declares both the `samlp` and `saml` prefixes. Attributes are
    /// emitted in a fixed order and boolean flags only when they are true.
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("samlp:AuthnRequest")
            .with_namespace(SAMLP_PREFIX, SAMLP_NS)
            .with_namespace(SAML_PREFIX, SAML_NS)
            .with_attribute("ID", self.id.as_str())
            .with_attribute("Version", self.version.as_str())
            .with_attribute("IssueInstant", format_saml_time(&self.issue_instant))
            .with_attribute("Destination", self.destination.as_str())
            .with_attribute("ProtocolBinding", self.protocol_binding.as_str())
            .with_attribute(
                "AssertionConsumerServiceURL",
                self.assertion_consumer_service_url.as_str(),
            );

        if self.force_authn {
            root = root.with_attribute("ForceAuthn", "true");
        }
        if self.is_passive {
            root = root.with_attribute("IsPassive", "true");
        }
        if let Some(name) = &self.provider_name {
            root = root.with_attribute("ProviderName", name.as_str());
        }
        if let Some(index) = self.attribute_consuming_service_index {
            root = root.with_attribute("AttributeConsumingServiceIndex", index.to_string());
        }

        root = root.with_child(Element::new("saml:Issuer").with_text(self.issuer.as_str()));

        if let Some(policy) = &self.name_id_policy {
            root = root.with_child(policy.to_element());
        }
        if let Some(context) = self
            .requested_authn_context
            .as_ref()
            .and_then(RequestedAuthnContext::to_element)
        {
            root = root.with_child(context);
        }

        root
    }
}

/// Requested authentication context.
///
/// Specifies the authentication context requirements for the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedAuthnContext {
    /// Comparison method for the authentication context.
    pub comparison: AuthnContextComparison,

    /// List of acceptable authentication context class references.
    pub authn_context_class_refs: Vec<String>,
}

impl RequestedAuthnContext {
    /// Creates a new requested authentication context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            comparison: AuthnContextComparison::Exact,
            authn_context_class_refs: Vec::new(),
        }
    }

    /// Creates a context requiring exact match of a class reference.
    #[must_use]
    pub fn exact(class: AuthnContextClass) -> Self {
        Self {
            comparison: AuthnContextComparison::Exact,
            authn_context_class_refs: vec![class.uri().to_string()],
        }
    }

    /// Adds a class reference.
    #[must_use]
    pub fn with_class_ref(mut self, class: AuthnContextClass) -> Self {
        self.authn_context_class_refs.push(class.uri().to_string());
        self
    }

    /// Adds a class reference given by URI.
    #[must_use]
    pub fn with_class_ref_uri(mut self, uri: impl Into<String>) -> Self {
        self.authn_context_class_refs.push(uri.into());
        self
    }

    /// Sets the comparison method.
    #[must_use]
    pub const fn with_comparison(mut self, comparison: AuthnContextComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Renders the `samlp:RequestedAuthnContext` element.
    ///
    /// Returns `None` when no class reference is listed, since the schema
    /// requires at least one.
    #[must_use]
    pub fn to_element(&self) -> Option<Element> {
        if self.authn_context_class_refs.is_empty() {
            return None;
        }

        let element = self.authn_context_class_refs.iter().fold(
            Element::new("samlp:RequestedAuthnContext")
                .with_attribute("Comparison", self.comparison.as_str()),
            |element, class_ref| {
                element.with_child(
                    Element::new("saml:AuthnContextClassRef").with_text(class_ref.as_str()),
                )
            },
        );
        Some(element)
    }
}

/// Authentication context comparison methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuthnContextComparison {
    /// Exact match required.
    #[default]
    Exact,
    /// Match must be at least as strong.
    Minimum,
    /// Match must be at most as strong.
    Maximum,
    /// Match must be stronger than any listed context.
    Better,
}

impl AuthnContextComparison {
    /// Returns the string value for this comparison.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Better => "better",
        }
    }

    /// Parses a comparison value. Matching is exact and case-sensitive, as in
    /// the schema.
    #[must_use]
    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "exact" => Some(Self::Exact),
            "minimum" => Some(Self::Minimum),
            "maximum" => Some(Self::Maximum),
            "better" => Some(Self::Better),
            _ => None,
        }
    }
}
