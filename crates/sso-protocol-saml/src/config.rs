//! Request configuration.
//!
//! The settings an SP needs to issue AuthnRequests, in the JSON layout the
//! settings loader produces (`camelCase` keys). This crate never reads files;
//! callers deserialize the structure and hand it over.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};
use crate::types::{
    digest_algorithms, signature_algorithms, AuthnContextClass, AuthnContextComparison,
    NameIdFormat, NameIdPolicy, RequestedAuthnContext, SamlBinding,
};

/// Preferred organization language for `ProviderName`.
pub const PREFERRED_LANGUAGE: &str = "en-US";

/// Resolved SP/IdP settings for building requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfiguration {
    /// The service provider (this application).
    pub sp: ServiceProviderConfig,

    /// The identity provider requests are sent to.
    pub idp: IdentityProviderConfig,

    /// Organization info keyed by language tag.
    #[serde(default)]
    pub organization: BTreeMap<String, OrganizationInfo>,

    /// Security policy.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Service provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    /// SP entity ID, emitted as `saml:Issuer`.
    pub entity_id: String,

    /// Where the IdP delivers the response.
    pub assertion_consumer_service: AssertionConsumerService,

    /// Requested NameID format URI.
    #[serde(default = "default_name_id_format", alias = "NameIDFormat")]
    pub name_id_format: String,

    /// Attribute consuming service, if the SP declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_consuming_service: Option<AttributeConsumingService>,

    /// Signing key and certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SigningCredentials>,
}

/// Assertion consumer service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionConsumerService {
    /// Endpoint URL.
    pub url: String,

    /// Binding URI the response should use (defaults to HTTP-POST).
    #[serde(default = "default_acs_binding")]
    pub binding: String,
}

/// Attribute consuming service declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConsumingService {
    /// Service index (defaults to 1).
    #[serde(default = "default_attribute_consuming_service_index")]
    pub index: u32,

    /// Service name shown by the IdP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

/// PEM-encoded signing material.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningCredentials {
    /// Private key (PKCS#8 or PKCS#1 PEM).
    #[serde(skip_serializing)]
    pub private_key: String,

    /// X.509 certificate (PEM).
    pub certificate: String,
}

impl SigningCredentials {
    /// Creates credentials from PEM text.
    #[must_use]
    pub fn new(private_key: impl Into<String>, certificate: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            certificate: certificate.into(),
        }
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("private_key", &"<redacted>")
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderConfig {
    /// IdP entity ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Single sign-on endpoint, emitted as `Destination`.
    pub single_sign_on_service: SingleSignOnService,
}

/// IdP single sign-on endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSignOnService {
    /// Endpoint URL.
    pub url: String,

    /// Binding URI the IdP accepts requests on (defaults to HTTP-Redirect).
    #[serde(default = "default_sso_binding")]
    pub binding: String,
}

/// Organization details for one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInfo {
    /// Organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable name, used for `ProviderName`.
    #[serde(default, alias = "displayname", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Organization URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Security policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    /// Sign every AuthnRequest.
    pub authn_requests_signed: bool,

    /// Ask the IdP to encrypt the NameID.
    pub want_name_id_encrypted: bool,

    /// `false`, `true` (PasswordProtectedTransport) or a list of class refs.
    pub requested_authn_context: RequestedAuthnContextSetting,

    /// One of `exact`, `minimum`, `maximum`, `better`.
    pub requested_authn_context_comparison: String,

    /// Signature algorithm URI.
    pub signature_algorithm: String,

    /// Digest algorithm URI.
    pub digest_algorithm: String,

    /// Whether the SP expects signed assertions.
    pub want_assertions_signed: bool,

    /// Whether the SP expects signed response messages.
    pub want_messages_signed: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            authn_requests_signed: false,
            want_name_id_encrypted: false,
            requested_authn_context: RequestedAuthnContextSetting::default(),
            requested_authn_context_comparison: AuthnContextComparison::Exact
                .as_str()
                .to_string(),
            signature_algorithm: signature_algorithms::RSA_SHA256.to_string(),
            digest_algorithm: digest_algorithms::SHA256.to_string(),
            want_assertions_signed: false,
            want_messages_signed: false,
        }
    }
}

/// The `requestedAuthnContext` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestedAuthnContextSetting {
    /// `true` requests PasswordProtectedTransport, `false` requests nothing.
    Enabled(bool),
    /// Explicit list of class reference URIs.
    ClassRefs(Vec<String>),
}

impl Default for RequestedAuthnContextSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl RequestedAuthnContextSetting {
    /// Returns the class references to request, or `None` when disabled.
    #[must_use]
    pub fn class_refs(&self) -> Option<Vec<String>> {
        match self {
            Self::Enabled(false) => None,
            Self::Enabled(true) => Some(vec![AuthnContextClass::PasswordProtectedTransport
                .uri()
                .to_string()]),
            Self::ClassRefs(refs) => Some(refs.clone()),
        }
    }
}

fn default_name_id_format() -> String {
    NameIdFormat::Unspecified.uri().to_string()
}

fn default_acs_binding() -> String {
    SamlBinding::HttpPost.uri().to_string()
}

fn default_sso_binding() -> String {
    SamlBinding::HttpRedirect.uri().to_string()
}

const fn default_attribute_consuming_service_index() -> u32 {
    1
}

impl RequestConfiguration {
    /// Creates a configuration with the required values and defaults elsewhere.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        acs_url: impl Into<String>,
        idp_sso_url: impl Into<String>,
    ) -> Self {
        Self {
            sp: ServiceProviderConfig {
                entity_id: entity_id.into(),
                assertion_consumer_service: AssertionConsumerService {
                    url: acs_url.into(),
                    binding: default_acs_binding(),
                },
                name_id_format: default_name_id_format(),
                attribute_consuming_service: None,
                credentials: None,
            },
            idp: IdentityProviderConfig {
                entity_id: None,
                single_sign_on_service: SingleSignOnService {
                    url: idp_sso_url.into(),
                    binding: default_sso_binding(),
                },
            },
            organization: BTreeMap::new(),
            security: SecurityConfig::default(),
        }
    }

    /// Checks the values every request needs.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if the SP entity ID, the ACS URL
    /// or the IdP SSO URL is empty.
    pub fn validate(&self) -> SamlResult<()> {
        require("SP entity ID", &self.sp.entity_id)?;
        require(
            "assertion consumer service URL",
            &self.sp.assertion_consumer_service.url,
        )?;
        require(
            "IdP single sign-on URL",
            &self.idp.single_sign_on_service.url,
        )?;
        Ok(())
    }

    /// Resolves the `ProviderName`.
    ///
    /// Uses the `en-US` display name when that language is configured,
    /// otherwise the display name of the lexicographically first language.
    /// An empty display name resolves to `None`.
    #[must_use]
    pub fn provider_name(&self) -> Option<&str> {
        let info = self
            .organization
            .get(PREFERRED_LANGUAGE)
            .or_else(|| self.organization.values().next())?;

        info.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Parses the configured authn context comparison.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] for values outside the schema.
    pub fn authn_context_comparison(&self) -> SamlResult<AuthnContextComparison> {
        let value = &self.security.requested_authn_context_comparison;
        AuthnContextComparison::from_name(value).ok_or_else(|| {
            SamlError::Configuration(format!(
                "requestedAuthnContextComparison must be exact, minimum, maximum or better, got '{value}'"
            ))
        })
    }

    /// Builds the requested authn context, if one should be sent.
    ///
    /// An empty class reference list sends nothing. The comparison is only
    /// read when a context is sent.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] for an unknown comparison.
    pub fn requested_authn_context(&self) -> SamlResult<Option<RequestedAuthnContext>> {
        let Some(class_refs) = self.security.requested_authn_context.class_refs() else {
            return Ok(None);
        };
        if class_refs.is_empty() {
            return Ok(None);
        }

        let comparison = self.authn_context_comparison()?;
        let context = class_refs
            .into_iter()
            .fold(RequestedAuthnContext::new(), RequestedAuthnContext::with_class_ref_uri)
            .with_comparison(comparison);
        Ok(Some(context))
    }

    /// Builds the NameID policy.
    ///
    /// Requests the encrypted format when the SP wants encrypted NameIDs.
    #[must_use]
    pub fn name_id_policy(&self) -> NameIdPolicy {
        let policy = if self.security.want_name_id_encrypted {
            NameIdPolicy::with_format(NameIdFormat::Encrypted)
        } else {
            NameIdPolicy::with_format_uri(self.sp.name_id_format.as_str())
        };
        policy.allow_create(true)
    }

    /// Returns the attribute consuming service index, if one is declared.
    #[must_use]
    pub fn attribute_consuming_service_index(&self) -> Option<u32> {
        self.sp
            .attribute_consuming_service
            .as_ref()
            .map(|service| service.index)
    }
}

fn require(name: &str, value: &str) -> SamlResult<()> {
    if value.trim().is_empty() {
        return Err(SamlError::Configuration(format!("{name} is required")));
    }
    Ok(())
}

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// Emit `ForceAuthn="true"`.
    pub force_authn: bool,

    /// Emit `IsPassive="true"`.
    pub is_passive: bool,

    /// Emit a `samlp:NameIDPolicy` element.
    pub set_name_id_policy: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            force_authn: false,
            is_passive: false,
            set_name_id_policy: true,
        }
    }
}

impl RequestOptions {
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

    /// Sets whether to send a NameID policy.
    #[must_use]
    pub const fn set_name_id_policy(mut self, set: bool) -> Self {
        self.set_name_id_policy = set;
        self
    }
}
