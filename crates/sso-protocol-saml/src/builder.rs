//! AuthnRequest construction from configuration.

use std::fmt;

use chrono::SubsecRound;

use crate::config::{RequestConfiguration, RequestOptions};
use crate::document::UnsignedAuthnRequest;
use crate::error::{SamlError, SamlResult};
use crate::ids::{Clock, IdSource, RandomIdSource, SystemClock};
use crate::types::AuthnRequestContent;
use crate::xml::is_valid_xml_text;

/// Builds unsigned AuthnRequest documents.
///
/// The ID and time sources default to a random ID and the system clock;
/// fixed sources make the output deterministic.
///
/// ```rust,ignore
/// let request = AuthnRequestBuilder::new(&config)
///     .options(RequestOptions::default().force_authn(true))
///     .build()?;
/// ```
pub struct AuthnRequestBuilder<'a> {
    config: &'a RequestConfiguration,
    options: RequestOptions,
    id_source: &'a dyn IdSource,
    clock: &'a dyn Clock,
}

impl fmt::Debug for AuthnRequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthnRequestBuilder")
            .field("entity_id", &self.config.sp.entity_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> AuthnRequestBuilder<'a> {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new(config: &'a RequestConfiguration) -> Self {
        Self {
            config,
            options: RequestOptions::default(),
            id_source: &RandomIdSource,
            clock: &SystemClock,
        }
    }

    /// Sets the per-request options.
    #[must_use]
    pub const fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the source of the request ID.
    #[must_use]
    pub fn id_source(mut self, id_source: &'a dyn IdSource) -> Self {
        self.id_source = id_source;
        self
    }

    /// Sets the source of the issue instant.
    #[must_use]
    pub fn clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Assembles and serializes the request.
    ///
    /// The ID and issue instant are drawn exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] for missing required settings,
    /// an invalid ID or values that cannot appear in XML.
    pub fn build(&self) -> SamlResult<UnsignedAuthnRequest> {
        let config = self.config;
        config.validate()?;

        let id = self.id_source.next_id();
        let issue_instant = self.clock.now().trunc_subsecs(0);

        let mut content = AuthnRequestContent::new(
            id,
            issue_instant,
            config.sp.entity_id.as_str(),
            config.idp.single_sign_on_service.url.as_str(),
            config.sp.assertion_consumer_service.url.as_str(),
        )
        .with_binding_uri(config.sp.assertion_consumer_service.binding.as_str())
        .force_authn(self.options.force_authn)
        .is_passive(self.options.is_passive);

        if let Some(name) = config.provider_name() {
            content = content.with_provider_name(name);
        }
        if self.options.set_name_id_policy {
            content = content.with_name_id_policy(config.name_id_policy());
        }
        if let Some(context) = config.requested_authn_context()? {
            content = content.with_authn_context(context);
        }
        if let Some(index) = config.attribute_consuming_service_index() {
            content = content.with_attribute_consuming_service_index(index);
        }

        content.validate().map_err(SamlError::Configuration)?;
        check_xml_text(&content)?;

        let request = UnsignedAuthnRequest::from_content(content)?;
        tracing::debug!(
            id = request.id(),
            destination = %request.content().destination,
            signed = false,
            "built AuthnRequest"
        );
        Ok(request)
    }
}

fn check_xml_text(content: &AuthnRequestContent) -> SamlResult<()> {
    let mut values = vec![
        ("SP entity ID", content.issuer.as_str()),
        ("IdP single sign-on URL", content.destination.as_str()),
        ("ACS URL", content.assertion_consumer_service_url.as_str()),
        ("ACS binding", content.protocol_binding.as_str()),
    ];
    if let Some(name) = &content.provider_name {
        values.push(("organization display name", name));
    }
    if let Some(format) = content
        .name_id_policy
        .as_ref()
        .and_then(|policy| policy.format.as_deref())
    {
        values.push(("NameID format", format));
    }
    if let Some(context) = &content.requested_authn_context {
        values.extend(
            context
                .authn_context_class_refs
                .iter()
                .map(|class_ref| ("authn context class", class_ref.as_str())),
        );
    }

    match values.into_iter().find(|(_, value)| !is_valid_xml_text(value)) {
        Some((name, _)) => Err(SamlError::Configuration(format!(
            "{name} contains characters not allowed in XML"
        ))),
        None => Ok(()),
    }
}
