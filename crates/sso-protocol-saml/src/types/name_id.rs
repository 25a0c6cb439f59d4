//! NameID policy for authentication requests.

use crate::xml::Element;

use super::NameIdFormat;

/// Name ID policy for authentication requests.
///
/// Tells the IdP which identifier format the SP expects back and whether the
/// IdP may create a new identifier for the principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIdPolicy {
    /// The requested name ID format URI.
    pub format: Option<String>,

    /// Whether a new identifier may be created for this request.
    pub allow_create: bool,
}

impl NameIdPolicy {
    /// Creates a new name ID policy with no constraints.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            format: None,
            allow_create: false,
        }
    }

    /// Creates a policy requesting a specific format.
    #[must_use]
    pub fn with_format(format: NameIdFormat) -> Self {
        Self::with_format_uri(format.uri())
    }

    /// Creates a policy requesting a format given by URI.
    ///
    /// Formats outside [`NameIdFormat`] are passed through as configured.
    #[must_use]
    pub fn with_format_uri(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            allow_create: false,
        }
    }

    /// Sets whether new identifiers can be created.
    #[must_use]
    pub const fn allow_create(mut self, allow: bool) -> Self {
        self.allow_create = allow;
        self
    }

    /// Returns the parsed name ID format.
    #[must_use]
    pub fn parsed_format(&self) -> Option<NameIdFormat> {
        self.format.as_deref().and_then(NameIdFormat::from_uri)
    }

    /// Renders the `samlp:NameIDPolicy` element.
    ///
    /// `AllowCreate` is always written so the IdP never has to guess.
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new("samlp:NameIDPolicy");
        if let Some(format) = &self.format {
            element = element.with_attribute("Format", format.as_str());
        }
        element.with_attribute("AllowCreate", bool_attribute(self.allow_create))
    }
}

const fn bool_attribute(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
