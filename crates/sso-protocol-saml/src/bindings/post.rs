//! HTTP-POST Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-POST binding payload. Rendering the
//! auto-submitting form is up to the caller.

use crate::error::{SamlError, SamlResult};

use super::{decode, encode, DecodedMessage, RELAY_STATE_PARAM, SAML_REQUEST_PARAM};

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Encodes a SAML request for the `SAMLRequest` form field.
    ///
    /// # Errors
    ///
    /// Never fails today; the result type matches the Redirect binding.
    pub fn encode_request(xml: &str) -> SamlResult<String> {
        encode(xml, false)
    }

    /// Returns the form fields to post, in order.
    ///
    /// # Errors
    ///
    /// See [`HttpPostBinding::encode_request`].
    pub fn form_fields(
        xml: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<Vec<(&'static str, String)>> {
        let mut fields = vec![(SAML_REQUEST_PARAM, Self::encode_request(xml)?)];
        if let Some(rs) = relay_state {
            fields.push((RELAY_STATE_PARAM, rs.to_string()));
        }
        Ok(fields)
    }

    /// Decodes a SAML request from HTTP-POST form data.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] if the field is missing, not base64
    /// or not UTF-8.
    pub fn decode(
        saml_request: Option<&str>,
        relay_state: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let encoded = saml_request
            .ok_or_else(|| SamlError::Encoding("no SAMLRequest parameter".to_string()))?;

        Ok(DecodedMessage {
            xml: decode(encoded, false)?,
            relay_state: relay_state.map(String::from),
            signature: None,
            sig_alg: None,
        })
    }
}
