//! HTTP-Redirect Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-Redirect binding for sending SAML messages
//! via URL query parameters with DEFLATE compression.

use crate::error::{SamlError, SamlResult};
use crate::signature::XmlSigner;

use super::{decode, encode, DecodedMessage, RELAY_STATE_PARAM, SAML_REQUEST_PARAM};

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Builds the query string for an unsigned request.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] if compression fails.
    pub fn encode_query(xml: &str, relay_state: Option<&str>) -> SamlResult<String> {
        let payload = encode(xml, true)?;

        let mut query = format!("{SAML_REQUEST_PARAM}={}", urlencoding::encode(&payload));
        if let Some(rs) = relay_state {
            query.push_str(&format!("&{RELAY_STATE_PARAM}={}", urlencoding::encode(rs)));
        }

        Ok(query)
    }

    /// Encodes a SAML request for HTTP-Redirect binding.
    ///
    /// Returns a URL with the encoded message in query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] if compression fails.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        Ok(append_query(destination, &Self::encode_query(xml, relay_state)?))
    }

    /// Encodes a request with a detached query-string signature.
    ///
    /// The signature is over the query string parameters, not embedded in the XML.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] if compression fails and the signer's
    /// errors if signing fails.
    pub fn encode_signed_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        signer: &XmlSigner,
    ) -> SamlResult<String> {
        let payload = encode(xml, true)?;
        let query = signer.sign_redirect_query(&payload, relay_state)?;
        Ok(append_query(destination, &query))
    }

    /// Decodes a SAML request from HTTP-Redirect query parameters.
    ///
    /// `saml_request` may still be URL-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] if the parameter is missing or cannot
    /// be decoded.
    pub fn decode(
        saml_request: Option<&str>,
        relay_state: Option<&str>,
        signature: Option<&str>,
        sig_alg: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let encoded = saml_request
            .ok_or_else(|| SamlError::Encoding("no SAMLRequest parameter".to_string()))?;

        // URL decode (may already be done by the web framework)
        let url_decoded = urlencoding::decode(encoded)
            .map_err(|e| SamlError::Encoding(format!("URL decode error: {e}")))?;

        let xml = decode(&url_decoded, true)?;

        Ok(DecodedMessage {
            xml,
            relay_state: relay_state.map(String::from),
            signature: signature.map(String::from),
            sig_alg: sig_alg.map(String::from),
        })
    }

    /// Decodes a message from a full URL.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] for an unparsable URL or payload.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = parse_url(url)?;

        let mut saml_request = None;
        let mut relay_state = None;
        let mut signature = None;
        let mut sig_alg = None;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                SAML_REQUEST_PARAM => saml_request = Some(value.into_owned()),
                RELAY_STATE_PARAM => relay_state = Some(value.into_owned()),
                "Signature" => signature = Some(value.into_owned()),
                "SigAlg" => sig_alg = Some(value.into_owned()),
                _ => {}
            }
        }

        // query_pairs already percent-decoded the value.
        let xml = decode(
            saml_request
                .as_deref()
                .ok_or_else(|| SamlError::Encoding("no SAMLRequest parameter".to_string()))?,
            true,
        )?;

        Ok(DecodedMessage {
            xml,
            relay_state,
            signature,
            sig_alg,
        })
    }

    /// Extracts the query string for signature verification.
    ///
    /// Returns the `SAMLRequest`, `RelayState` (if present) and `SigAlg`
    /// segments exactly as they appear in the URL, in URL order. Values are
    /// not re-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Encoding`] for an unparsable URL or one without
    /// SAML parameters.
    pub fn extract_signed_query(url: &str) -> SamlResult<String> {
        let parsed = parse_url(url)?;

        let parts: Vec<&str> = parsed
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|segment| {
                let key = segment.split_once('=').map_or(*segment, |(key, _)| key);
                matches!(key, SAML_REQUEST_PARAM | RELAY_STATE_PARAM | "SigAlg")
            })
            .collect();

        if parts.is_empty() {
            return Err(SamlError::Encoding("no SAML parameters found".to_string()));
        }

        Ok(parts.join("&"))
    }
}

fn parse_url(url: &str) -> SamlResult<url::Url> {
    url::Url::parse(url).map_err(|e| SamlError::Encoding(format!("invalid URL: {e}")))
}

fn append_query(destination: &str, query: &str) -> String {
    let separator = if destination.contains('?') { '&' } else { '?' };
    format!("{destination}{separator}{query}")
}
