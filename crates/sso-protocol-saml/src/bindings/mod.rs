//! SAML bindings implementation.
//!
//! This module implements the transport encodings of the SAML 2.0 bindings:
//!
//! - **HTTP-POST Binding** - Messages are base64-encoded for a form field
//! - **HTTP-Redirect Binding** - Messages are deflated, base64-encoded, and URL-encoded
//!
//! Delivering the message (HTTP client, HTML form rendering) is left to the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sso_protocol_saml::bindings::{self, HttpRedirectBinding};
//!
//! // SAMLRequest value for the Redirect binding
//! let payload = bindings::encode(&request_xml, true)?;
//!
//! // Complete redirect URL
//! let url = HttpRedirectBinding::encode_request(&request_xml, "https://idp.example.com/sso", Some("relay_state"))?;
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

use std::io::{Read, Write};

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{SamlError, SamlResult};
use crate::types::SamlBinding;

/// Form and query parameter carrying an AuthnRequest.
pub const SAML_REQUEST_PARAM: &str = "SAMLRequest";

/// Parameter carrying the opaque relay state.
pub const RELAY_STATE_PARAM: &str = "RelayState";

/// Decoded SAML binding message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The RelayState if present.
    pub relay_state: Option<String>,
    /// The signature (for redirect binding).
    pub signature: Option<String>,
    /// The signature algorithm (for redirect binding).
    pub sig_alg: Option<String>,
}

/// Encodes an XML message for transport.
///
/// With `deflate`, the UTF-8 bytes are compressed with raw DEFLATE (no zlib
/// or gzip framing) before base64, as the Redirect binding requires.
/// Without it, the bytes are base64-encoded as is, for the POST binding.
/// Base64 uses the standard alphabet with padding and no line breaks.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] if compression fails.
pub fn encode(xml: &str, deflate: bool) -> SamlResult<String> {
    let bytes = if deflate {
        deflate_compress(xml.as_bytes())?
    } else {
        xml.as_bytes().to_vec()
    };
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Encodes an XML message the way `binding` transports it.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] if compression fails.
pub fn encode_for_binding(xml: &str, binding: SamlBinding) -> SamlResult<String> {
    encode(xml, binding.uses_deflate())
}

/// Decodes a transport payload back into XML.
///
/// `inflated` selects whether the payload was deflated before base64.
/// Whitespace inside the base64 text is ignored.
///
/// # Errors
///
/// Returns [`SamlError::Encoding`] for invalid base64, invalid DEFLATE data
/// or a message that is not UTF-8.
pub fn decode(payload: &str, inflated: bool) -> SamlResult<String> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;

    let xml_bytes = if inflated {
        deflate_decompress(&bytes)?
    } else {
        bytes
    };

    String::from_utf8(xml_bytes)
        .map_err(|e| SamlError::Encoding(format!("invalid UTF-8 in message: {e}")))
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Encoding(format!("compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Encoding(format!("compression finish error: {e}")))
}

/// Decompresses DEFLATE data.
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Encoding(format!("decompression error: {e}")))?;
    Ok(decompressed)
}
