//! SAML 2.0 types and data structures.
//!
//! This module contains the request-side SAML types: the AuthnRequest
//! content model, NameID policy, requested authentication context and the
//! protocol constants they use.

mod authn_request;
mod constants;
mod name_id;

pub use authn_request::*;
pub use constants::*;
pub use name_id::*;
