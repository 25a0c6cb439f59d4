//! Request identifiers and SAML timestamps.
//!
//! IDs are `ID_` followed by the 32 hex digits of a random v4 UUID, so they
//! never start with a digit and are valid `xs:ID` values. Timestamps use the
//! SAML profile format `YYYY-MM-DDThh:mm:ssZ` (UTC, no fractional seconds).
//!
//! Both sources are injectable through [`IdSource`] and [`Clock`] so that
//! tests can build byte-identical documents.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Prefix of generated request IDs.
pub const ID_PREFIX: &str = "ID_";

/// Timestamp format used for `IssueInstant`.
pub const SAML_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Generates a new unique request ID.
#[must_use]
pub fn new_id() -> String {
    format!("{ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// Returns the current UTC time in SAML timestamp format.
#[must_use]
pub fn now_as_saml_time() -> String {
    format_saml_time(&Utc::now())
}

/// Formats a UTC instant in SAML timestamp format.
#[must_use]
pub fn format_saml_time(instant: &DateTime<Utc>) -> String {
    instant.format(SAML_TIME_FORMAT).to_string()
}

/// Parses a SAML timestamp.
///
/// Only the exact profile format is accepted; offsets and fractional
/// seconds are rejected.
#[must_use]
pub fn parse_saml_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, SAML_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Returns true if the value can be used as an XML `ID` attribute.
///
/// Checks the NCName shape the builder relies on: non-empty, no colon or
/// whitespace, and a first character that is a letter or underscore.
#[must_use]
pub fn is_valid_xml_id(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Source of request IDs.
pub trait IdSource: Send + Sync {
    /// Returns the ID for the next request.
    fn next_id(&self) -> String;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// ID source backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> String {
        new_id()
    }
}

/// Clock reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ID source that always returns the same ID.
#[derive(Debug, Clone)]
pub struct FixedIdSource(String);

impl FixedIdSource {
    /// Creates a source returning `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl IdSource for FixedIdSource {
    fn next_id(&self) -> String {
        self.0.clone()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock that always reports `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
