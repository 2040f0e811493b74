//! The JSON envelope returned by the device.
//!
//! # Design
//! The device answers every command with a JSON object carrying a `response`
//! status string and, on failure, a `message`. Any other fields are kept as
//! they arrived so callers can read them by key. Decoding only checks that
//! the body is a JSON object; status classification is a separate step.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder rendered for absent `response` or `message` fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Decoded response body of a device command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

/// Classification of the envelope's `response` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Error,
    /// Any other value, or `N/A` when the field is missing or not a string.
    Other(String),
}

impl Envelope {
    /// Decode a raw body. The body must be a JSON object; content type is
    /// never consulted.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The `response` field, if present and a string.
    pub fn response(&self) -> Option<&str> {
        self.0.get("response").and_then(Value::as_str)
    }

    /// The `message` field, if present and a string.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn status(&self) -> ResponseStatus {
        match self.response() {
            Some("OK") => ResponseStatus::Ok,
            Some("ERROR") => ResponseStatus::Error,
            Some(other) => ResponseStatus::Other(other.to_string()),
            None => ResponseStatus::Other(NOT_AVAILABLE.to_string()),
        }
    }

    /// True only for an exact `"OK"`.
    pub fn is_ok(&self) -> bool {
        self.response() == Some("OK")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Envelope {
    fn from(map: Map<String, Value>) -> Self {
        Envelope(map)
    }
}
