//! Error types for the Podargos client.
//!
//! # Design
//! Only failures the caller cannot treat as data are errors here. A non-200
//! status surfaces as an absent result and an `ERROR` envelope is returned
//! as an ordinary value, so neither has a variant. Transport failures keep
//! the underlying error as their source.

use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by `PodargosClient`.
#[derive(Debug, Error)]
pub enum Error {
    /// Every attempt failed at the transport level; holds the last failure.
    #[error("error connecting to podargos: {0}")]
    Transport(#[source] BoxError),

    /// Every attempt ran past the per-attempt timeout.
    #[error("timed out after {0:?} when connecting to podargos")]
    Timeout(Duration),

    /// A 200 response carried a body that is not a JSON object.
    #[error("invalid JSON from podargos: {0}")]
    Decode(#[from] serde_json::Error),

    /// The default HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] BoxError),
}

/// Errors produced while assembling a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}
