//! Error types for the Buffer API client.
//!
//! # Design
//! Failures split into two families. `ValidationError` is raised locally
//! before any request leaves the process and always names the offending
//! value. `TransportError` covers everything that happens once a request
//! is handed to the transport: network failures, non-2xx statuses and
//! undecodable bodies. `NotFound` keeps its own variant because callers
//! frequently distinguish "the id does not exist" from other statuses.

use thiserror::Error;

use crate::button::BUTTON_STYLES;
use crate::schedule::WEEKDAYS;
use crate::update::MEDIA_KEYS;

/// A parameter was rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid day `{value}`, must be one of: {}", WEEKDAYS.join(", "))]
    InvalidDay { value: String },

    #[error("invalid time `{value}`, must be HH:MM (00:00 to 23:59)")]
    InvalidTime { value: String },

    #[error("invalid media key `{key}`, must be one of: {}", MEDIA_KEYS.join(", "))]
    InvalidMediaKey { key: String },

    #[error("could not parse `{value}` as a date/time")]
    UnparseableDate { value: String },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error("button style `{value}` not supported, must be one of: {}", BUTTON_STYLES.join(", "))]
    InvalidButtonStyle { value: String },

    #[error("updating multiple schedules in one call is not implemented")]
    MultipleSchedulesNotImplemented,
}

/// The request was sent (or attempted) and did not produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Errors returned by `BufferClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Missing or malformed client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
