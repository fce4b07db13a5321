//! Error types for the Logo Objects client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers routinely distinguish
//! "the record does not exist" from "the server refused the request".
//! 401/403 are split out for the same reason. Every other non-2xx response
//! lands in `HttpError` with the raw status and body, plus the server's own
//! message when the body is a JSON error object.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 401 or 403.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The server returned a non-2xx status not covered above.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or(body.as_str()))]
    HttpError {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A caller-supplied path segment, field name or entity name was rejected
    /// before any request was built.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
