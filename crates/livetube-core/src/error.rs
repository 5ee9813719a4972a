//! Error types for the extraction library
//!
//! Absence of a field in a response tree is never an error here — the query
//! engine reports it as a no-match result. Errors are reserved for transport
//! failures, structural parse failures, and upstream API error payloads.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all extraction operations
///
/// Implements Display for human-readable messages and Serialize
/// for embedding into application-facing payloads.
#[derive(Error, Debug)]
pub enum LivetubeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Embedded object or script could not be parsed
    #[error("Failed to parse page data: {0}")]
    ParseError(String),

    /// A known extraction anchor never matched
    #[error("{caller}: could not find match for {pattern}")]
    RegexMatchError { caller: String, pattern: String },

    /// The upstream API returned an error payload instead of data
    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// Signature program could not be recovered or applied for a stream format
    #[error("Cipher unresolvable: {0}")]
    CipherUnresolvable(String),

    /// Invalid video or channel id provided
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Malformed top-level input handed to the library
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LivetubeError {
    /// Shorthand for a [`LivetubeError::RegexMatchError`]
    pub(crate) fn regex_match(caller: &str, pattern: &str) -> Self {
        Self::RegexMatchError {
            caller: caller.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

impl Serialize for LivetubeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, LivetubeError>;
