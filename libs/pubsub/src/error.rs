//! Error types for envelope handling.

use thiserror::Error;

/// Errors that can occur when handling envelopes.
///
/// Building an envelope and applying a TTL never fail, so every variant
/// originates from decoding, re-encoding or loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PubsubError {
    /// The input is not a structured (JSON object) document.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Component configuration could not be loaded.
    #[error("invalid component configuration: {0}")]
    Config(String),
}

impl PubsubError {
    /// Returns true if the same input might succeed on a later attempt.
    ///
    /// A malformed payload is a property of the payload itself.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PubsubError::MalformedPayload(_))
    }

    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        PubsubError::MalformedPayload(err.to_string())
    }
}

impl From<serde_json::Error> for PubsubError {
    fn from(err: serde_json::Error) -> Self {
        PubsubError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for PubsubError {
    fn from(err: config::ConfigError) -> Self {
        PubsubError::Config(err.to_string())
    }
}
