//! Error types for recruitment client operations
//!
//! The taxonomy separates failures by retry policy: transport problems can be
//! retried, validation and state conflicts cannot, and authentication errors
//! are handed back to the caller for a redirect to login.

use std::collections::BTreeMap;
use thiserror::Error;

/// Main error type for client operations
///
/// `Clone` because a single in-flight fetch hands its outcome to every
/// consumer waiting on the same query key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Transport or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Server rejected the payload shape or content
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        /// Field name -> messages, surfaced back to the form layer
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Requested transition is illegal for the entity's current state
    #[error("State conflict: {message}")]
    StateConflict { message: String },

    /// Session invalid (401) or not authorized (403)
    #[error("Authentication error ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side failure (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Build a validation error without field detail
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Build a state conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        ClientError::StateConflict {
            message: message.into(),
        }
    }

    /// Whether the same request may succeed if issued again unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Server { .. })
    }

    /// Whether the caller should send the user back to login
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }

    /// Whether the entity changed under us and must be re-fetched
    pub fn is_state_conflict(&self) -> bool {
        matches!(self, ClientError::StateConflict { .. })
    }

    /// Classify an HTTP error status with the server's message
    pub fn from_status(
        status: u16,
        message: impl Into<String>,
        fields: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let message = message.into();
        match status {
            400 | 422 => ClientError::Validation { message, fields },
            401 | 403 => ClientError::Auth { status, message },
            404 => ClientError::NotFound(message),
            409 => ClientError::StateConflict { message },
            500..=599 => ClientError::Server { status, message },
            _ => ClientError::Network(format!("unexpected status {}: {}", status, message)),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
