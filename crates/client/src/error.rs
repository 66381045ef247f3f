//! Unified error handling for the client.

use thiserror::Error;

use time_capsule_core::{CapsuleCodeError, DisclosureError, DraftErrors, PasswordError};

use crate::storage::StorageError;

/// Errors surfaced to the calling flow.
///
/// Only [`ClientError::Unauthorized`] carries an automatic side effect (the
/// session is cleared and a navigation signal is emitted before it is
/// returned). Everything else is reported for the caller to display.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A capsule code failed format validation.
    #[error("invalid capsule code: {0}")]
    InvalidFormat(#[from] CapsuleCodeError),

    /// A capsule's open time could not be parsed.
    #[error(transparent)]
    InvalidTimestamp(#[from] DisclosureError),

    /// A capsule draft failed form validation.
    #[error("invalid capsule: {0}")]
    InvalidDraft(#[from] DraftErrors),

    /// The admin password failed form validation.
    #[error("invalid password: {0}")]
    InvalidPassword(#[from] PasswordError),

    /// The backend answered with `{success: false, error}`.
    #[error("{message} ({code})")]
    Business {
        /// Machine-readable error code from the envelope.
        code: String,
        /// Human-readable message from the envelope.
        message: String,
    },

    /// HTTP 401. The session has been invalidated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP 500.
    #[error("server error: {0}")]
    Server(String),

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Message from the error body, or a generic fallback.
        message: String,
    },

    /// An endpoint URL could not be built from the configured base.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Durable storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error invalidated the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this error was raised locally before any request was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::InvalidTimestamp(_)
                | Self::InvalidDraft(_)
                | Self::InvalidPassword(_)
        )
    }
}
