//! Error types for endpoint registration, verification and delivery

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during webhook operations
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The endpoint URL was empty
    #[error("Endpoint URL is empty; retry with a non-empty URL")]
    EmptyUrl,

    /// The endpoint URL is not absolute
    #[error("Endpoint URL has no scheme; retry with \"https://\" prepended")]
    MissingScheme,

    /// The endpoint URL uses something other than http/https
    #[error("Unsupported endpoint URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The endpoint URL has a valid scheme but no host
    #[error("Endpoint URL has an empty host")]
    EmptyHost,

    /// The endpoint URL could not be parsed for another reason
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(url::ParseError),

    /// No endpoint id was supplied
    #[error("Endpoint id is empty; retry with the id returned at creation")]
    MissingId,

    /// The requested record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The endpoint did not answer the verification challenge correctly
    #[error("Endpoint verification failed: {0}")]
    VerificationFailed(String),

    /// The endpoint has not been verified yet
    #[error("Endpoint {0} has not been activated; verify it first")]
    NotActivated(Uuid),

    /// The notification request could not be sent or got no response
    #[error("Notification delivery failed: {0}")]
    DeliveryTransport(#[from] TransportError),

    /// The endpoint answered the notification with an error status
    #[error("Endpoint rejected the notification with HTTP {status}")]
    DeliveryRejected { status: u16, body: Option<String> },

    /// The record store failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    Payload(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Payload(err.to_string())
    }
}

/// Broad classification of a [`WebhookError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: URL or id
    Validation,
    /// No such endpoint or notification
    NotFound,
    /// The challenge response did not match
    VerificationFailed,
    /// Delivery attempted before verification
    NotActivated,
    /// No response was obtained from the endpoint
    DeliveryTransport,
    /// The endpoint responded with an error status
    DeliveryRejected,
    /// The record store failed
    Persistence,
    /// Serialization or configuration fault
    Internal,
}

impl ErrorKind {
    /// Whether the caller can recover by retrying with different input
    /// (another URL, another id, verifying first...)
    pub fn is_retryable_with_new_input(&self) -> bool {
        !matches!(self, Self::Persistence | Self::Internal)
    }
}

impl WebhookError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyUrl
            | Self::MissingScheme
            | Self::UnsupportedScheme(_)
            | Self::EmptyHost
            | Self::InvalidUrl(_)
            | Self::MissingId => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::VerificationFailed(_) => ErrorKind::VerificationFailed,
            Self::NotActivated(_) => ErrorKind::NotActivated,
            Self::DeliveryTransport(_) => ErrorKind::DeliveryTransport,
            Self::DeliveryRejected { .. } => ErrorKind::DeliveryRejected,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Payload(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Errors reported by a [`RecordStore`](crate::RecordStore) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row with this id already exists
    #[error("Duplicate record: {0}")]
    Duplicate(Uuid),

    /// A row expected to exist is gone
    #[error("Missing record: {0}")]
    Missing(Uuid),

    /// The storage backend failed
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors reported by an [`HttpTransport`](crate::HttpTransport) implementation
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No response arrived within the timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Connecting or sending failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Other(String),
}
