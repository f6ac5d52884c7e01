//! Webhook endpoint entity and its lifecycle

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a webhook endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    /// Registered but not yet proven to be controlled by the registrant
    #[default]
    Unverified,

    /// Taken out of service
    Suspended,

    /// Answered the verification challenge
    Verified,

    /// Verified and known to accept deliveries
    Healthy,
}

/// Events that drive [`EndpointStatus`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The endpoint was created
    Registered,

    /// The endpoint URL was replaced
    UrlChanged,

    /// The endpoint echoed its verification challenge
    VerificationSucceeded,
}

impl EndpointStatus {
    /// Whether notifications may be delivered to an endpoint in this status
    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Verified | Self::Healthy)
    }

    /// Apply a lifecycle event.
    ///
    /// | from \ event          | Registered | UrlChanged | VerificationSucceeded |
    /// |-----------------------|------------|------------|-----------------------|
    /// | Unverified, Suspended | Unverified | Unverified | Verified              |
    /// | Verified, Healthy     | Unverified | Unverified | unchanged             |
    pub fn apply(self, event: StatusEvent) -> Self {
        match (self, event) {
            (_, StatusEvent::Registered) | (_, StatusEvent::UrlChanged) => Self::Unverified,
            (Self::Verified | Self::Healthy, StatusEvent::VerificationSucceeded) => self,
            (Self::Unverified | Self::Suspended, StatusEvent::VerificationSucceeded) => {
                Self::Verified
            }
        }
    }

    /// Lowercase name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Suspended => "suspended",
            Self::Verified => "verified",
            Self::Healthy => "healthy",
        }
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered webhook endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    /// Unique endpoint ID; nil until assigned at creation
    #[serde(rename = "uuid")]
    pub id: Uuid,

    /// Base URL; verification and notification paths are appended to it
    pub url: String,

    /// Current lifecycle status
    pub status: EndpointStatus,
}

impl WebhookEndpoint {
    /// Create an endpoint for the given URL with no id yet
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            url: url.into(),
            status: EndpointStatus::Unverified,
        }
    }

    /// Create an endpoint with a caller chosen id
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Whether an id has been assigned
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// Whether notifications may be delivered to this endpoint
    pub fn is_activated(&self) -> bool {
        self.status.is_activated()
    }

    pub(crate) fn apply(&mut self, event: StatusEvent) {
        self.status = self.status.apply(event);
    }
}
