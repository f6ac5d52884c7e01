//! Notification payload and delivery record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event announcement sent to a verified endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookNotification {
    /// Identifier of the business event being announced
    pub event_uuid: Uuid,

    /// Free-form topic, may be empty
    pub topic: String,

    /// Free-form body, may be empty
    pub body: String,
}

impl WebhookNotification {
    /// Create a notification for the given event
    pub fn new(event_uuid: Uuid) -> Self {
        Self {
            event_uuid,
            topic: String::new(),
            body: String::new(),
        }
    }

    /// Set the topic
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Convert to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Persisted record of a notification sent to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Store-assigned sequence number, increasing with insertion order
    pub id: u64,

    /// Endpoint the notification was sent to
    pub endpoint_id: Uuid,

    /// The notification as it was sent
    pub notification: WebhookNotification,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// A delivery record that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotificationRecord {
    pub endpoint_id: Uuid,
    pub notification: WebhookNotification,
}
