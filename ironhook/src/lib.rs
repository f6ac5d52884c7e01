//! Webhook endpoint management
//!
//! This crate registers third-party webhook endpoints, proves that the
//! registrant controls them through a challenge-response exchange, and
//! delivers event notifications to them while keeping a record of every
//! delivery that reached the endpoint.
//!
//! # Features
//!
//! - **Endpoint lifecycle**: endpoints start `Unverified`, become `Verified`
//!   after answering a challenge, and fall back to `Unverified` when their
//!   URL changes
//! - **Verification**: `GET <url>/verification?id=<uuid>` must echo the uuid
//! - **Delivery**: JSON notifications to `<url>/notification`, recorded as
//!   soon as the endpoint responds
//! - **Pluggable storage and transport**: [`RecordStore`] and
//!   [`HttpTransport`] traits, with in-memory and reqwest implementations
//!
//! # Example: Registering and Notifying
//!
//! ```rust,no_run
//! use ironhook::{WebhookConfig, WebhookEndpoint, WebhookNotification, WebhookRegistry};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = WebhookRegistry::new(WebhookConfig::default())?;
//!
//!     let endpoint = registry
//!         .create(WebhookEndpoint::new("https://api.example.com/hooks"))
//!         .await?;
//!
//!     // The receiver must answer GET /hooks/verification?id=<uuid> with <uuid>
//!     let endpoint = registry.verify(endpoint.id).await?;
//!
//!     let notification = WebhookNotification::new(Uuid::new_v4())
//!         .with_topic("order.created")
//!         .with_body(r#"{"order_id": 42}"#);
//!     registry.notify(&endpoint, &notification).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: Answering a Challenge
//!
//! ```rust
//! use ironhook::answer_challenge;
//! use url::Url;
//!
//! let url = Url::parse("https://api.example.com/hooks/verification?id=abcd").unwrap();
//! assert_eq!(answer_challenge(&url).as_deref(), Some("abcd"));
//! ```

mod config;
mod delivery;
mod endpoint;
mod error;
mod notification;
mod receiver;
mod registry;
mod store;
mod transport;
pub mod url_policy;
mod verification;

#[cfg(test)]
mod testing;

pub use config::{ENV_PREFIX, WebhookConfig, WebhookConfigBuilder};
pub use delivery::NotificationDispatcher;
pub use endpoint::{EndpointStatus, StatusEvent, WebhookEndpoint};
pub use error::{ErrorKind, StoreError, TransportError, WebhookError};
pub use notification::{NewNotificationRecord, NotificationRecord, WebhookNotification};
pub use receiver::{answer_challenge, parse_notification};
pub use registry::WebhookRegistry;
pub use store::{MemoryStore, RecordStore, StoreResult};
pub use transport::{
    DEFAULT_MAX_BODY_SIZE, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse,
};
pub use verification::EndpointVerifier;

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
