//! Webhook endpoint registry

use crate::store::{load_endpoint, save_endpoint};
use crate::url_policy;
use crate::{
    EndpointVerifier, HttpTransport, MemoryStore, NotificationDispatcher, NotificationRecord,
    RecordStore, ReqwestTransport, Result, StatusEvent, WebhookConfig, WebhookEndpoint,
    WebhookError, WebhookNotification,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Registry owning the lifecycle of webhook endpoints.
///
/// Endpoints are created `Unverified`, promoted by [`verify`](Self::verify),
/// and reset to `Unverified` whenever their URL changes. Notifications are
/// only delivered to activated endpoints.
#[derive(Clone)]
pub struct WebhookRegistry {
    config: WebhookConfig,
    store: Arc<dyn RecordStore>,
    verifier: EndpointVerifier,
    dispatcher: NotificationDispatcher,
}

impl WebhookRegistry {
    /// Create a registry with an in-memory store and a reqwest transport
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| WebhookError::Config(format!("HTTP client: {}", e)))?
            .with_max_body_size(config.max_response_size);
        Ok(Self::with_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(transport),
        ))
    }

    /// Create a registry from explicit collaborators
    pub fn with_parts(
        config: WebhookConfig,
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let verifier = EndpointVerifier::new(store.clone(), transport.clone(), config.timeout);
        let dispatcher = NotificationDispatcher::new(store.clone(), transport, config.clone());
        Self {
            config,
            store,
            verifier,
            dispatcher,
        }
    }

    /// Register a new endpoint.
    ///
    /// The status is always forced to `Unverified` and a fresh id is assigned
    /// when none was supplied. The URL is validated before anything is stored.
    pub async fn create(&self, endpoint: WebhookEndpoint) -> Result<WebhookEndpoint> {
        url_policy::validate(&endpoint.url)?;

        let mut endpoint = endpoint;
        endpoint.apply(StatusEvent::Registered);
        if !endpoint.has_id() {
            endpoint.id = Uuid::new_v4();
        }

        info!(endpoint_id = %endpoint.id, url = %endpoint.url, "Creating endpoint");
        self.store.insert_endpoint(&endpoint).await?;
        Ok(endpoint)
    }

    /// Replace an endpoint's URL. A changed URL must be verified again.
    pub async fn update_url(&self, id: Uuid, url: impl Into<String>) -> Result<WebhookEndpoint> {
        let url = url.into();
        let mut endpoint = load_endpoint(self.store.as_ref(), id).await?;

        if endpoint.url == url {
            debug!(endpoint_id = %id, "URL unchanged, nothing to do");
            return Ok(endpoint);
        }

        url_policy::validate(&url)?;

        endpoint.url = url;
        endpoint.apply(StatusEvent::UrlChanged);
        save_endpoint(self.store.as_ref(), &endpoint).await?;

        info!(endpoint_id = %id, url = %endpoint.url, "Endpoint URL updated, verification required");
        Ok(endpoint)
    }

    /// Run the verification challenge against an endpoint
    pub async fn verify(&self, id: Uuid) -> Result<WebhookEndpoint> {
        self.verifier.verify(id).await
    }

    /// Fetch an endpoint
    pub async fn get(&self, id: Uuid) -> Result<WebhookEndpoint> {
        load_endpoint(self.store.as_ref(), id).await
    }

    /// Remove an endpoint
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(WebhookError::MissingId);
        }
        if !self.store.delete_endpoint(id).await? {
            return Err(WebhookError::NotFound(format!("endpoint {}", id)));
        }

        info!(endpoint_id = %id, "Endpoint deleted");
        Ok(())
    }

    /// All registered endpoints, in registration order
    pub async fn list_endpoints(&self) -> Result<Vec<WebhookEndpoint>> {
        Ok(self.store.find_all_endpoints().await?)
    }

    /// Deliver a notification to a verified endpoint
    pub async fn notify(
        &self,
        endpoint: &WebhookEndpoint,
        notification: &WebhookNotification,
    ) -> Result<()> {
        self.dispatcher.notify(endpoint, notification).await
    }

    /// The notification most recently recorded for an endpoint
    pub async fn last_notification_sent(&self, id: Uuid) -> Result<WebhookNotification> {
        Ok(self.last_delivery_record(id).await?.notification)
    }

    /// The delivery record most recently written for an endpoint
    pub async fn last_delivery_record(&self, id: Uuid) -> Result<NotificationRecord> {
        if id.is_nil() {
            return Err(WebhookError::MissingId);
        }

        self.store
            .find_latest_notification(id)
            .await?
            .ok_or_else(|| WebhookError::NotFound(format!("notifications for endpoint {}", id)))
    }

    /// Get the configuration
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}
