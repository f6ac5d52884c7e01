//! Notification delivery to verified endpoints

use crate::store::load_endpoint;
use crate::url_policy;
use crate::{
    HttpTransport, NewNotificationRecord, RecordStore, Result, TransportRequest, WebhookConfig,
    WebhookEndpoint, WebhookError, WebhookNotification,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Longest response body kept on a rejected delivery
const MAX_DIAGNOSTIC_BODY: usize = 1024;

/// Sends notifications and records each delivery that got a response
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn HttpTransport>,
    config: WebhookConfig,
}

impl NotificationDispatcher {
    /// Create a dispatcher using the configured method and timeout
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn HttpTransport>,
        config: WebhookConfig,
    ) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    /// Deliver a notification to an endpoint.
    ///
    /// Only the id of `endpoint` is used; its status and URL are re-read
    /// from the store. A delivery record is written as soon as any response
    /// arrives, before the status code is looked at.
    pub async fn notify(
        &self,
        endpoint: &WebhookEndpoint,
        notification: &WebhookNotification,
    ) -> Result<()> {
        let target = load_endpoint(self.store.as_ref(), endpoint.id).await?;

        if !target.is_activated() {
            debug!(endpoint_id = %target.id, status = %target.status, "Refusing to notify");
            return Err(WebhookError::NotActivated(target.id));
        }

        let body = notification.to_bytes()?;
        let url = url_policy::notification_url(&target.url)?;

        debug!(
            endpoint_id = %target.id,
            event_uuid = %notification.event_uuid,
            method = %self.config.notification_method,
            url = %url,
            "Sending notification"
        );
        let request = TransportRequest::new(self.config.notification_method.clone(), url)
            .header("Content-Type", "application/json")
            .body(body);

        let response = self
            .transport
            .send(request, self.config.timeout)
            .await
            .map_err(|e| {
                warn!(endpoint_id = %target.id, error = %e, "Notification request failed");
                WebhookError::DeliveryTransport(e)
            })?;

        let record = self
            .store
            .insert_notification(NewNotificationRecord {
                endpoint_id: target.id,
                notification: notification.clone(),
            })
            .await
            .map_err(|e| {
                error!(endpoint_id = %target.id, error = %e, "Failed to record notification");
                WebhookError::Persistence(e)
            })?;

        let status = response.status();
        if status >= 400 {
            let body = response
                .text_lossy()
                .map(|text| truncate_string(&text, MAX_DIAGNOSTIC_BODY));
            warn!(
                endpoint_id = %target.id,
                record_id = record.id,
                status,
                body = body.as_deref().unwrap_or(""),
                "Endpoint rejected notification"
            );
            return Err(WebhookError::DeliveryRejected { status, body });
        }

        info!(
            endpoint_id = %target.id,
            record_id = record.id,
            status,
            "Notification delivered"
        );
        Ok(())
    }
}

/// Truncate a string to at most `max_len` bytes on a char boundary
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
