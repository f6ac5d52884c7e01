//! Test doubles shared by the unit tests

use crate::{
    HttpTransport, MemoryStore, NewNotificationRecord, NotificationRecord, RecordStore,
    StoreError, StoreResult, TransportError, TransportRequest, TransportResponse,
    WebhookEndpoint,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

type Responder =
    dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Transport that answers from a closure and records every request
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<(TransportRequest, Duration)>>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every request with the given status and body
    pub(crate) fn always(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(TransportResponse::new(status, body.clone())))
    }

    /// Echoes the `id` query parameter, like a well-behaved receiver
    pub(crate) fn echo_id() -> Self {
        Self::new(|request| {
            let id = crate::answer_challenge(&request.url).unwrap_or_default();
            Ok(TransportResponse::new(200, id))
        })
    }

    pub(crate) fn unreachable() -> Self {
        Self::new(|_| Err(TransportError::Other("connection refused".into())))
    }

    pub(crate) fn calls(&self) -> Vec<(TransportRequest, Duration)> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(
        &self,
        request: TransportRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let response = (self.responder)(&request);
        self.calls.lock().push((request, timeout));
        response
    }
}

/// Store whose notification writes always fail
#[derive(Clone, Default)]
pub(crate) struct BrokenNotificationStore {
    inner: MemoryStore,
}

#[async_trait]
impl RecordStore for BrokenNotificationStore {
    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.inner.insert_endpoint(endpoint).await
    }

    async fn find_endpoint(&self, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        self.inner.find_endpoint(id).await
    }

    async fn save_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.inner.save_endpoint(endpoint).await
    }

    async fn delete_endpoint(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_endpoint(id).await
    }

    async fn find_all_endpoints(&self) -> StoreResult<Vec<WebhookEndpoint>> {
        self.inner.find_all_endpoints().await
    }

    async fn insert_notification(
        &self,
        _record: NewNotificationRecord,
    ) -> StoreResult<NotificationRecord> {
        Err(StoreError::Backend("notifications table is read-only".into()))
    }

    async fn find_latest_notification(
        &self,
        endpoint_id: Uuid,
    ) -> StoreResult<Option<NotificationRecord>> {
        self.inner.find_latest_notification(endpoint_id).await
    }
}

/// Store where every endpoint is deleted just before it is saved, as if a
/// concurrent `delete` won the race
#[derive(Clone, Default)]
pub(crate) struct VanishingStore {
    inner: MemoryStore,
}

#[async_trait]
impl RecordStore for VanishingStore {
    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.inner.insert_endpoint(endpoint).await
    }

    async fn find_endpoint(&self, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        self.inner.find_endpoint(id).await
    }

    async fn save_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        self.inner.delete_endpoint(endpoint.id).await?;
        self.inner.save_endpoint(endpoint).await
    }

    async fn delete_endpoint(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_endpoint(id).await
    }

    async fn find_all_endpoints(&self) -> StoreResult<Vec<WebhookEndpoint>> {
        self.inner.find_all_endpoints().await
    }

    async fn insert_notification(
        &self,
        record: NewNotificationRecord,
    ) -> StoreResult<NotificationRecord> {
        self.inner.insert_notification(record).await
    }

    async fn find_latest_notification(
        &self,
        endpoint_id: Uuid,
    ) -> StoreResult<Option<NotificationRecord>> {
        self.inner.find_latest_notification(endpoint_id).await
    }
}
