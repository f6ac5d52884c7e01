//! Record store abstraction and the in-memory implementation

use crate::{
    NewNotificationRecord, NotificationRecord, Result, StoreError, WebhookEndpoint, WebhookError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Result type for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for endpoints and delivery records.
///
/// Each call is expected to be atomic for the row it touches; nothing spans
/// calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new endpoint; fails with [`StoreError::Duplicate`] if the id exists
    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()>;

    /// Find a live endpoint by id
    async fn find_endpoint(&self, id: Uuid) -> StoreResult<Option<WebhookEndpoint>>;

    /// Overwrite an existing endpoint; fails with [`StoreError::Missing`] if absent
    async fn save_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()>;

    /// Delete an endpoint; returns whether a live row was removed
    async fn delete_endpoint(&self, id: Uuid) -> StoreResult<bool>;

    /// All live endpoints in store order
    async fn find_all_endpoints(&self) -> StoreResult<Vec<WebhookEndpoint>>;

    /// Append a delivery record, assigning its sequence number and timestamp
    async fn insert_notification(
        &self,
        record: NewNotificationRecord,
    ) -> StoreResult<NotificationRecord>;

    /// Most recently inserted delivery record for an endpoint
    async fn find_latest_notification(
        &self,
        endpoint_id: Uuid,
    ) -> StoreResult<Option<NotificationRecord>>;
}

/// Load a live endpoint, mapping a nil id and a missing row to their errors
pub(crate) async fn load_endpoint(store: &dyn RecordStore, id: Uuid) -> Result<WebhookEndpoint> {
    if id.is_nil() {
        return Err(WebhookError::MissingId);
    }

    match store.find_endpoint(id).await {
        Ok(Some(endpoint)) => Ok(endpoint),
        Ok(None) => Err(WebhookError::NotFound(format!("endpoint {}", id))),
        Err(e) => {
            error!(endpoint_id = %id, error = %e, "Failed to fetch endpoint");
            Err(e.into())
        }
    }
}

/// Overwrite a live endpoint; a row deleted in the meantime is `NotFound`
pub(crate) async fn save_endpoint(
    store: &dyn RecordStore,
    endpoint: &WebhookEndpoint,
) -> Result<()> {
    match store.save_endpoint(endpoint).await {
        Ok(()) => Ok(()),
        Err(StoreError::Missing(id)) => Err(WebhookError::NotFound(format!("endpoint {}", id))),
        Err(e) => {
            error!(endpoint_id = %endpoint.id, error = %e, "Failed to save endpoint");
            Err(e.into())
        }
    }
}

#[derive(Debug, Clone)]
struct EndpointRow {
    endpoint: WebhookEndpoint,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    endpoints: Vec<EndpointRow>,
    notifications: Vec<NotificationRecord>,
    next_notification_id: u64,
}

impl Tables {
    fn live_endpoint_mut(&mut self, id: Uuid) -> Option<&mut EndpointRow> {
        self.endpoints
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.endpoint.id == id)
    }
}

/// In-memory record store.
///
/// Rows keep insertion order. Deleted endpoints stay in the table with a
/// deletion marker and are invisible to every query.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delivery records, across all endpoints
    pub fn notification_count(&self) -> usize {
        self.tables.read().notifications.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.live_endpoint_mut(endpoint.id).is_some() {
            return Err(StoreError::Duplicate(endpoint.id));
        }
        tables.endpoints.push(EndpointRow {
            endpoint: endpoint.clone(),
            deleted_at: None,
        });
        Ok(())
    }

    async fn find_endpoint(&self, id: Uuid) -> StoreResult<Option<WebhookEndpoint>> {
        let tables = self.tables.read();
        Ok(tables
            .endpoints
            .iter()
            .find(|row| row.deleted_at.is_none() && row.endpoint.id == id)
            .map(|row| row.endpoint.clone()))
    }

    async fn save_endpoint(&self, endpoint: &WebhookEndpoint) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let row = tables
            .live_endpoint_mut(endpoint.id)
            .ok_or(StoreError::Missing(endpoint.id))?;
        row.endpoint = endpoint.clone();
        Ok(())
    }

    async fn delete_endpoint(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.live_endpoint_mut(id) {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_all_endpoints(&self) -> StoreResult<Vec<WebhookEndpoint>> {
        let tables = self.tables.read();
        Ok(tables
            .endpoints
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.endpoint.clone())
            .collect())
    }

    async fn insert_notification(
        &self,
        record: NewNotificationRecord,
    ) -> StoreResult<NotificationRecord> {
        let mut tables = self.tables.write();
        tables.next_notification_id += 1;
        let stored = NotificationRecord {
            id: tables.next_notification_id,
            endpoint_id: record.endpoint_id,
            notification: record.notification,
            created_at: Utc::now(),
        };
        tables.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn find_latest_notification(
        &self,
        endpoint_id: Uuid,
    ) -> StoreResult<Option<NotificationRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .notifications
            .iter()
            .rev()
            .find(|record| record.endpoint_id == endpoint_id)
            .cloned())
    }
}
