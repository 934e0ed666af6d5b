//! REST backend seam for the synchronizer.
//!
//! The store confirms every user action with the backend before touching
//! local state. [`NotificationApi`] is the seam; [`RestNotificationApi`]
//! is the production implementation over the authenticated HTTP client
//! (which also owns toast reporting for failed calls).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use glowdesk_client::error::ApiError;
use glowdesk_client::http::ApiClient;
use glowdesk_core::notification::Notification;
use glowdesk_core::types::DbId;

/// Response of `GET /notifications`: the full feed plus the backend's
/// unread counter.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Backend operations the synchronizer needs.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch_all(&self) -> Result<NotificationFeed, ApiError>;
    async fn mark_read(&self, id: DbId) -> Result<(), ApiError>;
    async fn mark_all_read(&self) -> Result<(), ApiError>;
    async fn delete(&self, id: DbId) -> Result<(), ApiError>;
    async fn clear_all(&self) -> Result<(), ApiError>;
}

/// Notification endpoints over the authenticated HTTP client.
pub struct RestNotificationApi {
    client: Arc<ApiClient>,
}

impl RestNotificationApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationApi for RestNotificationApi {
    async fn fetch_all(&self) -> Result<NotificationFeed, ApiError> {
        self.client.get("/notifications").await
    }

    async fn mark_read(&self, id: DbId) -> Result<(), ApiError> {
        self.client
            .put_empty(&format!("/notifications/{id}/read"))
            .await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.client.put_empty("/notifications/read-all").await
    }

    async fn delete(&self, id: DbId) -> Result<(), ApiError> {
        self.client.delete(&format!("/notifications/{id}")).await
    }

    async fn clear_all(&self) -> Result<(), ApiError> {
        self.client.delete("/notifications").await
    }
}
