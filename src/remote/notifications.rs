//! Notification endpoints

use crate::error::Result;
use crate::model::{Notification, NotificationFilter, NotificationStats, Page, UnreadCount};
use crate::remote::client::{path_id, ResourceClient, NO_BODY, NO_FILTER};
use crate::remote::transport::Method;

#[derive(Debug, Clone)]
pub struct NotificationsApi {
    client: ResourceClient,
}

impl NotificationsApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &NotificationFilter) -> Result<Page<Notification>> {
        self.client.get_page("/notifications", Some(filter)).await
    }

    pub async fn unread_count(&self) -> Result<UnreadCount> {
        self.client.get("/notifications/unread-count", NO_FILTER).await
    }

    pub async fn stats(&self) -> Result<NotificationStats> {
        self.client.get("/notifications/stats", NO_FILTER).await
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<()> {
        let path = format!("/notifications/{}/read", path_id(notification_id)?);
        self.client.send_unit(Method::Patch, &path, NO_BODY).await
    }

    pub async fn mark_unread(&self, notification_id: &str) -> Result<()> {
        let path = format!("/notifications/{}/unread", path_id(notification_id)?);
        self.client.send_unit(Method::Patch, &path, NO_BODY).await
    }

    pub async fn mark_all_read(&self) -> Result<()> {
        self.client
            .send_unit(Method::Patch, "/notifications/read-all", NO_BODY)
            .await
    }

    pub async fn delete(&self, notification_id: &str) -> Result<()> {
        let path = format!("/notifications/{}", path_id(notification_id)?);
        self.client.send_unit(Method::Delete, &path, NO_BODY).await
    }
}
