//! In-app notifications

use crate::keys::QueryFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Application,
    Job,
    Interview,
    Message,
    System,
    #[serde(other)]
    Other,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Application => "application",
            NotificationCategory::Job => "job",
            NotificationCategory::Interview => "interview",
            NotificationCategory::Message => "message",
            NotificationCategory::System => "system",
            NotificationCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

/// A notification addressed to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

/// Filter for notification listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub category: Option<NotificationCategory>,
    pub priority: Option<NotificationPriority>,
    pub is_read: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl NotificationFilter {
    pub fn unread_only(mut self) -> Self {
        self.is_read = Some(false);
        self
    }

    pub fn category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl QueryFilter for NotificationFilter {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("category", self.category.map(|c| c.as_str().to_string())),
            ("priority", self.priority.map(|p| p.as_str().to_string())),
            ("isRead", self.is_read.map(|r| r.to_string())),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
        ]
    }
}

/// Unread notification count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnreadCount {
    pub count: u64,
}

/// Notification aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_category: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_maps_to_other() {
        let json = serde_json::json!({
            "id": "N1",
            "title": "Hello",
            "category": "promotion",
            "priority": "normal",
            "createdAt": "2026-04-01T08:00:00Z"
        });
        let n: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(n.category, NotificationCategory::Other);
        assert!(!n.is_read);
        assert!(n.action_url.is_none());
    }

    #[test]
    fn test_filter_normalization() {
        let filter = NotificationFilter::default()
            .unread_only()
            .category(NotificationCategory::Interview);
        assert_eq!(
            filter.normalized().to_string(),
            "category=interview&isRead=false"
        );
    }
}
