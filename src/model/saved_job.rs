//! Saved (bookmarked) jobs

use crate::keys::filter::join_set;
use crate::keys::QueryFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Priority a candidate assigns to a saved job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavedJobPriority {
    Low,
    Medium,
    High,
}

impl SavedJobPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavedJobPriority::Low => "low",
            SavedJobPriority::Medium => "medium",
            SavedJobPriority::High => "high",
        }
    }
}

impl Default for SavedJobPriority {
    fn default() -> Self {
        SavedJobPriority::Medium
    }
}

/// A job bookmarked by an applicant
///
/// `is_applied` only moves from false to true. [`SavedJobUpdate`] has no field
/// for it; the single way to set it is the dedicated "mark applied" mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJob {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    #[serde(default)]
    pub priority: SavedJobPriority,
    #[serde(default)]
    pub is_applied: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reminder_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Answer of the "is this job saved?" endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedJobStatus {
    pub is_saved: bool,
    pub saved_job_id: Option<String>,
}

/// Payload for saving a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJob {
    pub job_id: String,
    pub priority: SavedJobPriority,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<DateTime<Utc>>,
}

impl SaveJob {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            priority: SavedJobPriority::default(),
            tags: BTreeSet::new(),
            notes: None,
            reminder_date: None,
        }
    }

    pub fn priority(mut self, priority: SavedJobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// Partial update of a saved job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobUpdate {
    #[serde(skip)]
    pub saved_job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<SavedJobPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<DateTime<Utc>>,
}

/// Filter for saved-job listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedJobFilter {
    pub priority: Option<SavedJobPriority>,
    pub is_applied: Option<bool>,
    pub tags: BTreeSet<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SavedJobFilter {
    pub fn priority(mut self, priority: SavedJobPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn applied(mut self, is_applied: bool) -> Self {
        self.is_applied = Some(is_applied);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl QueryFilter for SavedJobFilter {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("priority", self.priority.map(|p| p.as_str().to_string())),
            ("isApplied", self.is_applied.map(|a| a.to_string())),
            ("tags", join_set(&self.tags)),
            ("search", self.search.clone()),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
        ]
    }
}

/// Saved-job counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedJobStats {
    pub total: u64,
    pub applied: u64,
    pub not_applied: u64,
    pub high_priority: u64,
    pub with_reminders: u64,
}

/// Tag usage count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Saved-job analytics computed by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedJobAnalytics {
    pub saved_last_30_days: u64,
    pub application_rate: f64,
    pub top_tags: Vec<TagCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_a_set() {
        let a = SaveJob::new("J1").tag("remote").tag("math");
        let b = SaveJob::new("J1").tag("math").tag("remote").tag("math");
        assert_eq!(a, b);
        assert_eq!(a.tags.len(), 2);
    }

    #[test]
    fn test_filter_tag_order_irrelevant() {
        let a = SavedJobFilter::default().tag("b").tag("a");
        let b = SavedJobFilter::default().tag("a").tag("b");
        assert_eq!(a.normalized(), b.normalized());
        assert_eq!(a.normalized().get("tags"), Some("a,b"));
    }

    #[test]
    fn test_update_has_no_applied_flag() {
        let update = SavedJobUpdate {
            saved_job_id: "S1".to_string(),
            priority: Some(SavedJobPriority::High),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("isApplied").is_none());
        assert_eq!(json["priority"], "high");
    }

    #[test]
    fn test_saved_job_defaults() {
        let json = serde_json::json!({
            "id": "S1",
            "jobId": "J1",
            "applicantId": "U1",
            "createdAt": "2026-03-01T12:00:00Z"
        });
        let saved: SavedJob = serde_json::from_value(json).unwrap();
        assert_eq!(saved.priority, SavedJobPriority::Medium);
        assert!(!saved.is_applied);
        assert!(saved.tags.is_empty());
    }
}
