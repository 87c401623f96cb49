//! Job posting entity, filters and mutation payloads

use crate::keys::QueryFilter;
use crate::lifecycle::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job posting owned by a school
///
/// `views_count` and `applicants_count` are derived by the server. They are
/// readable but have no setters: the only way they change on the client is a
/// re-fetch after invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub school_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    views_count: u64,
    #[serde(default)]
    applicants_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl Job {
    pub fn views_count(&self) -> u64 {
        self.views_count
    }

    pub fn applicants_count(&self) -> u64 {
        self.applicants_count
    }

    /// Whether candidates can currently apply
    pub fn accepts_applications(&self) -> bool {
        self.status.accepts_applications()
            && self.deadline.map_or(true, |deadline| deadline > Utc::now())
    }
}

/// Filter for job listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub school_id: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl JobFilter {
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn school(mut self, school_id: impl Into<String>) -> Self {
        self.school_id = Some(school_id.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl QueryFilter for JobFilter {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("status", self.status.map(|s| s.as_str().to_string())),
            ("schoolId", self.school_id.clone()),
            ("search", self.search.clone()),
            ("location", self.location.clone()),
            ("employmentType", self.employment_type.clone()),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
        ]
    }
}

/// Aggregate job counts for the current school
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStats {
    pub total: u64,
    pub draft: u64,
    pub published: u64,
    pub active: u64,
    pub expired: u64,
    pub closed: u64,
    pub archived: u64,
    pub total_views: u64,
    pub total_applicants: u64,
}

/// Payload for creating a job posting (created as draft)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update of a job posting; status changes go through the lifecycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(skip)]
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}
