//! Domain model for the recruitment platform
//!
//! Entities mirror what the server returns (camelCase on the wire). The client
//! never originates entity identity and never mutates server-derived counters;
//! both only change by re-fetching.

pub mod application;
pub mod dashboard;
pub mod job;
pub mod notification;
pub mod saved_job;

pub use application::{
    ApplicationFilter, ApplicationStats, BulkFailure, BulkItemResult, BulkStatusUpdate,
    BulkUpdateOutcome, BulkUpdateResponse, JobApplication, RejectApplication,
    ScheduleInterview, StatusUpdate, SubmitApplication,
};
pub use crate::lifecycle::{ApplicationStatus, JobStatus};
pub use dashboard::DashboardStats;
pub use job::{CreateJob, Job, JobFilter, JobStats, JobUpdate};
pub use notification::{
    Notification, NotificationCategory, NotificationFilter, NotificationPriority,
    NotificationStats, UnreadCount,
};
pub use saved_job::{
    SaveJob, SavedJob, SavedJobAnalytics, SavedJobFilter, SavedJobPriority, SavedJobStats,
    SavedJobStatus, SavedJobUpdate, TagCount,
};

use serde::{Deserialize, Serialize};

/// Pagination block returned by list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    /// Pagination for a single, complete page
    pub fn single(total: u64) -> Self {
        Self {
            page: 1,
            limit: u32::try_from(total).unwrap_or(u32::MAX),
            total,
            total_pages: 1,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_limit_saturates() {
        assert_eq!(Pagination::single(3).limit, 3);

        let huge = Pagination::single(u64::from(u32::MAX) + 10);
        assert_eq!(huge.limit, u32::MAX);
        assert_eq!(huge.total, u64::from(u32::MAX) + 10);
    }
}
