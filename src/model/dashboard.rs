//! Dashboard aggregates

use serde::{Deserialize, Serialize};

/// Cross-family counters shown on the dashboard; all server-computed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub active_jobs: u64,
    pub total_applications: u64,
    pub pending_applications: u64,
    pub interviews_scheduled: u64,
    pub saved_jobs: u64,
    pub unread_notifications: u64,
}
