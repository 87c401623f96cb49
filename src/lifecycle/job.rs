//! Job posting status lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job posting status
///
/// Which changes are allowed is decided by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    Published,
    Active,
    Expired,
    Closed,
    Archived,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
            JobStatus::Closed => "closed",
            JobStatus::Archived => "archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == JobStatus::Archived
    }

    pub fn accepts_applications(&self) -> bool {
        matches!(self, JobStatus::Published | JobStatus::Active)
    }

    /// Statuses a posting usually moves to next
    ///
    /// A hint for building menus only. The server owns the posting rules, so
    /// a status missing from this list can still be requested.
    pub fn suggested_next(&self) -> &'static [JobStatus] {
        use JobStatus::*;
        match self {
            Draft => &[Published, Archived],
            Published => &[Active, Closed],
            Active => &[Closed, Expired],
            Expired => &[Active, Archived],
            Closed => &[Archived],
            Archived => &[],
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
