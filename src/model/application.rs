//! Job application entity, filters and mutation payloads

use crate::error::ClientError;
use crate::keys::QueryFilter;
use crate::lifecycle::ApplicationStatus;
use crate::model::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate's application to a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub withdrawn_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_withdrawn: bool,
}

impl JobApplication {
    /// Create a freshly submitted application
    pub fn new(id: String, job_id: String, applicant_id: String) -> Self {
        Self {
            id,
            job_id,
            applicant_id,
            status: ApplicationStatus::Pending,
            cover_letter: None,
            notes: None,
            rejection_reason: None,
            created_at: Utc::now(),
            reviewed_at: None,
            interview_date: None,
            withdrawn_at: None,
            is_withdrawn: false,
        }
    }

    /// Check the cross-field invariants the server guarantees
    ///
    /// - `is_withdrawn` iff status is `withdrawn`
    /// - `reviewed_at` set iff a reviewer moved the application out of `pending`
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.is_withdrawn != (self.status == ApplicationStatus::Withdrawn) {
            return Err(format!(
                "application {}: isWithdrawn={} but status={}",
                self.id, self.is_withdrawn, self.status
            ));
        }

        let reviewed = self.status.was_reviewed();
        match (reviewed, self.reviewed_at.is_some()) {
            (Some(true), false) => Err(format!(
                "application {}: status {} requires reviewedAt",
                self.id, self.status
            )),
            (Some(false), true) => Err(format!(
                "application {}: pending application has reviewedAt",
                self.id
            )),
            // Withdrawn: may or may not have been reviewed before withdrawal
            _ => Ok(()),
        }
    }
}

/// Filter for application listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ApplicationFilter {
    pub fn status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
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

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }
}

impl QueryFilter for ApplicationFilter {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("status", self.status.map(|s| s.as_str().to_string())),
            ("search", self.search.clone()),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.map(|o| o.as_str().to_string())),
        ]
    }
}

/// Aggregate counts per status, computed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationStats {
    pub total: u64,
    pub pending: u64,
    pub reviewing: u64,
    pub shortlisted: u64,
    pub interviewed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub withdrawn: u64,
}

/// Payload for submitting a new application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplication {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

impl SubmitApplication {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            cover_letter: None,
            resume_url: None,
        }
    }

    pub fn with_cover_letter(mut self, cover_letter: impl Into<String>) -> Self {
        self.cover_letter = Some(cover_letter.into());
        self
    }
}

/// Body of a single status change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            notes: None,
            rejection_reason: None,
            interview_date: None,
        }
    }
}

/// Input for scheduling an interview
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleInterview {
    pub application_id: String,
    pub interview_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Input for rejecting an application
#[derive(Debug, Clone, PartialEq)]
pub struct RejectApplication {
    pub application_id: String,
    pub reason: Option<String>,
}

/// Apply one target status to many applications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdate {
    pub application_ids: Vec<String>,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Wire shape of the bulk status endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkUpdateResponse {
    pub updated: Vec<JobApplication>,
    pub failed: Vec<BulkFailure>,
}

/// One rejected item of a bulk update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub id: String,
    /// Machine-readable reason: `VALIDATION`, `STATE_CONFLICT`, `NOT_FOUND`, `FORBIDDEN`
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl BulkFailure {
    pub fn to_error(&self) -> ClientError {
        match self.code.as_str() {
            "STATE_CONFLICT" | "INVALID_TRANSITION" => ClientError::conflict(self.message.clone()),
            "NOT_FOUND" => ClientError::NotFound(self.message.clone()),
            "FORBIDDEN" | "UNAUTHORIZED" => ClientError::Auth {
                status: 403,
                message: self.message.clone(),
            },
            _ => ClientError::validation(self.message.clone()),
        }
    }
}

/// Per-item outcome of a bulk update
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    pub application_id: String,
    pub result: Result<JobApplication, ClientError>,
}

/// Result of a bulk status update, one entry per requested id, in request order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkUpdateOutcome {
    pub items: Vec<BulkItemResult>,
}

impl BulkUpdateOutcome {
    /// Pair the server response with the requested ids
    ///
    /// Ids the server reported neither as updated nor as failed are recorded as
    /// decode failures rather than silently treated as successful.
    pub fn from_response(requested: &[String], response: BulkUpdateResponse) -> Self {
        let items = requested
            .iter()
            .map(|id| {
                let result = if let Some(app) = response.updated.iter().find(|a| &a.id == id) {
                    Ok(app.clone())
                } else if let Some(failure) = response.failed.iter().find(|f| &f.id == id) {
                    Err(failure.to_error())
                } else {
                    Err(ClientError::Decode(format!(
                        "bulk response did not mention application {}",
                        id
                    )))
                };
                BulkItemResult {
                    application_id: id.clone(),
                    result,
                }
            })
            .collect();
        Self { items }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &JobApplication> {
        self.items.iter().filter_map(|i| i.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ClientError)> {
        self.items
            .iter()
            .filter_map(|i| i.result.as_ref().err().map(|e| (i.application_id.as_str(), e)))
    }

    pub fn any_succeeded(&self) -> bool {
        self.succeeded().next().is_some()
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(|i| i.result.is_ok())
    }

    pub fn result_for(&self, application_id: &str) -> Option<&Result<JobApplication, ClientError>> {
        self.items
            .iter()
            .find(|i| i.application_id == application_id)
            .map(|i| &i.result)
    }
}
