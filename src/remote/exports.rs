//! Binary downloads
//!
//! Exports bypass both the JSON envelope and the query cache: the body is
//! returned as raw bytes.

use crate::error::Result;
use crate::model::JobFilter;
use crate::remote::client::{path_id, ResourceClient, NO_FILTER};

#[derive(Debug, Clone)]
pub struct ExportsApi {
    client: ResourceClient,
}

impl ExportsApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    /// Spreadsheet of every application to `job_id`
    pub async fn export_applications(&self, job_id: &str) -> Result<Vec<u8>> {
        let path = format!("/jobs/{}/applications/export", path_id(job_id)?);
        self.client.get_bytes(&path, NO_FILTER).await
    }

    /// The CV attached to an application
    pub async fn download_cv(&self, application_id: &str) -> Result<Vec<u8>> {
        let path = format!("/jobs/applications/{}/cv", path_id(application_id)?);
        self.client.get_bytes(&path, NO_FILTER).await
    }

    pub async fn export_jobs(&self, filter: &JobFilter) -> Result<Vec<u8>> {
        self.client.get_bytes("/jobs/export", Some(filter)).await
    }
}
