//! Saved-job endpoints

use crate::error::Result;
use crate::model::{
    Page, SaveJob, SavedJob, SavedJobAnalytics, SavedJobFilter, SavedJobStats, SavedJobStatus,
    SavedJobUpdate,
};
use crate::remote::client::{path_id, ResourceClient, NO_BODY, NO_FILTER};
use crate::remote::transport::Method;

#[derive(Debug, Clone)]
pub struct SavedJobsApi {
    client: ResourceClient,
}

impl SavedJobsApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &SavedJobFilter) -> Result<Page<SavedJob>> {
        self.client.get_page("/jobs/saved", Some(filter)).await
    }

    pub async fn get(&self, saved_job_id: &str) -> Result<SavedJob> {
        let path = format!("/jobs/saved/{}", path_id(saved_job_id)?);
        self.client.get(&path, NO_FILTER).await
    }

    /// Whether the signed-in applicant saved `job_id`
    pub async fn check(&self, job_id: &str) -> Result<SavedJobStatus> {
        let path = format!("/jobs/saved/check/{}", path_id(job_id)?);
        self.client.get(&path, NO_FILTER).await
    }

    pub async fn stats(&self) -> Result<SavedJobStats> {
        self.client.get("/jobs/saved/stats", NO_FILTER).await
    }

    pub async fn analytics(&self) -> Result<SavedJobAnalytics> {
        self.client.get("/jobs/saved/analytics", NO_FILTER).await
    }

    pub async fn save(&self, request: &SaveJob) -> Result<SavedJob> {
        path_id(&request.job_id)?;
        self.client.send(Method::Post, "/jobs/saved", Some(request)).await
    }

    /// Remove the bookmark for `job_id`
    pub async fn unsave(&self, job_id: &str) -> Result<()> {
        let path = format!("/jobs/saved/job/{}", path_id(job_id)?);
        self.client.send_unit(Method::Delete, &path, NO_BODY).await
    }

    pub async fn update(&self, update: &SavedJobUpdate) -> Result<SavedJob> {
        let path = format!("/jobs/saved/{}", path_id(&update.saved_job_id)?);
        self.client.send(Method::Put, &path, Some(update)).await
    }

    pub async fn mark_applied(&self, saved_job_id: &str) -> Result<SavedJob> {
        let path = format!("/jobs/saved/{}/applied", path_id(saved_job_id)?);
        self.client.send(Method::Patch, &path, NO_BODY).await
    }
}
