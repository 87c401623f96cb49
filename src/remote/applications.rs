//! Job application endpoints

use crate::error::{ClientError, Result};
use crate::model::{
    ApplicationFilter, ApplicationStats, BulkStatusUpdate, BulkUpdateResponse, JobApplication,
    Page, StatusUpdate, SubmitApplication,
};
use crate::remote::client::{path_id, ResourceClient, NO_BODY, NO_FILTER};
use crate::remote::transport::Method;

#[derive(Debug, Clone)]
pub struct ApplicationsApi {
    client: ResourceClient,
}

impl ApplicationsApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, application_id: &str) -> Result<JobApplication> {
        let path = format!("/jobs/applications/{}", path_id(application_id)?);
        self.client.get(&path, NO_FILTER).await
    }

    pub async fn list(&self, filter: &ApplicationFilter) -> Result<Page<JobApplication>> {
        self.client.get_page("/jobs/applications", Some(filter)).await
    }

    pub async fn by_job(
        &self,
        job_id: &str,
        filter: &ApplicationFilter,
    ) -> Result<Page<JobApplication>> {
        let path = format!("/jobs/{}/applications", path_id(job_id)?);
        self.client.get_page(&path, Some(filter)).await
    }

    /// Applications submitted by the signed-in applicant
    pub async fn mine(&self, filter: &ApplicationFilter) -> Result<Page<JobApplication>> {
        self.client
            .get_page("/jobs/applications/my-applications", Some(filter))
            .await
    }

    pub async fn stats(&self) -> Result<ApplicationStats> {
        self.client.get("/jobs/applications/stats", NO_FILTER).await
    }

    pub async fn submit(&self, submission: &SubmitApplication) -> Result<JobApplication> {
        path_id(&submission.job_id)?;
        self.client
            .send(Method::Post, "/jobs/applications", Some(submission))
            .await
    }

    /// Request a status change; a 409 comes back as [`ClientError::StateConflict`]
    pub async fn update_status(
        &self,
        application_id: &str,
        update: &StatusUpdate,
    ) -> Result<JobApplication> {
        let path = format!("/jobs/applications/{}/status", path_id(application_id)?);
        self.client.send(Method::Patch, &path, Some(update)).await
    }

    pub async fn withdraw(&self, application_id: &str) -> Result<JobApplication> {
        let path = format!("/jobs/applications/{}/withdraw", path_id(application_id)?);
        self.client.send(Method::Patch, &path, NO_BODY).await
    }

    /// One status for many applications; the response lists updated and
    /// failed items separately
    ///
    /// Ids travel in the body, so they are not checked here; the server
    /// reports bad ones per item.
    pub async fn bulk_update_status(&self, update: &BulkStatusUpdate) -> Result<BulkUpdateResponse> {
        if update.application_ids.is_empty() {
            return Err(ClientError::validation("bulk update needs at least one application"));
        }
        self.client
            .send(Method::Patch, "/jobs/applications/bulk-status", Some(update))
            .await
    }
}
