//! Job posting endpoints

use crate::error::Result;
use crate::lifecycle::JobStatus;
use crate::model::{CreateJob, Job, JobFilter, JobStats, JobUpdate, Page};
use crate::remote::client::{path_id, ResourceClient, NO_BODY, NO_FILTER};
use crate::remote::transport::Method;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct JobsApi {
    client: ResourceClient,
}

#[derive(Serialize)]
struct StatusBody {
    status: JobStatus,
}

impl JobsApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &JobFilter) -> Result<Page<Job>> {
        self.client.get_page("/jobs", Some(filter)).await
    }

    pub async fn get(&self, job_id: &str) -> Result<Job> {
        let path = format!("/jobs/{}", path_id(job_id)?);
        self.client.get(&path, NO_FILTER).await
    }

    /// Postings of the signed-in school
    pub async fn mine(&self, filter: &JobFilter) -> Result<Page<Job>> {
        self.client.get_page("/jobs/my-jobs", Some(filter)).await
    }

    pub async fn stats(&self) -> Result<JobStats> {
        self.client.get("/jobs/stats", NO_FILTER).await
    }

    pub async fn recommendations(&self) -> Result<Vec<Job>> {
        self.client.get("/jobs/recommendations", NO_FILTER).await
    }

    pub async fn create(&self, job: &CreateJob) -> Result<Job> {
        self.client.send(Method::Post, "/jobs", Some(job)).await
    }

    pub async fn update(&self, update: &JobUpdate) -> Result<Job> {
        let path = format!("/jobs/{}", path_id(&update.job_id)?);
        self.client.send(Method::Put, &path, Some(update)).await
    }

    pub async fn change_status(&self, job_id: &str, status: JobStatus) -> Result<Job> {
        let path = format!("/jobs/{}/status", path_id(job_id)?);
        self.client
            .send(Method::Patch, &path, Some(&StatusBody { status }))
            .await
    }

    pub async fn delete(&self, job_id: &str) -> Result<()> {
        let path = format!("/jobs/{}", path_id(job_id)?);
        self.client.send_unit(Method::Delete, &path, NO_BODY).await
    }
}
