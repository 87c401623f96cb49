//! Job posting bindings

use crate::bindings::mutation::{MutationHook, Outcome};
use crate::bindings::query::Query;
use crate::cache::{Mutation, QueryCache};
use crate::error::Result;
use crate::keys;
use crate::lifecycle::JobStatus;
use crate::model::{CreateJob, Job, JobFilter, JobStats, JobUpdate, Page};
use crate::remote::client::path_id;
use crate::remote::JobsApi;
use tracing::debug;

/// Requested status change for one posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusChange {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone)]
pub struct JobBindings {
    api: JobsApi,
    cache: QueryCache,
}

impl JobBindings {
    pub(crate) fn new(api: JobsApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn list(&self, filter: JobFilter) -> Query<Page<Job>> {
        let api = self.api.clone();
        let key = keys::jobs::list(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.list(&filter).await }
        })
        .await
    }

    pub async fn detail(&self, job_id: &str) -> Query<Job> {
        let api = self.api.clone();
        let job_id = job_id.to_string();
        Query::mount(&self.cache, keys::jobs::detail(&job_id), move || {
            let api = api.clone();
            let job_id = job_id.clone();
            async move { api.get(&job_id).await }
        })
        .await
    }

    pub async fn my_jobs(&self, filter: JobFilter) -> Query<Page<Job>> {
        let api = self.api.clone();
        let key = keys::jobs::mine(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.mine(&filter).await }
        })
        .await
    }

    pub async fn stats(&self) -> Query<JobStats> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::jobs::stats(), move || {
            let api = api.clone();
            async move { api.stats().await }
        })
        .await
    }

    pub async fn recommendations(&self) -> Query<Vec<Job>> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::jobs::recommendations(), move || {
            let api = api.clone();
            async move { api.recommendations().await }
        })
        .await
    }

    pub fn create(&self) -> MutationHook<CreateJob, Job> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |job: CreateJob| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.create(&job).await, |created| {
                    vec![Mutation::CreateJob {
                        job_id: created.id.clone(),
                    }]
                })
            }
        })
    }

    pub fn update(&self) -> MutationHook<JobUpdate, Job> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |update: JobUpdate| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.update(&update).await, |job| {
                    vec![Mutation::UpdateJob {
                        job_id: job.id.clone(),
                    }]
                })
            }
        })
    }

    /// Publish, close, archive ...
    ///
    /// Always sent to the server. A refused change refreshes the posting's
    /// scopes so the view shows the status the server actually holds.
    pub fn change_status(&self) -> MutationHook<JobStatusChange, Job> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |change: JobStatusChange| {
            let api = api.clone();
            async move { change_job_status(&api, change).await }
        })
    }

    pub fn delete(&self) -> MutationHook<String, ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |job_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.delete(&job_id).await, |_| {
                    vec![Mutation::DeleteJob { job_id }]
                })
            }
        })
    }
}

async fn change_job_status(api: &JobsApi, change: JobStatusChange) -> Outcome<Job> {
    let job_id = match path_id(&change.job_id) {
        Ok(id) => id.to_string(),
        Err(e) => return Outcome::failed(e, Vec::new()),
    };
    let refresh = vec![Mutation::ChangeJobStatus {
        job_id: job_id.clone(),
    }];

    let result: Result<Job> = api.change_status(&job_id, change.status).await;
    match result {
        Ok(job) => Outcome {
            result: Ok(job),
            effects: refresh,
        },
        Err(e) if e.is_state_conflict() => {
            debug!("Server refused job {} status change: {}", job_id, e);
            Outcome::failed(e, refresh)
        }
        Err(e) => Outcome::failed(e, Vec::new()),
    }
}
