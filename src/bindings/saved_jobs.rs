//! Saved-job bindings

use crate::bindings::mutation::{MutationHook, Outcome};
use crate::bindings::query::Query;
use crate::cache::{Mutation, QueryCache};
use crate::keys;
use crate::model::{
    Page, SaveJob, SavedJob, SavedJobAnalytics, SavedJobFilter, SavedJobStats, SavedJobStatus,
    SavedJobUpdate,
};
use crate::remote::SavedJobsApi;

#[derive(Debug, Clone)]
pub struct SavedJobBindings {
    api: SavedJobsApi,
    cache: QueryCache,
}

impl SavedJobBindings {
    pub(crate) fn new(api: SavedJobsApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn list(&self, filter: SavedJobFilter) -> Query<Page<SavedJob>> {
        let api = self.api.clone();
        let key = keys::saved_jobs::list(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.list(&filter).await }
        })
        .await
    }

    /// Whether the current user saved `job_id`
    pub async fn is_saved(&self, job_id: &str) -> Query<SavedJobStatus> {
        let api = self.api.clone();
        let job_id = job_id.to_string();
        Query::mount(&self.cache, keys::saved_jobs::is_saved(&job_id), move || {
            let api = api.clone();
            let job_id = job_id.clone();
            async move { api.check(&job_id).await }
        })
        .await
    }

    pub async fn detail(&self, saved_job_id: &str) -> Query<SavedJob> {
        let api = self.api.clone();
        let saved_job_id = saved_job_id.to_string();
        let key = keys::saved_jobs::detail(&saved_job_id);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let saved_job_id = saved_job_id.clone();
            async move { api.get(&saved_job_id).await }
        })
        .await
    }

    pub async fn stats(&self) -> Query<SavedJobStats> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::saved_jobs::stats(), move || {
            let api = api.clone();
            async move { api.stats().await }
        })
        .await
    }

    pub async fn analytics(&self) -> Query<SavedJobAnalytics> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::saved_jobs::analytics(), move || {
            let api = api.clone();
            async move { api.analytics().await }
        })
        .await
    }

    pub fn save(&self) -> MutationHook<SaveJob, SavedJob> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |request: SaveJob| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.save(&request).await, |saved| {
                    vec![Mutation::SaveJob {
                        job_id: saved.job_id.clone(),
                    }]
                })
            }
        })
    }

    /// Input: the job id, not the saved-job id
    pub fn unsave(&self) -> MutationHook<String, ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |job_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.unsave(&job_id).await, |_| {
                    vec![Mutation::UnsaveJob { job_id }]
                })
            }
        })
    }

    pub fn update(&self) -> MutationHook<SavedJobUpdate, SavedJob> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |update: SavedJobUpdate| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.update(&update).await, |saved| {
                    vec![Mutation::UpdateSavedJob {
                        saved_job_id: saved.id.clone(),
                    }]
                })
            }
        })
    }

    /// Record that the user applied to a saved job; cannot be undone
    pub fn mark_applied(&self) -> MutationHook<String, SavedJob> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |saved_job_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.mark_applied(&saved_job_id).await, |_| {
                    vec![Mutation::MarkSavedJobApplied { saved_job_id }]
                })
            }
        })
    }
}
