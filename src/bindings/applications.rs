//! Job application bindings
//!
//! Status changes go through [`ApplicationTransition`]. When the cache holds a
//! fresh copy of the application, an illegal move is refused before any
//! request is sent. Either way a conflict, local or reported by the server,
//! invalidates the application's detail so the view re-reads the real status.

use crate::bindings::mutation::{MutationHook, Outcome};
use crate::bindings::query::{fresh_cached, Query};
use crate::cache::{Mutation, QueryCache};
use crate::error::ClientError;
use crate::keys;
use crate::lifecycle::{ApplicationStatus, ApplicationTransition};
use crate::model::{
    ApplicationFilter, ApplicationStats, BulkItemResult, BulkStatusUpdate, BulkUpdateOutcome,
    JobApplication, Page, RejectApplication, ScheduleInterview, StatusUpdate, SubmitApplication,
};
use crate::remote::client::path_id;
use crate::remote::ApplicationsApi;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ApplicationBindings {
    api: ApplicationsApi,
    cache: QueryCache,
}

impl ApplicationBindings {
    pub(crate) fn new(api: ApplicationsApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn detail(&self, application_id: &str) -> Query<JobApplication> {
        let api = self.api.clone();
        let application_id = application_id.to_string();
        let key = keys::applications::detail(&application_id);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let application_id = application_id.clone();
            async move { api.get(&application_id).await }
        })
        .await
    }

    pub async fn list(&self, filter: ApplicationFilter) -> Query<Page<JobApplication>> {
        let api = self.api.clone();
        let key = keys::applications::list(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.list(&filter).await }
        })
        .await
    }

    /// Applications received by one job posting
    pub async fn by_job(&self, job_id: &str, filter: ApplicationFilter) -> Query<Page<JobApplication>> {
        let api = self.api.clone();
        let job_id = job_id.to_string();
        let key = keys::applications::by_job(&job_id, &filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let job_id = job_id.clone();
            let filter = filter.clone();
            async move { api.by_job(&job_id, &filter).await }
        })
        .await
    }

    pub async fn mine(&self, filter: ApplicationFilter) -> Query<Page<JobApplication>> {
        let api = self.api.clone();
        let key = keys::applications::mine(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.mine(&filter).await }
        })
        .await
    }

    pub async fn stats(&self) -> Query<ApplicationStats> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::applications::stats(), move || {
            let api = api.clone();
            async move { api.stats().await }
        })
        .await
    }

    pub fn submit(&self) -> MutationHook<SubmitApplication, JobApplication> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |submission: SubmitApplication| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.submit(&submission).await, |application| {
                    vec![Mutation::SubmitApplication {
                        job_id: application.job_id.clone(),
                    }]
                })
            }
        })
    }

    /// Input: the application id
    pub fn move_to_reviewing(&self) -> MutationHook<String, JobApplication> {
        self.simple_transition(ApplicationTransition::MoveToReviewing)
    }

    /// Input: the application id
    pub fn shortlist(&self) -> MutationHook<String, JobApplication> {
        self.simple_transition(ApplicationTransition::Shortlist)
    }

    pub fn schedule_interview(&self) -> MutationHook<ScheduleInterview, JobApplication> {
        let runner = self.runner();
        MutationHook::new(&self.cache, move |input: ScheduleInterview| {
            let runner = runner.clone();
            async move {
                let update = StatusUpdate {
                    interview_date: Some(input.interview_date),
                    notes: input.notes,
                    ..StatusUpdate::to(ApplicationStatus::Interviewed)
                };
                runner
                    .run(
                        input.application_id,
                        ApplicationTransition::ScheduleInterview,
                        update,
                    )
                    .await
            }
        })
    }

    /// Input: the application id
    pub fn accept(&self) -> MutationHook<String, JobApplication> {
        self.simple_transition(ApplicationTransition::Accept)
    }

    pub fn reject(&self) -> MutationHook<RejectApplication, JobApplication> {
        let runner = self.runner();
        MutationHook::new(&self.cache, move |input: RejectApplication| {
            let runner = runner.clone();
            async move {
                let update = StatusUpdate {
                    rejection_reason: input.reason,
                    ..StatusUpdate::to(ApplicationStatus::Rejected)
                };
                runner
                    .run(input.application_id, ApplicationTransition::Reject, update)
                    .await
            }
        })
    }

    /// Applicant-side withdrawal. Input: the application id
    pub fn withdraw(&self) -> MutationHook<String, JobApplication> {
        self.simple_transition(ApplicationTransition::Withdraw)
    }

    /// Move many applications to one status
    ///
    /// The result reports every id separately. Scopes shared by the batch
    /// (lists, stats) are invalidated as soon as one item succeeded; items
    /// refused for their state get their detail refreshed.
    pub fn bulk_update_status(&self) -> MutationHook<BulkStatusUpdate, BulkUpdateOutcome> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |update: BulkStatusUpdate| {
            let api = api.clone();
            async move { bulk_update(&api, update).await }
        })
    }

    fn runner(&self) -> TransitionRunner {
        TransitionRunner {
            api: self.api.clone(),
            cache: self.cache.clone(),
        }
    }

    fn simple_transition(&self, transition: ApplicationTransition) -> MutationHook<String, JobApplication> {
        let runner = self.runner();
        MutationHook::new(&self.cache, move |application_id: String| {
            let runner = runner.clone();
            async move {
                runner
                    .run(application_id, transition, StatusUpdate::to(transition.target()))
                    .await
            }
        })
    }
}

#[derive(Clone)]
struct TransitionRunner {
    api: ApplicationsApi,
    cache: QueryCache,
}

impl TransitionRunner {
    async fn run(
        &self,
        application_id: String,
        transition: ApplicationTransition,
        update: StatusUpdate,
    ) -> Outcome<JobApplication> {
        let application_id = match path_id(&application_id) {
            Ok(id) => id.to_string(),
            Err(e) => return Outcome::failed(e, Vec::new()),
        };
        let conflict = || {
            vec![Mutation::ApplicationConflict {
                application_id: application_id.clone(),
            }]
        };

        let detail = keys::applications::detail(&application_id);
        if let Some(current) = fresh_cached::<JobApplication>(&self.cache, &detail).await {
            if let Err(e) = transition.check(current.status) {
                debug!("Refusing to {} {} locally: {}", transition, application_id, e);
                return Outcome::failed(e, conflict());
            }
        }

        let result = match transition {
            ApplicationTransition::Withdraw => self.api.withdraw(&application_id).await,
            _ => self.api.update_status(&application_id, &update).await,
        };

        match result {
            Ok(application) => {
                let effects = vec![transition.mutation(&application)];
                Outcome {
                    result: Ok(application),
                    effects,
                }
            }
            Err(e) if e.is_state_conflict() => Outcome::failed(e, conflict()),
            Err(e) => Outcome::failed(e, Vec::new()),
        }
    }
}

async fn bulk_update(api: &ApplicationsApi, update: BulkStatusUpdate) -> Outcome<BulkUpdateOutcome> {
    if ApplicationTransition::leading_to(update.status).is_none() {
        return Outcome::failed(
            ClientError::validation(format!(
                "applications cannot be moved to {}",
                update.status
            )),
            Vec::new(),
        );
    }

    if update.application_ids.is_empty() {
        return Outcome::failed(
            ClientError::validation("bulk update needs at least one application"),
            Vec::new(),
        );
    }

    // Malformed ids fail on their own; the rest are still sent
    let checked: Vec<(String, Result<String, ClientError>)> = update
        .application_ids
        .iter()
        .map(|id| (id.clone(), path_id(id).map(str::to_string)))
        .collect();
    let accepted: Vec<String> = checked
        .iter()
        .filter_map(|(_, checked)| checked.as_ref().ok().cloned())
        .collect();

    let mut sent = if accepted.is_empty() {
        Vec::new().into_iter()
    } else {
        let request = BulkStatusUpdate {
            application_ids: accepted.clone(),
            ..update.clone()
        };
        match api.bulk_update_status(&request).await {
            Ok(response) => BulkUpdateOutcome::from_response(&accepted, response)
                .items
                .into_iter(),
            Err(e) => return Outcome::failed(e, Vec::new()),
        }
    };

    let items = checked
        .into_iter()
        .map(|(application_id, checked)| {
            let result = match checked {
                Err(e) => Err(e),
                Ok(_) => match sent.next() {
                    Some(item) => item.result,
                    None => Err(ClientError::Decode(format!(
                        "bulk response did not mention application {}",
                        application_id
                    ))),
                },
            };
            BulkItemResult {
                application_id,
                result,
            }
        })
        .collect();
    let outcome = BulkUpdateOutcome { items };
    let mut effects = Vec::new();

    let succeeded: Vec<&JobApplication> = outcome.succeeded().collect();
    if !succeeded.is_empty() {
        let mut job_ids: Vec<String> = succeeded.iter().map(|a| a.job_id.clone()).collect();
        job_ids.sort();
        job_ids.dedup();
        effects.push(Mutation::BulkUpdateApplicationStatus {
            application_ids: succeeded.iter().map(|a| a.id.clone()).collect(),
            job_ids,
        });
    }
    for (application_id, error) in outcome.failed() {
        if error.is_state_conflict() {
            effects.push(Mutation::ApplicationConflict {
                application_id: application_id.to_string(),
            });
        }
    }

    info!(
        "Bulk update to {}: {} succeeded, {} failed",
        update.status,
        succeeded.len(),
        outcome.failed().count()
    );

    Outcome {
        result: Ok(outcome),
        effects,
    }
}
