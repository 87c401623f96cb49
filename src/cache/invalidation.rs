//! Declarative invalidation graph
//!
//! Each mutation kind declares, once, the query-key prefixes it marks stale.
//! A mutation invalidates the detail key it targeted plus every list or
//! aggregate that could plausibly contain the entity, erring toward
//! over-invalidation. Call sites never assemble key lists by hand; they name a
//! [`Mutation`] and the graph resolves it.

use crate::keys::{EntityFamily, QueryKey, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of write operation, the row index of the invalidation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    SubmitApplication,
    UpdateApplicationStatus,
    WithdrawApplication,
    BulkUpdateApplicationStatus,
    /// A transition the server refused: the detail shown is out of date
    ApplicationConflict,
    CreateJob,
    UpdateJob,
    ChangeJobStatus,
    DeleteJob,
    SaveJob,
    UnsaveJob,
    UpdateSavedJob,
    MarkSavedJobApplied,
    MarkNotificationRead,
    MarkNotificationUnread,
    MarkAllNotificationsRead,
    DeleteNotification,
}

impl MutationKind {
    pub const ALL: [MutationKind; 17] = [
        MutationKind::SubmitApplication,
        MutationKind::UpdateApplicationStatus,
        MutationKind::WithdrawApplication,
        MutationKind::BulkUpdateApplicationStatus,
        MutationKind::ApplicationConflict,
        MutationKind::CreateJob,
        MutationKind::UpdateJob,
        MutationKind::ChangeJobStatus,
        MutationKind::DeleteJob,
        MutationKind::SaveJob,
        MutationKind::UnsaveJob,
        MutationKind::UpdateSavedJob,
        MutationKind::MarkSavedJobApplied,
        MutationKind::MarkNotificationRead,
        MutationKind::MarkNotificationUnread,
        MutationKind::MarkAllNotificationsRead,
        MutationKind::DeleteNotification,
    ];

    /// Whether mutations of this kind name the entity (or entities) they changed
    pub fn carries_target(&self) -> bool {
        !matches!(
            self,
            MutationKind::SubmitApplication | MutationKind::MarkAllNotificationsRead
        )
    }

    /// Whether mutations of this kind name the job(s) involved
    pub fn carries_job(&self) -> bool {
        matches!(
            self,
            MutationKind::SubmitApplication
                | MutationKind::UpdateApplicationStatus
                | MutationKind::WithdrawApplication
                | MutationKind::BulkUpdateApplicationStatus
                | MutationKind::SaveJob
                | MutationKind::UnsaveJob
        )
    }
}

/// A confirmed write, carrying the identities the invalidation table needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SubmitApplication { job_id: String },
    UpdateApplicationStatus { application_id: String, job_id: String },
    WithdrawApplication { application_id: String, job_id: String },
    BulkUpdateApplicationStatus { application_ids: Vec<String>, job_ids: Vec<String> },
    ApplicationConflict { application_id: String },
    CreateJob { job_id: String },
    UpdateJob { job_id: String },
    ChangeJobStatus { job_id: String },
    DeleteJob { job_id: String },
    SaveJob { job_id: String },
    UnsaveJob { job_id: String },
    UpdateSavedJob { saved_job_id: String },
    MarkSavedJobApplied { saved_job_id: String },
    MarkNotificationRead { notification_id: String },
    MarkNotificationUnread { notification_id: String },
    MarkAllNotificationsRead,
    DeleteNotification { notification_id: String },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::SubmitApplication { .. } => MutationKind::SubmitApplication,
            Mutation::UpdateApplicationStatus { .. } => MutationKind::UpdateApplicationStatus,
            Mutation::WithdrawApplication { .. } => MutationKind::WithdrawApplication,
            Mutation::BulkUpdateApplicationStatus { .. } => {
                MutationKind::BulkUpdateApplicationStatus
            }
            Mutation::ApplicationConflict { .. } => MutationKind::ApplicationConflict,
            Mutation::CreateJob { .. } => MutationKind::CreateJob,
            Mutation::UpdateJob { .. } => MutationKind::UpdateJob,
            Mutation::ChangeJobStatus { .. } => MutationKind::ChangeJobStatus,
            Mutation::DeleteJob { .. } => MutationKind::DeleteJob,
            Mutation::SaveJob { .. } => MutationKind::SaveJob,
            Mutation::UnsaveJob { .. } => MutationKind::UnsaveJob,
            Mutation::UpdateSavedJob { .. } => MutationKind::UpdateSavedJob,
            Mutation::MarkSavedJobApplied { .. } => MutationKind::MarkSavedJobApplied,
            Mutation::MarkNotificationRead { .. } => MutationKind::MarkNotificationRead,
            Mutation::MarkNotificationUnread { .. } => MutationKind::MarkNotificationUnread,
            Mutation::MarkAllNotificationsRead => MutationKind::MarkAllNotificationsRead,
            Mutation::DeleteNotification { .. } => MutationKind::DeleteNotification,
        }
    }

    /// Ids of the entities the mutation targeted
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Mutation::UpdateApplicationStatus { application_id, .. }
            | Mutation::WithdrawApplication { application_id, .. }
            | Mutation::ApplicationConflict { application_id } => vec![application_id.as_str()],
            Mutation::BulkUpdateApplicationStatus { application_ids, .. } => {
                application_ids.iter().map(String::as_str).collect()
            }
            Mutation::CreateJob { job_id }
            | Mutation::UpdateJob { job_id }
            | Mutation::ChangeJobStatus { job_id }
            | Mutation::DeleteJob { job_id }
            | Mutation::SaveJob { job_id }
            | Mutation::UnsaveJob { job_id } => vec![job_id.as_str()],
            Mutation::UpdateSavedJob { saved_job_id }
            | Mutation::MarkSavedJobApplied { saved_job_id } => vec![saved_job_id.as_str()],
            Mutation::MarkNotificationRead { notification_id }
            | Mutation::MarkNotificationUnread { notification_id }
            | Mutation::DeleteNotification { notification_id } => vec![notification_id.as_str()],
            Mutation::SubmitApplication { .. } | Mutation::MarkAllNotificationsRead => Vec::new(),
        }
    }

    /// Ids of the jobs involved
    pub fn jobs(&self) -> Vec<&str> {
        match self {
            Mutation::SubmitApplication { job_id }
            | Mutation::UpdateApplicationStatus { job_id, .. }
            | Mutation::WithdrawApplication { job_id, .. }
            | Mutation::SaveJob { job_id }
            | Mutation::UnsaveJob { job_id } => vec![job_id.as_str()],
            Mutation::BulkUpdateApplicationStatus { job_ids, .. } => {
                job_ids.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Which mutation identity fills the key's id slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    /// Prefix stops at the scope
    None,
    /// One key per targeted entity id
    Target,
    /// One key per job id involved
    Job,
}

/// A key prefix with a hole for an id taken from the mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixTemplate {
    pub family: EntityFamily,
    pub scope: Option<Scope>,
    pub discriminator: Discriminator,
}

impl PrefixTemplate {
    /// The whole family
    pub const fn family(family: EntityFamily) -> Self {
        Self {
            family,
            scope: None,
            discriminator: Discriminator::None,
        }
    }

    /// Every key under `(family, scope)`
    pub const fn scope(family: EntityFamily, scope: Scope) -> Self {
        Self {
            family,
            scope: Some(scope),
            discriminator: Discriminator::None,
        }
    }

    /// `(family, scope, target id)`
    pub const fn target(family: EntityFamily, scope: Scope) -> Self {
        Self {
            family,
            scope: Some(scope),
            discriminator: Discriminator::Target,
        }
    }

    /// `(family, scope, job id)`
    pub const fn job(family: EntityFamily, scope: Scope) -> Self {
        Self {
            family,
            scope: Some(scope),
            discriminator: Discriminator::Job,
        }
    }

    fn base(&self) -> QueryKey {
        match self.scope {
            Some(scope) => QueryKey::new(self.family, scope),
            None => QueryKey::family(self.family),
        }
    }

    /// Concrete prefixes for one mutation. When the mutation lacks the id the
    /// template asks for, the broader scope-level prefix is used instead.
    fn expand(&self, mutation: &Mutation) -> Vec<QueryKey> {
        let ids = match self.discriminator {
            Discriminator::None => return vec![self.base()],
            Discriminator::Target => mutation.targets(),
            Discriminator::Job => mutation.jobs(),
        };
        let ids: Vec<&str> = ids.into_iter().filter(|id| !id.trim().is_empty()).collect();
        if ids.is_empty() {
            return vec![self.base()];
        }
        ids.into_iter().map(|id| self.base().id(id)).collect()
    }
}

type Row = (MutationKind, &'static [PrefixTemplate]);

use EntityFamily::{Applications, Dashboard, Jobs, Notifications, SavedJobs};
use Scope::{Analytics, ByJob, Detail, IsSaved, List, Mine, Recommendations, Stats, Unread};

const APPLICATION_STATUS_CHANGE: &[PrefixTemplate] = &[
    PrefixTemplate::target(Applications, Detail),
    PrefixTemplate::scope(Applications, List),
    PrefixTemplate::job(Applications, ByJob),
    PrefixTemplate::scope(Applications, Mine),
    PrefixTemplate::scope(Applications, Stats),
    PrefixTemplate::job(Jobs, Detail),
    PrefixTemplate::scope(Dashboard, Stats),
];

const APPLICATION_WITHDRAWAL: &[PrefixTemplate] = &[
    PrefixTemplate::target(Applications, Detail),
    PrefixTemplate::scope(Applications, List),
    PrefixTemplate::job(Applications, ByJob),
    PrefixTemplate::scope(Applications, Mine),
    PrefixTemplate::scope(Applications, Stats),
    PrefixTemplate::job(Jobs, Detail),
    PrefixTemplate::scope(Jobs, List),
    PrefixTemplate::scope(Jobs, Mine),
    PrefixTemplate::scope(Dashboard, Stats),
];

const JOB_CHANGE: &[PrefixTemplate] = &[
    PrefixTemplate::target(Jobs, Detail),
    PrefixTemplate::scope(Jobs, List),
    PrefixTemplate::scope(Jobs, Mine),
    PrefixTemplate::scope(Jobs, Stats),
    PrefixTemplate::scope(Jobs, Recommendations),
    PrefixTemplate::scope(SavedJobs, List),
    PrefixTemplate::scope(Dashboard, Stats),
];

const SAVED_JOB_MEMBERSHIP: &[PrefixTemplate] = &[
    PrefixTemplate::job(SavedJobs, IsSaved),
    PrefixTemplate::scope(SavedJobs, List),
    PrefixTemplate::scope(SavedJobs, Stats),
    PrefixTemplate::scope(SavedJobs, Analytics),
    PrefixTemplate::scope(Dashboard, Stats),
];

const SAVED_JOB_EDIT: &[PrefixTemplate] = &[
    PrefixTemplate::target(SavedJobs, Detail),
    PrefixTemplate::scope(SavedJobs, List),
    PrefixTemplate::scope(SavedJobs, Stats),
    PrefixTemplate::scope(SavedJobs, Analytics),
];

const NOTIFICATION_CHANGE: &[PrefixTemplate] = &[
    PrefixTemplate::scope(Notifications, List),
    PrefixTemplate::scope(Notifications, Unread),
    PrefixTemplate::scope(Notifications, Stats),
    PrefixTemplate::scope(Dashboard, Stats),
];

/// The invalidation table shipped with the client
pub const STANDARD_TABLE: &[Row] = &[
    (
        MutationKind::SubmitApplication,
        &[
            PrefixTemplate::scope(Applications, List),
            PrefixTemplate::job(Applications, ByJob),
            PrefixTemplate::scope(Applications, Mine),
            PrefixTemplate::scope(Applications, Stats),
            PrefixTemplate::job(Jobs, Detail),
            PrefixTemplate::scope(Jobs, List),
            PrefixTemplate::scope(Jobs, Mine),
            PrefixTemplate::scope(Jobs, Stats),
            PrefixTemplate::scope(Dashboard, Stats),
        ],
    ),
    (MutationKind::UpdateApplicationStatus, APPLICATION_STATUS_CHANGE),
    (MutationKind::WithdrawApplication, APPLICATION_WITHDRAWAL),
    (
        MutationKind::BulkUpdateApplicationStatus,
        &[
            PrefixTemplate::target(Applications, Detail),
            PrefixTemplate::scope(Applications, List),
            PrefixTemplate::scope(Applications, ByJob),
            PrefixTemplate::scope(Applications, Mine),
            PrefixTemplate::scope(Applications, Stats),
            PrefixTemplate::scope(Jobs, Detail),
            PrefixTemplate::scope(Dashboard, Stats),
        ],
    ),
    (
        MutationKind::ApplicationConflict,
        &[PrefixTemplate::target(Applications, Detail)],
    ),
    (MutationKind::CreateJob, JOB_CHANGE),
    (MutationKind::UpdateJob, JOB_CHANGE),
    (MutationKind::ChangeJobStatus, JOB_CHANGE),
    (MutationKind::DeleteJob, JOB_CHANGE),
    (MutationKind::SaveJob, SAVED_JOB_MEMBERSHIP),
    (MutationKind::UnsaveJob, SAVED_JOB_MEMBERSHIP),
    (MutationKind::UpdateSavedJob, SAVED_JOB_EDIT),
    (MutationKind::MarkSavedJobApplied, SAVED_JOB_EDIT),
    (MutationKind::MarkNotificationRead, NOTIFICATION_CHANGE),
    (MutationKind::MarkNotificationUnread, NOTIFICATION_CHANGE),
    (MutationKind::MarkAllNotificationsRead, NOTIFICATION_CHANGE),
    (MutationKind::DeleteNotification, NOTIFICATION_CHANGE),
];

/// Static mapping from mutation kind to the key prefixes it invalidates
#[derive(Debug, Clone, Copy)]
pub struct InvalidationGraph {
    table: &'static [Row],
}

impl Default for InvalidationGraph {
    fn default() -> Self {
        Self::standard()
    }
}

impl InvalidationGraph {
    pub fn standard() -> Self {
        Self {
            table: STANDARD_TABLE,
        }
    }

    pub fn from_table(table: &'static [Row]) -> Self {
        Self { table }
    }

    /// Check the table once: every mutation kind has exactly one row, and
    /// every template names a scope that exists for its family and an id the
    /// mutation kind actually carries.
    pub fn validate(&self) -> Result<(), String> {
        for kind in MutationKind::ALL {
            let rows = self.table.iter().filter(|(k, _)| *k == kind).count();
            if rows != 1 {
                return Err(format!("{:?} has {} rows in the invalidation table", kind, rows));
            }
        }

        for (kind, templates) in self.table {
            if templates.is_empty() {
                return Err(format!("{:?} invalidates nothing", kind));
            }
            for template in templates.iter() {
                if let Some(scope) = template.scope {
                    if !scope.allowed_for(template.family) {
                        return Err(format!(
                            "{:?}: scope {} does not exist for {}",
                            kind, scope, template.family
                        ));
                    }
                }
                match template.discriminator {
                    Discriminator::None => {}
                    Discriminator::Target | Discriminator::Job => {
                        if !template.scope.is_some_and(|s| s.takes_id()) {
                            return Err(format!(
                                "{:?}: {:?} discriminator on a scope without ids",
                                kind, template.discriminator
                            ));
                        }
                    }
                }
                if template.discriminator == Discriminator::Target && !kind.carries_target() {
                    return Err(format!("{:?} has no target id to substitute", kind));
                }
                if template.discriminator == Discriminator::Job && !kind.carries_job() {
                    return Err(format!("{:?} has no job id to substitute", kind));
                }
            }
        }

        Ok(())
    }

    /// Templates declared for a mutation kind
    pub fn templates(&self, kind: MutationKind) -> &'static [PrefixTemplate] {
        self.table
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, templates)| *templates)
            .unwrap_or(&[])
    }

    /// Concrete, minimal set of prefixes for a mutation
    ///
    /// Duplicates and prefixes already covered by a broader prefix in the set
    /// are dropped.
    pub fn resolve(&self, mutation: &Mutation) -> Vec<QueryKey> {
        let mut seen = HashSet::new();
        let expanded: Vec<QueryKey> = self
            .templates(mutation.kind())
            .iter()
            .flat_map(|t| t.expand(mutation))
            .filter(|key| seen.insert(key.clone()))
            .collect();

        expanded
            .iter()
            .filter(|key| {
                !expanded
                    .iter()
                    .any(|other| other != *key && other.is_prefix_of(key))
            })
            .cloned()
            .collect()
    }
}

/// Reason entries were marked stale or dropped
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// A confirmed write declared these keys affected
    Mutation(MutationKind),

    /// Explicit invalidation by key prefix
    Manual,

    /// Entries explicitly removed
    Removed,

    /// Unobserved entries dropped after the gc window
    GarbageCollected,

    /// Whole cache torn down (logout / session end)
    Teardown,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Mutation(kind) => write!(f, "mutation {:?}", kind),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
            InvalidationReason::Removed => write!(f, "explicit removal"),
            InvalidationReason::GarbageCollected => write!(f, "garbage collected"),
            InvalidationReason::Teardown => write!(f, "cache teardown"),
        }
    }
}

/// Record of one invalidation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were marked stale (or dropped)
    pub keys: Vec<QueryKey>,

    /// Observed keys refetched as part of the pass
    pub refetched: usize,

    /// Refetches that failed; those keys keep serving their previous value
    pub refetch_failures: usize,
}

impl InvalidationEvent {
    pub fn new(reason: InvalidationReason, keys: Vec<QueryKey>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            keys,
            refetched: 0,
            refetch_failures: 0,
        }
    }

    pub fn with_refetches(mut self, refetched: usize, failures: usize) -> Self {
        self.refetched = refetched;
        self.refetch_failures = failures;
        self
    }

    pub fn touched(&self, key: &QueryKey) -> bool {
        self.keys.contains(key)
    }
}
