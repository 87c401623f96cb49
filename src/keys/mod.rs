//! Query key registry
//!
//! Every cacheable fetch scope is named by a [`QueryKey`]: an ordered tuple
//! `(family, scope, ...discriminators)`. Keys are pure values; two keys are
//! related when one is a prefix of the other, and invalidating a prefix
//! invalidates every key extending it.
//!
//! ```rust
//! use recruit_client::keys::{self, EntityFamily, QueryKey, Scope};
//! use recruit_client::model::ApplicationFilter;
//!
//! let detail = keys::applications::detail("app-1");
//! assert_eq!(detail.to_string(), "applications/detail/app-1");
//!
//! let list = keys::applications::list(&ApplicationFilter::default().page(2));
//! assert!(QueryKey::new(EntityFamily::Applications, Scope::List).is_prefix_of(&list));
//! assert!(!keys::applications::lists().is_prefix_of(&detail));
//! ```

pub mod filter;

pub use filter::{NormalizedFilter, QueryFilter};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity family: the first element of every query key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityFamily {
    Jobs,
    Applications,
    SavedJobs,
    Notifications,
    Dashboard,
}

impl EntityFamily {
    pub const ALL: [EntityFamily; 5] = [
        EntityFamily::Jobs,
        EntityFamily::Applications,
        EntityFamily::SavedJobs,
        EntityFamily::Notifications,
        EntityFamily::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityFamily::Jobs => "jobs",
            EntityFamily::Applications => "applications",
            EntityFamily::SavedJobs => "savedJobs",
            EntityFamily::Notifications => "notifications",
            EntityFamily::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch scope within a family: the second element of a query key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// A single entity by id
    Detail,
    /// A filtered, paginated listing
    List,
    /// Listing restricted to one job (applications for a job)
    ByJob,
    /// Listing owned by the current user
    Mine,
    /// Server-computed aggregate counts
    Stats,
    /// Personalised job recommendations
    Recommendations,
    /// Whether a job is saved by the current user
    IsSaved,
    /// Saved-job analytics
    Analytics,
    /// Unread notification count
    Unread,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Detail => "detail",
            Scope::List => "list",
            Scope::ByJob => "byJob",
            Scope::Mine => "mine",
            Scope::Stats => "stats",
            Scope::Recommendations => "recommendations",
            Scope::IsSaved => "isSaved",
            Scope::Analytics => "analytics",
            Scope::Unread => "unread",
        }
    }

    /// Scopes that carry an entity id discriminator
    pub fn takes_id(&self) -> bool {
        matches!(self, Scope::Detail | Scope::ByJob | Scope::IsSaved)
    }

    /// Scopes that carry a normalized filter discriminator
    pub fn takes_filter(&self) -> bool {
        matches!(self, Scope::List | Scope::ByJob | Scope::Mine)
    }

    /// Whether this scope exists for the given family
    pub fn allowed_for(&self, family: EntityFamily) -> bool {
        use EntityFamily as F;
        match self {
            Scope::Detail => matches!(family, F::Jobs | F::Applications | F::SavedJobs),
            Scope::List => !matches!(family, F::Dashboard),
            Scope::ByJob => family == F::Applications,
            Scope::Mine => matches!(family, F::Jobs | F::Applications),
            Scope::Stats => true,
            Scope::Recommendations => family == F::Jobs,
            Scope::IsSaved | Scope::Analytics => family == F::SavedJobs,
            Scope::Unread => family == F::Notifications,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a query key tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySegment {
    Family(EntityFamily),
    Scope(Scope),
    Id(String),
    Filter(NormalizedFilter),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Family(family) => write!(f, "{}", family),
            KeySegment::Scope(scope) => write!(f, "{}", scope),
            KeySegment::Id(id) => f.write_str(id),
            KeySegment::Filter(filter) => write!(f, "{{{}}}", filter),
        }
    }
}

/// Structured, hierarchical cache key
///
/// Construction asserts the key is well formed: a malformed scope is a
/// programming error and panics instead of producing a key that silently never
/// matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    segments: Vec<KeySegment>,
}

impl QueryKey {
    /// Key naming a whole family, e.g. `(applications)`
    pub fn family(family: EntityFamily) -> Self {
        Self {
            segments: vec![KeySegment::Family(family)],
        }
    }

    /// Key naming a scope within a family, e.g. `(applications, list)`
    pub fn new(family: EntityFamily, scope: Scope) -> Self {
        assert!(
            scope.allowed_for(family),
            "scope `{}` is not defined for family `{}`",
            scope,
            family
        );
        Self {
            segments: vec![KeySegment::Family(family), KeySegment::Scope(scope)],
        }
    }

    /// Append the entity id discriminator
    ///
    /// Surrounding whitespace is dropped, the same way request paths drop it,
    /// so `" A1"` and `"A1"` name one entry.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        let id = id.into().trim().to_string();
        let scope = self.scope();
        assert!(
            scope.is_some_and(|s| s.takes_id()),
            "scope {:?} does not take an id (key {})",
            scope,
            self
        );
        assert!(!id.is_empty(), "empty id in query key {}", self);
        assert_eq!(
            self.segments.len(),
            2,
            "id must directly follow the scope (key {})",
            self
        );
        self.segments.push(KeySegment::Id(id));
        self
    }

    /// Append a normalized filter discriminator
    pub fn filter<F: QueryFilter + ?Sized>(mut self, filter: &F) -> Self {
        let scope = self.scope();
        assert!(
            scope.is_some_and(|s| s.takes_filter()),
            "scope {:?} does not take a filter (key {})",
            scope,
            self
        );
        assert!(
            !matches!(self.segments.last(), Some(KeySegment::Filter(_))),
            "query key {} already has a filter",
            self
        );
        if scope == Some(Scope::ByJob) {
            assert_eq!(
                self.segments.len(),
                3,
                "byJob keys need the job id before the filter (key {})",
                self
            );
        }
        self.segments.push(KeySegment::Filter(filter.normalized()));
        self
    }

    /// Entity family of this key
    pub fn entity_family(&self) -> EntityFamily {
        match self.segments.first() {
            Some(KeySegment::Family(family)) => *family,
            _ => unreachable!("query keys always start with a family"),
        }
    }

    /// Scope of this key, if it is narrower than a whole family
    pub fn scope(&self) -> Option<Scope> {
        match self.segments.get(1) {
            Some(KeySegment::Scope(scope)) => Some(*scope),
            _ => None,
        }
    }

    /// Id discriminator, if present
    pub fn entity_id(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            KeySegment::Id(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// All segments in order
    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if every segment of `self` equals the corresponding segment of
    /// `other`. A key is a prefix of itself.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Key factories for jobs
pub mod jobs {
    use super::{EntityFamily, QueryKey, Scope};
    use crate::model::JobFilter;

    pub fn all() -> QueryKey {
        QueryKey::family(EntityFamily::Jobs)
    }

    pub fn details() -> QueryKey {
        QueryKey::new(EntityFamily::Jobs, Scope::Detail)
    }

    pub fn detail(job_id: &str) -> QueryKey {
        details().id(job_id)
    }

    pub fn lists() -> QueryKey {
        QueryKey::new(EntityFamily::Jobs, Scope::List)
    }

    pub fn list(filter: &JobFilter) -> QueryKey {
        lists().filter(filter)
    }

    pub fn mine(filter: &JobFilter) -> QueryKey {
        QueryKey::new(EntityFamily::Jobs, Scope::Mine).filter(filter)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(EntityFamily::Jobs, Scope::Stats)
    }

    pub fn recommendations() -> QueryKey {
        QueryKey::new(EntityFamily::Jobs, Scope::Recommendations)
    }
}

/// Key factories for job applications
pub mod applications {
    use super::{EntityFamily, QueryKey, Scope};
    use crate::model::ApplicationFilter;

    pub fn all() -> QueryKey {
        QueryKey::family(EntityFamily::Applications)
    }

    pub fn details() -> QueryKey {
        QueryKey::new(EntityFamily::Applications, Scope::Detail)
    }

    pub fn detail(application_id: &str) -> QueryKey {
        details().id(application_id)
    }

    pub fn lists() -> QueryKey {
        QueryKey::new(EntityFamily::Applications, Scope::List)
    }

    pub fn list(filter: &ApplicationFilter) -> QueryKey {
        lists().filter(filter)
    }

    /// Prefix covering every filtered listing of one job's applications
    pub fn for_job(job_id: &str) -> QueryKey {
        QueryKey::new(EntityFamily::Applications, Scope::ByJob).id(job_id)
    }

    pub fn by_job(job_id: &str, filter: &ApplicationFilter) -> QueryKey {
        for_job(job_id).filter(filter)
    }

    pub fn mine(filter: &ApplicationFilter) -> QueryKey {
        QueryKey::new(EntityFamily::Applications, Scope::Mine).filter(filter)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(EntityFamily::Applications, Scope::Stats)
    }
}

/// Key factories for saved jobs
pub mod saved_jobs {
    use super::{EntityFamily, QueryKey, Scope};
    use crate::model::SavedJobFilter;

    pub fn all() -> QueryKey {
        QueryKey::family(EntityFamily::SavedJobs)
    }

    pub fn detail(saved_job_id: &str) -> QueryKey {
        QueryKey::new(EntityFamily::SavedJobs, Scope::Detail).id(saved_job_id)
    }

    pub fn lists() -> QueryKey {
        QueryKey::new(EntityFamily::SavedJobs, Scope::List)
    }

    pub fn list(filter: &SavedJobFilter) -> QueryKey {
        lists().filter(filter)
    }

    pub fn is_saved(job_id: &str) -> QueryKey {
        QueryKey::new(EntityFamily::SavedJobs, Scope::IsSaved).id(job_id)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(EntityFamily::SavedJobs, Scope::Stats)
    }

    pub fn analytics() -> QueryKey {
        QueryKey::new(EntityFamily::SavedJobs, Scope::Analytics)
    }
}

/// Key factories for notifications
pub mod notifications {
    use super::{EntityFamily, QueryKey, Scope};
    use crate::model::NotificationFilter;

    pub fn all() -> QueryKey {
        QueryKey::family(EntityFamily::Notifications)
    }

    pub fn lists() -> QueryKey {
        QueryKey::new(EntityFamily::Notifications, Scope::List)
    }

    pub fn list(filter: &NotificationFilter) -> QueryKey {
        lists().filter(filter)
    }

    pub fn unread() -> QueryKey {
        QueryKey::new(EntityFamily::Notifications, Scope::Unread)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(EntityFamily::Notifications, Scope::Stats)
    }
}

/// Key factories for dashboard aggregates
pub mod dashboard {
    use super::{EntityFamily, QueryKey, Scope};

    pub fn all() -> QueryKey {
        QueryKey::family(EntityFamily::Dashboard)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(EntityFamily::Dashboard, Scope::Stats)
    }
}
