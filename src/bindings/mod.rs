//! View bindings
//!
//! The surface a UI layer talks to. Reads are [`Query`] values that stay
//! subscribed to their cache key while alive; writes are [`MutationHook`]s
//! that invalidate the affected keys once the server has confirmed.
//!
//! ```no_run
//! use recruit_client::bindings::Bindings;
//! use recruit_client::cache::{CacheConfig, QueryCache};
//! use recruit_client::model::SaveJob;
//! use recruit_client::{ClientConfig, ResourceClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ResourceClient::http(ClientConfig::from_env()?)?;
//! let bindings = Bindings::new(client, QueryCache::new(CacheConfig::default()));
//!
//! let saved = bindings.saved_jobs().is_saved("job-1").await;
//! println!("saved: {:?}", saved.fetch().await.data);
//!
//! bindings.saved_jobs().save().mutate(SaveJob::new("job-1")).await?;
//! println!("saved: {:?}", saved.fetch().await.data);
//! # Ok(())
//! # }
//! ```

pub mod applications;
pub mod dashboard;
pub mod jobs;
pub mod mutation;
pub mod notifications;
pub mod query;
pub mod saved_jobs;

pub use applications::ApplicationBindings;
pub use dashboard::DashboardBindings;
pub use jobs::{JobBindings, JobStatusChange};
pub use mutation::{MutationHook, Outcome};
pub use notifications::NotificationBindings;
pub use query::{Query, QueryState};
pub use saved_jobs::SavedJobBindings;

use crate::cache::QueryCache;
use crate::remote::{ExportsApi, ResourceClient};
use tracing::info;

/// Entry point for views: one resource client and one shared cache
#[derive(Debug, Clone)]
pub struct Bindings {
    client: ResourceClient,
    cache: QueryCache,
}

impl Bindings {
    pub fn new(client: ResourceClient, cache: QueryCache) -> Self {
        info!("View bindings ready ({:?})", cache.config());
        Self { client, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn jobs(&self) -> JobBindings {
        JobBindings::new(self.client.jobs(), self.cache.clone())
    }

    pub fn applications(&self) -> ApplicationBindings {
        ApplicationBindings::new(self.client.applications(), self.cache.clone())
    }

    pub fn saved_jobs(&self) -> SavedJobBindings {
        SavedJobBindings::new(self.client.saved_jobs(), self.cache.clone())
    }

    pub fn notifications(&self) -> NotificationBindings {
        NotificationBindings::new(self.client.notifications(), self.cache.clone())
    }

    pub fn dashboard(&self) -> DashboardBindings {
        DashboardBindings::new(self.client.dashboard(), self.cache.clone())
    }

    /// Binary exports; never cached
    pub fn exports(&self) -> ExportsApi {
        self.client.exports()
    }

    /// Drop every cached entry, e.g. on sign-out
    pub async fn teardown(&self) {
        let event = self.cache.clear().await;
        info!("Cache torn down, {} entries dropped", event.keys.len());
    }
}
