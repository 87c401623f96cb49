//! # recruit-client
//!
//! Client core for a recruitment platform: job postings, applications, saved
//! jobs, notifications and dashboard counters, kept consistent with each
//! other through one shared query cache.
//!
//! ## Features
//!
//! - Structured, hierarchical query keys with prefix invalidation
//! - Application status state machine with local pre-flight checks
//! - Stale-while-revalidate cache with per-key request deduplication
//! - A single declarative table mapping each write to the reads it affects
//! - Typed REST client with retrying reads and classified errors
//! - View bindings: mounted queries and mutation hooks
//!
//! ## Reading and writing
//!
//! ```no_run
//! use recruit_client::{Bindings, CacheConfig, ClientConfig, QueryCache, ResourceClient};
//! use recruit_client::model::ApplicationFilter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     recruit_client::telemetry::init_tracing(recruit_client::telemetry::DEFAULT_FILTER);
//!
//!     let client = ResourceClient::http(ClientConfig::from_env()?)?;
//!     let cache = QueryCache::new(CacheConfig::default());
//!     cache.spawn_auto_gc();
//!     let bindings = Bindings::new(client, cache);
//!
//!     let applications = bindings
//!         .applications()
//!         .by_job("job-1", ApplicationFilter::default())
//!         .await;
//!     let state = applications.fetch().await;
//!     println!("{} applications", state.data.map(|page| page.len()).unwrap_or(0));
//!
//!     // Refreshes the job's application list once the server confirms
//!     bindings
//!         .applications()
//!         .shortlist()
//!         .mutate("app-7".to_string())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## State machine
//!
//! ```rust
//! use recruit_client::lifecycle::{ApplicationStatus, ApplicationTransition};
//!
//! let next = ApplicationTransition::Shortlist.check(ApplicationStatus::Reviewing).unwrap();
//! assert_eq!(next, ApplicationStatus::Shortlisted);
//!
//! let err = ApplicationTransition::Shortlist
//!     .check(ApplicationStatus::Rejected)
//!     .unwrap_err();
//! assert!(err.is_state_conflict());
//! ```

pub mod bindings;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod lifecycle;
pub mod model;
pub mod remote;
pub mod telemetry;

// Re-export main types for convenience
pub use bindings::{Bindings, MutationHook, Query, QueryState};
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheStats, InvalidationEvent, InvalidationGraph, Mutation,
    MutationKind, QueryCache, ReadSource,
};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, Result};
pub use keys::{EntityFamily, QueryKey, Scope};
pub use lifecycle::{ApplicationStatus, ApplicationTransition, JobStatus};
pub use remote::{HttpTransport, ResourceClient, Transport};
