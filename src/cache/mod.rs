//! # Query Cache
//!
//! Shared cache of server reads keyed by structured [`QueryKey`]s, with
//! declarative invalidation driven by confirmed mutations.
//!
//! ## Features
//!
//! - **Stale-While-Revalidate**: stale entries are served immediately while a refetch runs
//! - **Request Deduplication**: concurrent reads of one key share a single fetch
//! - **Prefix Invalidation**: invalidating a key prefix marks every descendant stale
//! - **Invalidation Graph**: one static table maps each mutation kind to the prefixes it affects
//! - **Observer-Driven Refetch**: keys with live observers refetch as soon as they go stale
//! - **Garbage Collection**: unobserved entries are dropped after the gc window
//!
//! ## Example
//!
//! ```rust
//! use recruit_client::cache::{fetcher, CacheConfig, Mutation, QueryCache};
//! use recruit_client::keys;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .default_stale_time(Duration::from_secs(300))
//!     .gc_time(Duration::from_secs(1800))
//!     .build();
//!
//! let cache = QueryCache::new(config);
//! let key = keys::saved_jobs::is_saved("job-1");
//!
//! let read = cache
//!     .read(&key, fetcher(|| async { Ok(json!({"isSaved": false})) }))
//!     .await?;
//! println!("{} ({})", read.value, read.source);
//!
//! // After the server confirms the save
//! cache.invalidate_for(&Mutation::SaveJob { job_id: "job-1".into() }).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder, StaleTimeRule};
pub use entry::{CacheEntry, CacheMetadata};
pub use invalidation::{
    InvalidationEvent, InvalidationGraph, InvalidationReason, Mutation, MutationKind,
    PrefixTemplate,
};
pub use store::{fetcher, start_auto_gc, FetchFuture, Fetcher, ObserverGuard, QueryCache};
pub use types::{CacheStats, CacheValue, ReadOutcome, ReadSource};
