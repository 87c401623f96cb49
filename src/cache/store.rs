//! Query cache with request deduplication and prefix invalidation
//!
//! Reads go through [`QueryCache::read`]:
//!
//! - a fresh entry is returned without a fetch
//! - a stale entry is returned immediately while a refetch runs in the
//!   background (stale-while-revalidate)
//! - a missing entry waits on a fetch, joining one already in flight for the
//!   same key instead of issuing a second request
//!
//! Every fetch runs as its own task, so a reader that stops waiting never
//! cancels the request; the result still lands in the cache. Fetches are
//! numbered, and a result is dropped if a later fetch has already been stored
//! or the key was removed since the fetch started.

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationGraph, InvalidationReason, Mutation},
    types::{CacheStats, CacheValue, ReadOutcome, ReadSource},
};
use crate::error::{ClientError, Result};
use crate::keys::QueryKey;
use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Future produced by a fetcher
pub type FetchFuture = BoxFuture<'static, Result<CacheValue>>;

/// Function that performs the server read for a key
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

type SharedFetch = Shared<FetchFuture>;

/// Wrap an async closure as a [`Fetcher`]
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CacheValue>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Shared in-memory cache of server reads, keyed by [`QueryKey`]
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct QueryCache {
    config: Arc<CacheConfig>,
    graph: InvalidationGraph,
    store: Arc<RwLock<CacheStore>>,
}

struct CacheStore {
    slots: HashMap<QueryKey, Slot>,

    /// Last fetch sequence number handed out
    next_seq: u64,

    stats: CacheStats,
}

struct InFlight {
    seq: u64,
    epoch: u64,
    future: SharedFetch,
}

#[derive(Debug, Default)]
struct ObserverState {
    count: AtomicUsize,
    released_at_ms: AtomicI64,
}

/// Everything the cache knows about one key
struct Slot {
    entry: Option<CacheEntry>,
    in_flight: Option<InFlight>,

    /// Bumped on every invalidation; a fetch started under an older epoch
    /// cannot produce a fresh entry
    epoch: u64,

    /// Most recent fetcher registered by a reader, used for refetches
    fetcher: Option<Fetcher>,

    observers: Arc<ObserverState>,
    last_used: DateTime<Utc>,

    /// Results of fetches numbered below this are discarded
    min_seq: u64,
}

impl Slot {
    fn new(min_seq: u64) -> Self {
        Self {
            entry: None,
            in_flight: None,
            epoch: 0,
            fetcher: None,
            observers: Arc::new(ObserverState::default()),
            last_used: Utc::now(),
            min_seq,
        }
    }

    fn is_observed(&self) -> bool {
        self.observers.count.load(Ordering::SeqCst) > 0
    }

    /// The in-flight fetch, if it was started under the current epoch
    fn current_fetch(&self) -> Option<&InFlight> {
        self.in_flight.as_ref().filter(|f| f.epoch == self.epoch)
    }

    /// Last time a reader or observer touched the slot
    fn idle_since(&self) -> DateTime<Utc> {
        let released = self.observers.released_at_ms.load(Ordering::SeqCst);
        match DateTime::<Utc>::from_timestamp_millis(released) {
            Some(at) if at > self.last_used => at,
            _ => self.last_used,
        }
    }
}

/// Registration of interest in a key
///
/// While at least one guard is alive for a key, the key is refetched as soon
/// as it is invalidated and is never garbage collected. Dropping the guard
/// unregisters.
pub struct ObserverGuard {
    key: QueryKey,
    state: Arc<ObserverState>,
}

impl ObserverGuard {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl fmt::Debug for ObserverGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverGuard").field("key", &self.key).finish()
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.state
            .released_at_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
        self.state.count.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    /// Create a new cache with the standard invalidation graph
    ///
    /// The standard table is checked by the crate's own tests, so this
    /// cannot fail.
    pub fn new(config: CacheConfig) -> Self {
        Self::assemble(config, InvalidationGraph::standard())
    }

    /// Create a cache with a custom invalidation graph
    ///
    /// The graph is validated here, before any mutation can resolve through
    /// it.
    pub fn with_graph(config: CacheConfig, graph: InvalidationGraph) -> Result<Self> {
        graph.validate().map_err(ClientError::Config)?;
        Ok(Self::assemble(config, graph))
    }

    /// Create a cache after validating both the configuration and the graph
    pub fn validated(config: CacheConfig, graph: InvalidationGraph) -> Result<Self> {
        config.validate().map_err(ClientError::Config)?;
        Self::with_graph(config, graph)
    }

    fn assemble(config: CacheConfig, graph: InvalidationGraph) -> Self {
        info!("Initializing query cache with config: {:?}", config);

        let store = CacheStore {
            slots: HashMap::new(),
            next_seq: 0,
            stats: CacheStats::default(),
        };

        Self {
            config: Arc::new(config),
            graph,
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn graph(&self) -> &InvalidationGraph {
        &self.graph
    }

    /// Read a key, fetching with `fetcher` when the cache cannot serve it
    pub async fn read(&self, key: &QueryKey, fetcher: Fetcher) -> Result<ReadOutcome> {
        let (pending, source) = {
            let mut guard = self.store.write().await;
            let CacheStore {
                slots,
                next_seq,
                stats,
            } = &mut *guard;
            let min_seq = *next_seq + 1;
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot::new(min_seq));
            slot.fetcher = Some(fetcher.clone());
            slot.last_used = Utc::now();

            if let Some(entry) = slot.entry.as_mut() {
                entry.mark_accessed();
                let value = entry.value.clone();

                if !entry.is_stale() {
                    self.record(stats, |s| s.hits += 1);
                    debug!("Cache hit: {}", key);
                    return Ok(ReadOutcome::new(value, ReadSource::Fresh));
                }

                self.record(stats, |s| s.stale_hits += 1);
                if slot.current_fetch().is_some() {
                    self.record(stats, |s| s.deduplicated += 1);
                } else {
                    debug!("Serving stale {} while revalidating", key);
                    let _revalidation = self.spawn_fetch(key, slot, next_seq, stats, fetcher);
                }
                return Ok(ReadOutcome::new(value, ReadSource::Stale));
            }

            self.record(stats, |s| s.misses += 1);
            match slot.current_fetch().map(|f| f.future.clone()) {
                Some(future) => {
                    debug!("Joining in-flight fetch for {}", key);
                    self.record(stats, |s| s.deduplicated += 1);
                    (future, ReadSource::Joined)
                }
                None => {
                    debug!("Cache miss: {}", key);
                    let future = self.spawn_fetch(key, slot, next_seq, stats, fetcher);
                    (future, ReadSource::Fetched)
                }
            }
        };

        let value = pending.await?;
        Ok(ReadOutcome::new(value, source))
    }

    /// Register interest in a key until the guard is dropped
    pub async fn observe(&self, key: &QueryKey) -> ObserverGuard {
        let mut guard = self.store.write().await;
        let min_seq = guard.next_seq + 1;
        let slot = guard
            .slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(min_seq));
        slot.observers.count.fetch_add(1, Ordering::SeqCst);

        ObserverGuard {
            key: key.clone(),
            state: Arc::clone(&slot.observers),
        }
    }

    /// Number of live observers of a key
    pub async fn observer_count(&self, key: &QueryKey) -> usize {
        let store = self.store.read().await;
        store
            .slots
            .get(key)
            .map(|slot| slot.observers.count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Snapshot of the entry for a key, without counting as a read
    pub async fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        let store = self.store.read().await;
        store.slots.get(key).and_then(|slot| slot.entry.clone())
    }

    /// Whether a fetch for the key is currently running
    pub async fn is_fetching(&self, key: &QueryKey) -> bool {
        let store = self.store.read().await;
        store
            .slots
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Mark every key under `prefix` stale and refetch the observed ones
    pub async fn invalidate(&self, prefix: &QueryKey) -> InvalidationEvent {
        self.invalidate_keys(std::slice::from_ref(prefix), InvalidationReason::Manual)
            .await
    }

    /// Invalidate everything the graph declares a confirmed mutation affects
    pub async fn invalidate_for(&self, mutation: &Mutation) -> InvalidationEvent {
        let prefixes = self.graph.resolve(mutation);
        debug!(
            "Mutation {:?} invalidates {} prefixes",
            mutation.kind(),
            prefixes.len()
        );
        self.invalidate_keys(&prefixes, InvalidationReason::Mutation(mutation.kind()))
            .await
    }

    async fn invalidate_keys(
        &self,
        prefixes: &[QueryKey],
        reason: InvalidationReason,
    ) -> InvalidationEvent {
        let (keys, refetches) = {
            let mut guard = self.store.write().await;
            let CacheStore {
                slots,
                next_seq,
                stats,
            } = &mut *guard;

            let mut keys = Vec::new();
            let mut refetches = Vec::new();

            for (key, slot) in slots.iter_mut() {
                if !prefixes.iter().any(|prefix| prefix.is_prefix_of(key)) {
                    continue;
                }

                slot.epoch += 1;
                if let Some(entry) = slot.entry.as_mut() {
                    entry.mark_invalidated();
                    self.record(stats, |s| s.invalidations += 1);
                }
                keys.push(key.clone());

                if slot.is_observed() {
                    if let Some(fetcher) = slot.fetcher.clone() {
                        let future = self.spawn_fetch(key, slot, next_seq, stats, fetcher);
                        refetches.push((key.clone(), future));
                    }
                }
            }

            (keys, refetches)
        };

        let refetched = refetches.len();
        let (refetch_keys, futures): (Vec<_>, Vec<_>) = refetches.into_iter().unzip();
        let results = join_all(futures).await;

        let mut failures = 0;
        for (key, result) in refetch_keys.iter().zip(results) {
            if let Err(e) = result {
                failures += 1;
                warn!("Refetch of {} after {} failed: {}", key, reason, e);
            }
        }

        debug!(
            "Invalidated {} keys ({}), refetched {}",
            keys.len(),
            reason,
            refetched
        );
        InvalidationEvent::new(reason, keys).with_refetches(refetched, failures)
    }

    /// Drop the data of every key under `prefix`
    ///
    /// Observed keys keep their registration and start empty on the next
    /// read; unobserved keys are forgotten entirely. Fetches already running
    /// for these keys can no longer store their result.
    pub async fn remove(&self, prefix: &QueryKey) -> InvalidationEvent {
        let mut guard = self.store.write().await;
        let CacheStore {
            slots, next_seq, ..
        } = &mut *guard;
        let barrier = *next_seq + 1;

        let mut keys = Vec::new();
        slots.retain(|key, slot| {
            if !prefix.is_prefix_of(key) {
                return true;
            }
            keys.push(key.clone());
            if slot.is_observed() {
                slot.entry = None;
                slot.in_flight = None;
                slot.epoch += 1;
                slot.min_seq = barrier;
                true
            } else {
                false
            }
        });

        debug!("Removed {} keys under {}", keys.len(), prefix);
        InvalidationEvent::new(InvalidationReason::Removed, keys)
    }

    /// Drop all data; used on logout or session end
    ///
    /// Observed keys keep their registration but lose their data and
    /// fetcher, so a still-mounted consumer starts empty on its next read
    /// and keeps receiving refetches afterwards.
    pub async fn clear(&self) -> InvalidationEvent {
        let mut guard = self.store.write().await;
        let CacheStore {
            slots,
            next_seq,
            stats,
        } = &mut *guard;
        let barrier = *next_seq + 1;

        let keys: Vec<QueryKey> = slots.keys().cloned().collect();
        slots.retain(|_, slot| {
            if !slot.is_observed() {
                return false;
            }
            slot.entry = None;
            slot.in_flight = None;
            slot.fetcher = None;
            slot.epoch += 1;
            slot.min_seq = barrier;
            true
        });
        stats.entries = 0;

        info!("Cleared {} keys from cache", keys.len());
        InvalidationEvent::new(InvalidationReason::Teardown, keys)
    }

    /// Forget unobserved keys idle for longer than the gc time
    pub async fn collect_garbage(&self) -> InvalidationEvent {
        let gc_time = chrono::Duration::from_std(self.config.gc_time)
            .unwrap_or(chrono::Duration::zero());
        let cutoff = Utc::now() - gc_time;

        let mut store = self.store.write().await;
        let mut keys = Vec::new();
        store.slots.retain(|key, slot| {
            let collectable =
                !slot.is_observed() && slot.in_flight.is_none() && slot.idle_since() <= cutoff;
            if collectable {
                keys.push(key.clone());
            }
            !collectable
        });

        if !keys.is_empty() {
            debug!("Garbage collected {} keys", keys.len());
        }
        InvalidationEvent::new(InvalidationReason::GarbageCollected, keys)
    }

    /// Start the periodic gc task if the configuration enables it
    pub fn spawn_auto_gc(&self) -> Option<JoinHandle<()>> {
        if !self.config.enable_auto_gc {
            return None;
        }
        Some(tokio::spawn(start_auto_gc(self.clone())))
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let mut stats = store.stats.clone();
        stats.entries = store.slots.values().filter(|s| s.entry.is_some()).count();
        stats
    }

    /// Number of keys holding data
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.slots.values().filter(|s| s.entry.is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn record(&self, stats: &mut CacheStats, update: impl FnOnce(&mut CacheStats)) {
        if self.config.enable_metrics {
            update(stats);
        }
    }

    /// Start a fetch for `key` as a detached task and register it on the slot
    fn spawn_fetch(
        &self,
        key: &QueryKey,
        slot: &mut Slot,
        next_seq: &mut u64,
        stats: &mut CacheStats,
        fetcher: Fetcher,
    ) -> SharedFetch {
        *next_seq += 1;
        let seq = *next_seq;
        let epoch = slot.epoch;
        self.record(stats, |s| s.fetches += 1);

        let cache = self.clone();
        let task_key = key.clone();
        let future: FetchFuture = async move {
            let result = fetcher().await;
            cache.complete_fetch(&task_key, seq, epoch, &result).await;
            result
        }
        .boxed();

        let shared = future.shared();
        tokio::spawn(shared.clone());

        slot.in_flight = Some(InFlight {
            seq,
            epoch,
            future: shared.clone(),
        });
        shared
    }

    async fn complete_fetch(
        &self,
        key: &QueryKey,
        seq: u64,
        epoch: u64,
        result: &Result<CacheValue>,
    ) {
        let mut guard = self.store.write().await;
        let CacheStore { slots, stats, .. } = &mut *guard;

        let Some(slot) = slots.get_mut(key) else {
            debug!("Dropping fetch result for forgotten key {}", key);
            self.record(stats, |s| s.discarded_results += 1);
            return;
        };

        if slot.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            slot.in_flight = None;
        }

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                self.record(stats, |s| s.fetch_errors += 1);
                debug!("Fetch #{} for {} failed: {}", seq, key, e);
                return;
            }
        };

        let superseded = seq < slot.min_seq
            || slot
                .entry
                .as_ref()
                .is_some_and(|entry| entry.metadata.fetch_seq > seq);
        if superseded {
            debug!("Discarding superseded fetch #{} for {}", seq, key);
            self.record(stats, |s| s.discarded_results += 1);
            return;
        }

        let stale_time = self.config.stale_time_for(key);
        match slot.entry.as_mut() {
            Some(entry) => entry.replace(value.clone(), stale_time, seq),
            None => {
                slot.entry = Some(CacheEntry::new(key.clone(), value.clone(), stale_time, seq));
            }
        }
        if epoch != slot.epoch {
            if let Some(entry) = slot.entry.as_mut() {
                entry.mark_invalidated();
            }
        }
        slot.last_used = Utc::now();
    }
}

/// Background task for periodic garbage collection
pub async fn start_auto_gc(cache: QueryCache) {
    let interval = cache.config.gc_interval;

    info!("Starting automatic cache gc task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let event = cache.collect_garbage().await;
        if !event.keys.is_empty() {
            debug!("Auto gc: {} keys", event.keys.len());
        }
    }
}
