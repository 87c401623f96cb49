//! Read hooks
//!
//! A [`Query`] is one mounted consumer of a cache key: it holds an observer
//! registration for as long as it lives, so invalidations of its key refetch
//! eagerly, and it decodes cached JSON into the typed value.

use crate::cache::{fetcher, Fetcher, ObserverGuard, QueryCache};
use crate::error::{ClientError, Result};
use crate::keys::QueryKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Mutex;
use tracing::debug;

/// What a view renders for a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// Last known value, possibly stale
    pub data: Option<T>,

    /// No value yet and a fetch is running
    pub is_loading: bool,

    /// A value is shown while a newer one is being fetched
    pub is_refetching: bool,

    /// Error of the most recent read, if it failed
    pub error: Option<ClientError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_refetching: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }
}

/// Mounted read of one query key
pub struct Query<T> {
    cache: QueryCache,
    key: QueryKey,
    fetcher: Fetcher,
    last_error: Mutex<Option<ClientError>>,
    _observer: ObserverGuard,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query").field("key", &self.key).finish()
    }
}

impl<T> Query<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Register as an observer of `key`, reading through `fetch` on a miss
    pub async fn mount<F, Fut>(cache: &QueryCache, key: QueryKey, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let observer = cache.observe(&key).await;
        let fetcher = fetcher(move || {
            let pending = fetch();
            async move { Ok::<_, ClientError>(serde_json::to_value(pending.await?)?) }
        });

        Self {
            cache: cache.clone(),
            key,
            fetcher,
            last_error: Mutex::new(None),
            _observer: observer,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Read through the cache and report the resulting state
    ///
    /// On failure the previously cached value, if any, stays in `data`.
    pub async fn fetch(&self) -> QueryState<T> {
        match self.load().await {
            Ok((data, is_refetching)) => QueryState {
                data: Some(data),
                is_loading: false,
                is_refetching,
                error: None,
            },
            Err(error) => {
                let mut state = self.state().await;
                state.is_loading = false;
                state.error = Some(error);
                state
            }
        }
    }

    /// Current state without triggering a fetch
    pub async fn state(&self) -> QueryState<T> {
        let fetching = self.cache.is_fetching(&self.key).await;
        let data = self
            .cache
            .peek(&self.key)
            .await
            .and_then(|entry| serde_json::from_value::<T>(entry.value).ok());

        QueryState {
            is_loading: data.is_none() && fetching,
            is_refetching: data.is_some() && fetching,
            data,
            error: self.error(),
        }
    }

    /// The value alone, as a `Result`
    pub async fn data(&self) -> Result<T> {
        self.load().await.map(|(data, _)| data)
    }

    /// Mark the key stale, wait for the refetch, then read
    pub async fn refetch(&self) -> QueryState<T> {
        debug!("Manual refetch of {}", self.key);
        self.cache.invalidate(&self.key).await;
        self.fetch().await
    }

    pub fn error(&self) -> Option<ClientError> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn load(&self) -> Result<(T, bool)> {
        let result = self
            .cache
            .read(&self.key, self.fetcher.clone())
            .await
            .and_then(|outcome| {
                let refetching = outcome.is_refetching();
                let data = serde_json::from_value::<T>(outcome.value)?;
                Ok((data, refetching))
            });

        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = result.as_ref().err().cloned();
        result
    }
}

/// Cached value for `key` if present and not stale
///
/// Used for pre-flight checks: a stale entry may no longer reflect the server,
/// so it is ignored.
pub(crate) async fn fresh_cached<T: DeserializeOwned>(cache: &QueryCache, key: &QueryKey) -> Option<T> {
    let entry = cache.peek(key).await?;
    if entry.is_stale() {
        return None;
    }
    serde_json::from_value(entry.value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::keys;
    use crate::model::UnreadCount;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    async fn unread_query(cache: &QueryCache, counter: Arc<AtomicU64>) -> Query<UnreadCount> {
        Query::mount(cache, keys::notifications::unread(), move || {
            let counter = Arc::clone(&counter);
            async move {
                Ok(UnreadCount {
                    count: counter.fetch_add(1, Ordering::SeqCst) + 1,
                })
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_fetch_then_serve_from_cache() {
        let cache = QueryCache::new(CacheConfig::default());
        let counter = Arc::new(AtomicU64::new(0));
        let query = unread_query(&cache, Arc::clone(&counter)).await;

        let first = query.fetch().await;
        assert_eq!(first.data, Some(UnreadCount { count: 1 }));
        assert!(first.is_success());

        let second = query.fetch().await;
        assert_eq!(second.data, Some(UnreadCount { count: 1 }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_before_fetch_is_empty() {
        let cache = QueryCache::new(CacheConfig::default());
        let query = unread_query(&cache, Arc::new(AtomicU64::new(0))).await;

        let state = query.state().await;
        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_refetch_loads_new_value() {
        let cache = QueryCache::new(CacheConfig::default());
        let counter = Arc::new(AtomicU64::new(0));
        let query = unread_query(&cache, Arc::clone(&counter)).await;

        query.fetch().await;
        let state = query.refetch().await;
        assert_eq!(state.data, Some(UnreadCount { count: 2 }));
    }

    #[tokio::test]
    async fn test_error_is_recorded() {
        let cache = QueryCache::new(CacheConfig::default());
        let query: Query<UnreadCount> = Query::mount(&cache, keys::notifications::unread(), || async {
            Err(ClientError::Network("offline".to_string()))
        })
        .await;

        let state = query.fetch().await;
        assert!(state.data.is_none());
        assert_eq!(state.error, Some(ClientError::Network("offline".to_string())));
        assert!(query.error().is_some());
        assert!(query.data().await.is_err());
    }

    #[tokio::test]
    async fn test_mount_registers_observer() {
        let cache = QueryCache::new(CacheConfig::default());
        let key = keys::notifications::unread();
        let query = unread_query(&cache, Arc::new(AtomicU64::new(0))).await;
        assert_eq!(cache.observer_count(&key).await, 1);

        drop(query);
        assert_eq!(cache.observer_count(&key).await, 0);
    }

    #[tokio::test]
    async fn test_fresh_cached_ignores_stale_entries() {
        let cache = QueryCache::new(CacheConfig::default());
        let counter = Arc::new(AtomicU64::new(0));
        let query = unread_query(&cache, Arc::clone(&counter)).await;
        query.fetch().await;

        let key = keys::notifications::unread();
        assert_eq!(
            fresh_cached::<UnreadCount>(&cache, &key).await,
            Some(UnreadCount { count: 1 })
        );

        drop(query);
        cache.invalidate(&key).await;
        assert_eq!(fresh_cached::<UnreadCount>(&cache, &key).await, None);
    }
}
