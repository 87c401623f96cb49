//! Cache entry with freshness tracking

use crate::cache::types::CacheValue;
use crate::keys::QueryKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached server response and its freshness metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The query key
    pub key: QueryKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Create an entry for a fetch result, fresh for `stale_time`
    pub fn new(key: QueryKey, value: CacheValue, stale_time: Duration, fetch_seq: u64) -> Self {
        let now = Utc::now();
        let stale_after =
            now + chrono::Duration::from_std(stale_time).unwrap_or(chrono::Duration::zero());

        Self {
            key,
            value,
            metadata: CacheMetadata {
                fetched_at: now,
                accessed_at: now,
                stale_after,
                invalidated: false,
                fetch_seq,
                access_count: 0,
                version: 1,
            },
        }
    }

    /// Stale once its stale time has elapsed or it has been invalidated
    pub fn is_stale(&self) -> bool {
        self.metadata.invalidated || Utc::now() >= self.metadata.stale_after
    }

    pub fn mark_invalidated(&mut self) {
        self.metadata.invalidated = true;
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Replace the value with a newer fetch result
    pub fn replace(&mut self, value: CacheValue, stale_time: Duration, fetch_seq: u64) {
        let now = Utc::now();
        self.value = value;
        self.metadata.fetched_at = now;
        self.metadata.stale_after =
            now + chrono::Duration::from_std(stale_time).unwrap_or(chrono::Duration::zero());
        self.metadata.invalidated = false;
        self.metadata.fetch_seq = fetch_seq;
        self.metadata.version += 1;
    }

    /// Time since the value was fetched
    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.fetched_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Time since the entry was last read
    pub fn time_since_access(&self) -> Duration {
        (Utc::now() - self.metadata.accessed_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the value was fetched
    pub fetched_at: DateTime<Utc>,

    /// Last read time
    pub accessed_at: DateTime<Utc>,

    /// The value counts as stale from this instant on
    pub stale_after: DateTime<Utc>,

    /// Marked stale by invalidation, regardless of age
    pub invalidated: bool,

    /// Sequence number of the fetch that produced the value
    pub fetch_seq: u64,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Version number (incremented on every replacement)
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            keys::jobs::detail("J1"),
            json!({"id": "J1"}),
            Duration::from_secs(300),
            1,
        );

        assert_eq!(entry.key, keys::jobs::detail("J1"));
        assert!(!entry.is_stale());
        assert_eq!(entry.metadata.version, 1);
        assert_eq!(entry.metadata.fetch_seq, 1);
    }

    #[test]
    fn test_entry_goes_stale() {
        let entry = CacheEntry::new(
            keys::notifications::unread(),
            json!({"count": 3}),
            Duration::from_millis(50),
            1,
        );

        assert!(!entry.is_stale());
        sleep(Duration::from_millis(80));
        assert!(entry.is_stale());
    }

    #[test]
    fn test_zero_stale_time_is_immediately_stale() {
        let entry = CacheEntry::new(keys::dashboard::stats(), json!({}), Duration::ZERO, 1);
        assert!(entry.is_stale());
    }

    #[test]
    fn test_invalidation_overrides_age() {
        let mut entry = CacheEntry::new(
            keys::jobs::stats(),
            json!({"total": 4}),
            Duration::from_secs(3600),
            1,
        );
        entry.mark_invalidated();
        assert!(entry.is_stale());
    }

    #[test]
    fn test_replace_resets_freshness() {
        let mut entry = CacheEntry::new(
            keys::jobs::stats(),
            json!({"total": 4}),
            Duration::from_secs(3600),
            1,
        );
        entry.mark_invalidated();
        entry.replace(json!({"total": 5}), Duration::from_secs(3600), 7);

        assert!(!entry.is_stale());
        assert_eq!(entry.value, json!({"total": 5}));
        assert_eq!(entry.metadata.fetch_seq, 7);
        assert_eq!(entry.metadata.version, 2);
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry = CacheEntry::new(
            keys::jobs::stats(),
            json!(null),
            Duration::from_secs(3600),
            1,
        );

        let initial_time = entry.metadata.accessed_at;
        sleep(Duration::from_millis(10));
        entry.mark_accessed();

        assert_eq!(entry.metadata.access_count, 1);
        assert!(entry.metadata.accessed_at > initial_time);
    }
}
