//! Core type definitions for the query cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cached payload: the decoded JSON body of a server read
pub type CacheValue = serde_json::Value;

/// Counters for cache behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,

    /// Reads served from a stale entry while a refetch runs
    pub stale_hits: u64,

    /// Reads that had nothing to serve and waited on a fetch
    pub misses: u64,

    /// Fetches actually started
    pub fetches: u64,

    /// Reads that joined a fetch already in flight
    pub deduplicated: u64,

    /// Entries marked stale by invalidation
    pub invalidations: u64,

    /// Fetches that returned an error
    pub fetch_errors: u64,

    /// Fetch results dropped because a newer write superseded them
    pub discarded_results: u64,

    /// Number of entries currently holding data
    pub entries: usize,
}

impl CacheStats {
    /// Share of reads served without waiting, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            (served as f64 / total as f64) * 100.0
        }
    }

    pub fn total_reads(&self) -> u64 {
        self.hits + self.stale_hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, stale_hits: {}, misses: {}, hit_rate: {:.2}%, fetches: {}, deduplicated: {}, errors: {}, entries: {} }}",
            self.hits,
            self.stale_hits,
            self.misses,
            self.hit_rate(),
            self.fetches,
            self.deduplicated,
            self.fetch_errors,
            self.entries
        )
    }
}

/// Where a read's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadSource {
    /// Fresh cached entry, no network
    Fresh,

    /// Stale cached entry; a background refetch was started or joined
    Stale,

    /// This read started the fetch and awaited it
    Fetched,

    /// This read awaited a fetch another reader started
    Joined,
}

impl ReadSource {
    /// Whether the read was satisfied without a round trip
    pub fn from_cache(&self) -> bool {
        matches!(self, ReadSource::Fresh | ReadSource::Stale)
    }
}

impl fmt::Display for ReadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadSource::Fresh => write!(f, "fresh"),
            ReadSource::Stale => write!(f, "stale"),
            ReadSource::Fetched => write!(f, "fetched"),
            ReadSource::Joined => write!(f, "joined"),
        }
    }
}

/// Result of a cache read
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub value: CacheValue,
    pub source: ReadSource,
}

impl ReadOutcome {
    pub fn new(value: CacheValue, source: ReadSource) -> Self {
        Self { value, source }
    }

    /// A background refetch is running for the served value
    pub fn is_refetching(&self) -> bool {
        self.source == ReadSource::Stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 70,
            stale_hits: 10,
            misses: 20,
            ..Default::default()
        };

        assert_eq!(stats.hit_rate(), 80.0);
        assert_eq!(stats.total_reads(), 100);
    }

    #[test]
    fn test_cache_stats_zero_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_cache_stats_display() {
        let stats = CacheStats {
            hits: 100,
            misses: 50,
            entries: 75,
            ..Default::default()
        };

        let display = format!("{}", stats);
        assert!(display.contains("hits: 100"));
        assert!(display.contains("misses: 50"));
    }

    #[test]
    fn test_read_source() {
        assert!(ReadSource::Fresh.from_cache());
        assert!(ReadSource::Stale.from_cache());
        assert!(!ReadSource::Joined.from_cache());
        assert_eq!(ReadSource::Fetched.to_string(), "fetched");

        let outcome = ReadOutcome::new(serde_json::json!({"id": 1}), ReadSource::Stale);
        assert!(outcome.is_refetching());
    }
}
