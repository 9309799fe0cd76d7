//! Ranked-result cache keyed by [`rerank_cache_key`](crate::hashing::rerank_cache_key).
//!
//! The cache is not internally synchronized. The owning
//! [`Reranker`](crate::scoring::Reranker) keeps it behind the same lock as its
//! latency telemetry, so insert, evict, clear and counter updates are
//! serialized together.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::scoring::Candidate;

/// Result of a cache probe.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Full ranked list stored for the key.
    Hit(Vec<Candidate>),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// LRU map from cache key to the complete ranked list, with hit/miss counters.
pub struct RerankCache {
    entries: LruCache<u64, Vec<Candidate>>,
    hits: u64,
    misses: u64,
}

impl RerankCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Probes `key`, promoting it to most-recently-used on a hit.
    pub fn lookup(&mut self, key: u64) -> CacheLookup {
        match self.entries.get(&key) {
            Some(ranked) => {
                self.hits += 1;
                CacheLookup::Hit(ranked.clone())
            }
            None => {
                self.misses += 1;
                CacheLookup::Miss
            }
        }
    }

    /// Stores `ranked` under `key`, returning the key evicted to make room (if any).
    pub fn insert(&mut self, key: u64, ranked: Vec<Candidate>) -> Option<u64> {
        match self.entries.push(key, ranked) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    /// Drops every entry and resets the hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn contains(&self, key: u64) -> bool {
        self.entries.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Hits over lookups; `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

impl std::fmt::Debug for RerankCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankCache")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
