//! Time-bounded search result cache
//!
//! Entries are keyed by the normalized (term, limit, type filter) triple.
//! An entry older than the TTL is treated as absent on lookup and is
//! overwritten by the next successful search for the same key.

use super::strategy::SearchTier;
use crate::memory::Artifact;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Deterministic cache key derived from a search request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    term: String,
    limit: usize,
    type_filter: String,
}

impl CacheKey {
    pub fn new(term: &str, limit: usize, type_filter: &str) -> Self {
        Self {
            term: term.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(),
            limit,
            type_filter: type_filter.trim().to_lowercase(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.term, self.limit, self.type_filter)
    }
}

/// A cached search result set
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub artifacts: Vec<Artifact>,
    pub tier: SearchTier,
    pub inserted_at: DateTime<Utc>,
}

/// TTL cache owned by a single search coordinator
pub struct SearchCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl SearchCache {
    /// Create a cache whose entries live for `ttl_ms` milliseconds
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::milliseconds(i64::try_from(ttl_ms).unwrap_or(i64::MAX)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.get_at(key, Utc::now())
    }

    /// Look up an entry as of `now`
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
    }

    /// Insert or overwrite an entry, purging expired ones
    pub fn insert(&mut self, key: CacheKey, artifacts: Vec<Artifact>, tier: SearchTier) {
        self.insert_at(key, artifacts, tier, Utc::now());
    }

    pub fn insert_at(
        &mut self,
        key: CacheKey,
        artifacts: Vec<Artifact>,
        tier: SearchTier,
        now: DateTime<Utc>,
    ) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.inserted_at <= ttl);
        self.entries.insert(
            key,
            CacheEntry {
                artifacts,
                tier,
                inserted_at: now,
            },
        );
    }

    /// Drop every entry
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.inserted_at > self.ttl
    }
}
