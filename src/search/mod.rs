//! Search coordination
//!
//! The [`SearchCoordinator`] consults its [`SearchCache`] first and, on a
//! miss, walks the strategy chain until one strategy succeeds. Each strategy
//! is attempted at most once per call. A successful result is cached under
//! the request's key, except a degraded result for a typed request, which
//! the basic tier cannot honor. A failure of the whole chain writes nothing.

pub mod cache;
pub mod strategy;

pub use cache::{CacheEntry, CacheKey, SearchCache};
pub use strategy::{
    default_chain, BasicStrategy, SearchRequest, SearchStrategy, SearchTier, SemanticStrategy,
};

use crate::error::{Error, Result};
use crate::memory::{Artifact, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub term: String,
    pub artifacts: Vec<Artifact>,
    /// Tier that produced the artifacts; `basic` marks a degraded result
    pub tier: SearchTier,
    /// Whether the result was served from the cache
    pub cached: bool,
}

/// Runs the strategy chain against the store, owning the result cache.
pub struct SearchCoordinator {
    store: Arc<dyn Store>,
    strategies: Vec<Box<dyn SearchStrategy>>,
    cache: SearchCache,
}

impl SearchCoordinator {
    /// Create a coordinator with the default semantic → basic chain
    pub fn new(store: Arc<dyn Store>, cache_ttl_ms: u64) -> Self {
        Self::with_strategies(store, default_chain(), cache_ttl_ms)
    }

    /// Create a coordinator with a custom strategy chain
    pub fn with_strategies(
        store: Arc<dyn Store>,
        strategies: Vec<Box<dyn SearchStrategy>>,
        cache_ttl_ms: u64,
    ) -> Self {
        Self {
            store,
            strategies,
            cache: SearchCache::new(cache_ttl_ms),
        }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Drop every cached result set, returning how many were dropped
    pub fn clear_cache(&mut self) -> usize {
        let cleared = self.cache.clear();
        tracing::debug!(cleared, "Search cache cleared");
        cleared
    }

    /// Search for artifacts matching the request
    pub async fn search(&mut self, request: &SearchRequest) -> Result<SearchOutcome> {
        let key = CacheKey::new(&request.term, request.limit, request.type_filter());

        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!(key = %key, "Search cache hit");
            return Ok(SearchOutcome {
                term: request.term.clone(),
                artifacts: entry.artifacts.clone(),
                tier: entry.tier,
                cached: true,
            });
        }

        let mut errors = Vec::new();
        for strategy in &self.strategies {
            match strategy.execute(self.store.as_ref(), request).await {
                Ok(artifacts) => {
                    let tier = strategy.tier();
                    if !errors.is_empty() {
                        tracing::warn!(
                            strategy = strategy.name(),
                            "Search served by fallback strategy"
                        );
                    }
                    if tier.is_degraded() && request.artifact_type.is_some() {
                        // Basic search ignores the type filter
                        tracing::debug!(key = %key, "Degraded typed result not cached");
                    } else {
                        self.cache.insert(key, artifacts.clone(), tier);
                    }
                    return Ok(SearchOutcome {
                        term: request.term.clone(),
                        artifacts,
                        tier,
                        cached: false,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Search strategy failed"
                    );
                    errors.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(Error::Search(if errors.is_empty() {
            "no search strategies configured".to_string()
        } else {
            errors.join("; ")
        }))
    }
}
