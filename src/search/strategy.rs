//! Pluggable search strategies
//!
//! ```text
//! request → [SemanticStrategy] ──error──→ [BasicStrategy] ──error──→ Search error
//!                 │ ok                         │ ok
//!                 └──────────→ results ←───────┘ (tagged `basic`, degraded)
//! ```
//!
//! A strategy failing with an error hands over to the next one; an empty
//! result set is a success and stops the chain.

use crate::error::Result;
use crate::memory::{Artifact, ArtifactQuery, ArtifactType, MatchFields, QueryOrder, Store};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which tier of the chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    Semantic,
    /// Degraded fallback result
    Basic,
}

impl SearchTier {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Basic)
    }
}

/// A search request after option parsing
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub term: String,
    pub limit: usize,
    /// `None` means the `all` wildcard
    pub artifact_type: Option<ArtifactType>,
}

impl SearchRequest {
    /// Type filter as used in the cache key
    pub fn type_filter(&self) -> &'static str {
        self.artifact_type.map_or("all", |at| at.as_str())
    }
}

/// One tier of the search chain.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Run the search against the store
    async fn execute(&self, store: &dyn Store, request: &SearchRequest) -> Result<Vec<Artifact>>;

    /// Tier reported for results produced by this strategy
    fn tier(&self) -> SearchTier;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Primary strategy: approximate match on content, type or context, most
/// relevant first, honouring the type filter.
pub struct SemanticStrategy;

#[async_trait]
impl SearchStrategy for SemanticStrategy {
    async fn execute(&self, store: &dyn Store, request: &SearchRequest) -> Result<Vec<Artifact>> {
        let query = ArtifactQuery::all()
            .matching(request.term.as_str(), MatchFields::Any)
            .of_type(request.artifact_type)
            .order_by(QueryOrder::RelevanceDesc)
            .limit(request.limit);
        store.query(&query).await
    }

    fn tier(&self) -> SearchTier {
        SearchTier::Semantic
    }

    fn name(&self) -> &str {
        "semantic"
    }
}

/// Fallback strategy: content match only, newest first.
pub struct BasicStrategy;

#[async_trait]
impl SearchStrategy for BasicStrategy {
    async fn execute(&self, store: &dyn Store, request: &SearchRequest) -> Result<Vec<Artifact>> {
        let query = ArtifactQuery::all()
            .matching(request.term.as_str(), MatchFields::Content)
            .order_by(QueryOrder::CreatedDesc)
            .limit(request.limit);
        store.query(&query).await
    }

    fn tier(&self) -> SearchTier {
        SearchTier::Basic
    }

    fn name(&self) -> &str {
        "basic"
    }
}

/// The default chain: semantic, then basic
pub fn default_chain() -> Vec<Box<dyn SearchStrategy>> {
    vec![Box::new(SemanticStrategy), Box::new(BasicStrategy)]
}
