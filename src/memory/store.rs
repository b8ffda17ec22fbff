//! Store interface and query descriptor
//!
//! The curation core never builds backend-specific queries. It describes what
//! it wants with an [`ArtifactQuery`] (matching predicate, ordering, limit)
//! and the [`Store`] implementation is responsible for executing it.

use super::artifact::{Artifact, ArtifactType};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which artifact fields a text pattern is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFields {
    /// Content only
    Content,
    /// Content, artifact type, or serialized context
    Any,
}

/// Case-insensitive substring predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub pattern: String,
    pub fields: MatchFields,
}

impl TextMatch {
    /// Whether the artifact satisfies this predicate
    pub fn matches(&self, artifact: &Artifact) -> bool {
        let needle = self.pattern.to_lowercase();
        if artifact.content.to_lowercase().contains(&needle) {
            return true;
        }
        match self.fields {
            MatchFields::Content => false,
            MatchFields::Any => {
                artifact.artifact_type.as_str().contains(&needle)
                    || artifact.context.search_text().to_lowercase().contains(&needle)
            }
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrder {
    #[default]
    RelevanceDesc,
    RelevanceAsc,
    CreatedDesc,
    CreatedAsc,
}

/// Opaque query descriptor handed to the Store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactQuery {
    pub text: Option<TextMatch>,
    pub artifact_type: Option<ArtifactType>,
    pub created_before: Option<DateTime<Utc>>,
    pub order: QueryOrder,
    pub limit: Option<usize>,
}

impl ArtifactQuery {
    /// Every artifact, highest relevance first
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(mut self, pattern: impl Into<String>, fields: MatchFields) -> Self {
        self.text = Some(TextMatch {
            pattern: pattern.into(),
            fields,
        });
        self
    }

    pub fn of_type(mut self, artifact_type: Option<ArtifactType>) -> Self {
        self.artifact_type = artifact_type;
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn order_by(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the artifact satisfies every predicate of this query
    pub fn accepts(&self, artifact: &Artifact) -> bool {
        if let Some(ref text) = self.text {
            if !text.matches(artifact) {
                return false;
            }
        }
        if let Some(at) = self.artifact_type {
            if artifact.artifact_type != at {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if artifact.created_at >= before {
                return false;
            }
        }
        true
    }

    /// Sort and truncate rows according to this query
    pub fn arrange(&self, mut rows: Vec<Artifact>) -> Vec<Artifact> {
        match self.order {
            QueryOrder::RelevanceDesc => rows.sort_by(|a, b| {
                b.sort_relevance()
                    .total_cmp(&a.sort_relevance())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            QueryOrder::RelevanceAsc => rows.sort_by(|a, b| {
                a.sort_relevance()
                    .total_cmp(&b.sort_relevance())
                    .then_with(|| a.created_at.cmp(&b.created_at))
            }),
            QueryOrder::CreatedDesc => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            QueryOrder::CreatedAsc => rows.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// Storage backend for artifacts.
///
/// All methods are suspension points; the curation core awaits each call
/// before issuing the next one.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute a query and return matching rows in the requested order
    async fn query(&self, query: &ArtifactQuery) -> Result<Vec<Artifact>>;

    /// Persist a new artifact, returning its ID
    async fn insert(&self, artifact: Artifact) -> Result<Uuid>;

    /// Permanently delete an artifact
    async fn delete(&self, id: &Uuid) -> Result<()>;

    /// Move an artifact out of the searchable set without destroying it
    async fn archive(&self, id: &Uuid) -> Result<()>;

    /// Replace an artifact's relevance score
    async fn update_relevance(&self, id: &Uuid, score: f64) -> Result<()>;

    /// Rebuild search indexes, returning the number of indexed artifacts
    async fn rebuild_indexes(&self) -> Result<usize>;
}
