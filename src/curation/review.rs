//! Artifact review
//!
//! Selects a candidate set by policy, scores every candidate and, in
//! auto-clean mode, removes the ones scored DELETE. Each candidate is
//! recorded in the report (and logged) before it is deleted, so the caller
//! always sees what was removed.

use super::duplicates::redundant_artifacts;
use super::scorer::{QualityAction, QualityReport, QualityScorer};
use crate::config::ReviewConfig;
use crate::error::{Error, Result};
use crate::memory::{Artifact, ArtifactQuery, QueryOrder, Store};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How review candidates are selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    /// Most recently created
    #[default]
    Recent,
    /// Lowest relevance
    LowScore,
    /// Redundant copies of duplicated content
    Duplicates,
    /// Older than the staleness horizon, oldest first
    Stale,
}

impl std::fmt::Display for ReviewPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recent => write!(f, "recent"),
            Self::LowScore => write!(f, "low_score"),
            Self::Duplicates => write!(f, "duplicates"),
            Self::Stale => write!(f, "stale"),
        }
    }
}

impl std::str::FromStr for ReviewPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "recent" => Ok(Self::Recent),
            "low_score" | "low" | "lowest" => Ok(Self::LowScore),
            "duplicates" | "dupes" => Ok(Self::Duplicates),
            "stale" | "old" => Ok(Self::Stale),
            other => Err(Error::Parse(format!("unknown review policy: {}", other))),
        }
    }
}

/// One reviewed candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub artifact: Artifact,
    pub quality: QualityReport,
}

/// A deletion that the store rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub id: Uuid,
    pub error: String,
}

/// Outcome of a review run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub policy: ReviewPolicy,
    pub auto_clean: bool,
    pub entries: Vec<ReviewEntry>,
    pub keep: usize,
    pub review: usize,
    pub delete: usize,
    /// IDs removed in auto-clean mode
    pub deleted: Vec<Uuid>,
    pub delete_failures: Vec<DeleteFailure>,
}

/// Review engine
pub struct ReviewEngine {
    store: Arc<dyn Store>,
    scorer: QualityScorer,
    config: ReviewConfig,
}

impl ReviewEngine {
    pub fn new(store: Arc<dyn Store>, scorer: QualityScorer, config: ReviewConfig) -> Self {
        Self {
            store,
            scorer,
            config,
        }
    }

    /// Select up to `limit` candidates by policy (config default when `None`)
    pub async fn candidates(&self, policy: ReviewPolicy, limit: Option<usize>) -> Result<Vec<Artifact>> {
        let limit = limit.unwrap_or(self.config.default_limit);
        match policy {
            ReviewPolicy::Recent => {
                self.store
                    .query(&ArtifactQuery::all().order_by(QueryOrder::CreatedDesc).limit(limit))
                    .await
            }
            ReviewPolicy::LowScore => {
                self.store
                    .query(&ArtifactQuery::all().order_by(QueryOrder::RelevanceAsc).limit(limit))
                    .await
            }
            ReviewPolicy::Duplicates => {
                let all = self
                    .store
                    .query(&ArtifactQuery::all().order_by(QueryOrder::CreatedAsc))
                    .await?;
                let mut redundant = redundant_artifacts(&all);
                redundant.truncate(limit);
                Ok(redundant)
            }
            ReviewPolicy::Stale => {
                let days = self.config.stale_after_days;
                let horizon = Duration::try_days(days)
                    .and_then(|age| Utc::now().checked_sub_signed(age))
                    .ok_or_else(|| {
                        Error::Config(format!("review.stale_after_days ({}) is out of range", days))
                    })?;
                self.store
                    .query(
                        &ArtifactQuery::all()
                            .created_before(horizon)
                            .order_by(QueryOrder::CreatedAsc)
                            .limit(limit),
                    )
                    .await
            }
        }
    }

    /// Review candidates selected by `policy`; remove DELETE candidates when `auto_clean`.
    pub async fn review(
        &self,
        policy: ReviewPolicy,
        limit: Option<usize>,
        auto_clean: bool,
    ) -> Result<ReviewReport> {
        let candidates = self.candidates(policy, limit).await?;
        let mut report = ReviewReport {
            policy,
            auto_clean,
            entries: Vec::with_capacity(candidates.len()),
            keep: 0,
            review: 0,
            delete: 0,
            deleted: Vec::new(),
            delete_failures: Vec::new(),
        };

        for artifact in candidates {
            let quality = self.scorer.score(&artifact);
            let id = artifact.id;
            let action = quality.action;
            match action {
                QualityAction::Keep => report.keep += 1,
                QualityAction::Review => report.review += 1,
                QualityAction::Delete => report.delete += 1,
            }

            tracing::info!(
                artifact_id = %id,
                quality = quality.quality,
                action = ?action,
                "Reviewed artifact"
            );
            report.entries.push(ReviewEntry { artifact, quality });

            if auto_clean && action == QualityAction::Delete {
                match self.store.delete(&id).await {
                    Ok(()) => report.deleted.push(id),
                    Err(e) => {
                        tracing::warn!(artifact_id = %id, error = %e, "Auto-clean delete failed");
                        report.delete_failures.push(DeleteFailure {
                            id,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}
