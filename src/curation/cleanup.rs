//! Artifact cleanup
//!
//! Conservative mode selects artifacts the scorer recommends deleting.
//! Aggressive mode also selects REVIEW artifacts and redundant duplicates.
//! Every run is a dry run unless `execute` is set; an executed run issues
//! exactly one delete per reported candidate.

use super::duplicates::redundant_artifacts;
use super::review::DeleteFailure;
use super::scorer::{QualityAction, QualityIssue, QualityScorer};
use crate::config::CleanupConfig;
use crate::error::Result;
use crate::memory::{Artifact, ArtifactQuery, QueryOrder, Store};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Candidate selection threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    #[default]
    Conservative,
    Aggressive,
}

/// Why an artifact was selected for cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupReason {
    LowQualityScore,
    TooShort,
    LowRelevance,
    Duplicate,
}

impl std::fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowQualityScore => write!(f, "low quality score"),
            Self::TooShort => write!(f, "content too short"),
            Self::LowRelevance => write!(f, "low relevance"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// An artifact selected for cleanup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupCandidate {
    pub artifact: Artifact,
    pub reason: CleanupReason,
    pub quality: f64,
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub mode: CleanupMode,
    pub dry_run: bool,
    pub candidates: Vec<CleanupCandidate>,
    pub deleted: Vec<Uuid>,
    pub delete_failures: Vec<DeleteFailure>,
}

/// Cleanup engine
pub struct CleanupEngine {
    store: Arc<dyn Store>,
    scorer: QualityScorer,
    config: CleanupConfig,
}

impl CleanupEngine {
    pub fn new(store: Arc<dyn Store>, scorer: QualityScorer, config: CleanupConfig) -> Self {
        Self {
            store,
            scorer,
            config,
        }
    }

    /// Select cleanup candidates for the given mode
    pub async fn candidates(&self, mode: CleanupMode) -> Result<Vec<CleanupCandidate>> {
        let all = self
            .store
            .query(&ArtifactQuery::all().order_by(QueryOrder::RelevanceAsc))
            .await?;

        let mut candidates = Vec::new();
        let mut selected: HashSet<Uuid> = HashSet::new();

        if mode == CleanupMode::Aggressive {
            for artifact in redundant_artifacts(&all) {
                selected.insert(artifact.id);
                let quality = self.scorer.score(&artifact).quality;
                candidates.push(CleanupCandidate {
                    artifact,
                    reason: CleanupReason::Duplicate,
                    quality,
                });
            }
        }

        for artifact in all {
            if selected.contains(&artifact.id) {
                continue;
            }
            let report = self.scorer.score(&artifact);
            let eligible = match mode {
                CleanupMode::Conservative => report.action == QualityAction::Delete,
                CleanupMode::Aggressive => report.action != QualityAction::Keep,
            };
            if !eligible {
                continue;
            }
            let reason = if report.issues.contains(&QualityIssue::TooShort) {
                CleanupReason::TooShort
            } else if report.issues.contains(&QualityIssue::LowRelevance) {
                CleanupReason::LowRelevance
            } else {
                CleanupReason::LowQualityScore
            };
            candidates.push(CleanupCandidate {
                artifact,
                reason,
                quality: report.quality,
            });
        }

        candidates.truncate(self.config.max_candidates);
        Ok(candidates)
    }

    /// Select candidates and, when `execute` is set, delete each of them once
    pub async fn cleanup(&self, mode: CleanupMode, execute: bool) -> Result<CleanupReport> {
        let candidates = self.candidates(mode).await?;
        let mut report = CleanupReport {
            mode,
            dry_run: !execute,
            candidates,
            deleted: Vec::new(),
            delete_failures: Vec::new(),
        };

        if !execute {
            tracing::info!(
                mode = ?mode,
                candidates = report.candidates.len(),
                "Cleanup dry run"
            );
            return Ok(report);
        }

        for candidate in &report.candidates {
            let id = candidate.artifact.id;
            match self.store.delete(&id).await {
                Ok(()) => {
                    tracing::info!(artifact_id = %id, reason = %candidate.reason, "Cleaned up artifact");
                    report.deleted.push(id);
                }
                Err(e) => {
                    tracing::warn!(artifact_id = %id, error = %e, "Cleanup delete failed");
                    report.delete_failures.push(DeleteFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
