//! Optimization pipeline
//!
//! Steps run strictly in order: remove duplicates, archive low-quality
//! entries, recalculate relevance, rebuild indexes, clear the search cache.
//! The pipeline is not atomic. A failing step stops the run and everything
//! done by earlier steps stays in place.

use super::duplicates::redundant_artifacts;
use super::scorer::{QualityAction, QualityScorer};
use crate::error::Result;
use crate::memory::{Analyzer, ArtifactQuery, Store};
use crate::search::SearchCoordinator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStep {
    RemoveDuplicates,
    ArchiveLowQuality,
    RecalculateScores,
    RebuildIndexes,
    ClearCache,
}

impl OptimizationStep {
    /// Execution order
    pub const PIPELINE: [OptimizationStep; 5] = [
        Self::RemoveDuplicates,
        Self::ArchiveLowQuality,
        Self::RecalculateScores,
        Self::RebuildIndexes,
        Self::ClearCache,
    ];
}

impl std::fmt::Display for OptimizationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RemoveDuplicates => "remove_duplicates",
            Self::ArchiveLowQuality => "archive_low_quality",
            Self::RecalculateScores => "recalculate_scores",
            Self::RebuildIndexes => "rebuild_indexes",
            Self::ClearCache => "clear_cache",
        };
        write!(f, "{}", name)
    }
}

/// A completed step and the number of items it touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: OptimizationStep,
    pub count: usize,
}

/// The step that halted the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: OptimizationStep,
    pub error: String,
}

/// Outcome of an optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Steps that finished, in order
    pub steps: Vec<StepReport>,
    pub failed: Option<StepFailure>,
    /// True when every step finished
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OptimizationReport {
    /// Count reported by a finished step
    pub fn count(&self, step: OptimizationStep) -> Option<usize> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.count)
    }
}

/// Runs the optimization pipeline against a store
pub struct Optimizer {
    store: Arc<dyn Store>,
    analyzer: Arc<dyn Analyzer>,
    scorer: QualityScorer,
}

impl Optimizer {
    pub fn new(store: Arc<dyn Store>, analyzer: Arc<dyn Analyzer>, scorer: QualityScorer) -> Self {
        Self {
            store,
            analyzer,
            scorer,
        }
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self, search: &mut SearchCoordinator) -> OptimizationReport {
        let started_at = Utc::now();
        let mut steps = Vec::new();
        let mut failed = None;

        for step in OptimizationStep::PIPELINE {
            let result = match step {
                OptimizationStep::RemoveDuplicates => self.remove_duplicates().await,
                OptimizationStep::ArchiveLowQuality => self.archive_low_quality().await,
                OptimizationStep::RecalculateScores => self.recalculate_scores().await,
                OptimizationStep::RebuildIndexes => self.store.rebuild_indexes().await,
                OptimizationStep::ClearCache => Ok(search.clear_cache()),
            };

            match result {
                Ok(count) => {
                    tracing::info!(step = %step, count, "Optimization step finished");
                    steps.push(StepReport { step, count });
                }
                Err(e) => {
                    tracing::error!(step = %step, error = %e, "Optimization step failed");
                    failed = Some(StepFailure {
                        step,
                        error: e.to_string(),
                    });
                    break;
                }
            }
        }

        OptimizationReport {
            completed: failed.is_none(),
            steps,
            failed,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn remove_duplicates(&self) -> Result<usize> {
        let all = self.store.query(&ArtifactQuery::all()).await?;
        let redundant = redundant_artifacts(&all);
        for artifact in &redundant {
            self.store.delete(&artifact.id).await?;
        }
        Ok(redundant.len())
    }

    async fn archive_low_quality(&self) -> Result<usize> {
        let all = self.store.query(&ArtifactQuery::all()).await?;
        let mut archived = 0;
        for artifact in all {
            if self.scorer.score(&artifact).action == QualityAction::Delete {
                self.store.archive(&artifact.id).await?;
                archived += 1;
            }
        }
        Ok(archived)
    }

    /// Re-score every artifact with the analyzer. Analyzer failures leave the
    /// old score in place; store failures abort the step.
    async fn recalculate_scores(&self) -> Result<usize> {
        let all = self.store.query(&ArtifactQuery::all()).await?;
        let mut updated = 0;
        for artifact in all {
            match self.analyzer.analyze_content(&artifact.content).await {
                Ok(analysis) => {
                    self.store
                        .update_relevance(&artifact.id, analysis.relevance_score)
                        .await?;
                    updated += 1;
                }
                Err(e) => {
                    tracing::warn!(artifact_id = %artifact.id, error = %e, "Re-scoring skipped");
                }
            }
        }
        Ok(updated)
    }
}
