//! Extraction of artifacts from conversation history
//!
//! The extraction coordinator runs each message of a trailing window of the
//! conversation through the [`Analyzer`] and persists the ones that score at
//! or above the extraction threshold (or every analyzed message when forced).
//! A failure on one message is counted as a skip and never aborts the batch.

use super::analyzer::Analyzer;
use super::artifact::ArtifactBuilder;
use super::conversation::{ConversationMessage, ProjectContext};
use super::store::Store;
use crate::config::ExtractionConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one extraction batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Messages examined (size of the trailing window)
    pub examined: usize,
    /// IDs of the persisted artifacts, in message order
    pub extracted: Vec<Uuid>,
    /// Messages below threshold or failing analysis/persistence
    pub skipped: usize,
    /// Whether the threshold was bypassed
    pub forced: bool,
}

/// Feeds conversation messages through the Analyzer into the Store.
pub struct ExtractionCoordinator {
    analyzer: Arc<dyn Analyzer>,
    store: Arc<dyn Store>,
    config: ExtractionConfig,
}

impl ExtractionCoordinator {
    pub fn new(analyzer: Arc<dyn Analyzer>, store: Arc<dyn Store>, config: ExtractionConfig) -> Self {
        Self {
            analyzer,
            store,
            config,
        }
    }

    /// Extract artifacts from the last `window` messages (config default when `None`).
    pub async fn extract(
        &self,
        history: &[ConversationMessage],
        project: &ProjectContext,
        force: bool,
        window: Option<usize>,
    ) -> ExtractionReport {
        let window = window.unwrap_or(self.config.window);
        let start = history.len().saturating_sub(window);
        let mut report = ExtractionReport {
            forced: force,
            ..Default::default()
        };

        for (index, message) in history.iter().enumerate().skip(start) {
            report.examined += 1;

            let analysis = match self.analyzer.analyze_content(&message.content).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!(
                        analyzer = self.analyzer.name(),
                        message_index = index,
                        error = %e,
                        "Analysis failed, skipping message"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let score = analysis.relevance_score;
            if !force && (score.is_nan() || score < self.config.threshold) {
                tracing::debug!(
                    message_index = index,
                    score,
                    "Below extraction threshold"
                );
                report.skipped += 1;
                continue;
            }

            let mut builder = ArtifactBuilder::new(analysis.artifact_type)
                .content(&message.content)
                .relevance(analysis.relevance_score)
                .message_index(index)
                .role(&message.role);
            if let Some(ref name) = project.name {
                builder = builder.project(name);
            }
            for (key, value) in analysis.context {
                builder = builder.extra(key, value);
            }

            let artifact = match builder.build() {
                Ok(artifact) => artifact,
                Err(e) => {
                    tracing::warn!(message_index = index, error = %e, "Skipping message");
                    report.skipped += 1;
                    continue;
                }
            };

            match self.store.insert(artifact).await {
                Ok(id) => report.extracted.push(id),
                Err(e) => {
                    tracing::warn!(message_index = index, error = %e, "Failed to persist artifact");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            extracted = report.extracted.len(),
            skipped = report.skipped,
            forced = force,
            "Extraction complete"
        );
        report
    }
}
