//! Artifact quality scoring
//!
//! A pure, total heuristic: start from the artifact's relevance (or the
//! neutral midpoint), subtract fixed penalties for short content and low
//! relevance, floor at zero, and map the result onto the KEEP / REVIEW /
//! DELETE bands from [`ScoringConfig`].

use crate::config::ScoringConfig;
use crate::memory::Artifact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A problem detected while scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    TooShort,
    LowRelevance,
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort => write!(f, "too_short"),
            Self::LowRelevance => write!(f, "low_relevance"),
        }
    }
}

/// Overall quality status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Good,
    Poor,
}

/// Recommended curation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityAction {
    Keep,
    Review,
    Delete,
}

/// Scoring result for one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub quality: f64,
    pub issues: BTreeSet<QualityIssue>,
    pub status: QualityStatus,
    pub action: QualityAction,
}

/// Deterministic quality scorer
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score an artifact. Never fails and performs no I/O.
    pub fn score(&self, artifact: &Artifact) -> QualityReport {
        let relevance = artifact
            .relevance_score
            .filter(|s| !s.is_nan())
            .unwrap_or(self.config.neutral_relevance);
        let mut quality = relevance;
        let mut issues = BTreeSet::new();

        if artifact.content_len() < self.config.min_content_length {
            quality -= self.config.short_content_penalty;
            issues.insert(QualityIssue::TooShort);
        }

        if relevance < self.config.low_relevance_threshold {
            quality -= self.config.low_relevance_penalty;
            issues.insert(QualityIssue::LowRelevance);
        }

        let quality = quality.max(0.0);
        let status = if issues.is_empty() {
            QualityStatus::Good
        } else {
            QualityStatus::Poor
        };

        QualityReport {
            quality,
            issues,
            status,
            action: self.action_for(quality),
        }
    }

    /// Map a quality value onto the configured action bands
    pub fn action_for(&self, quality: f64) -> QualityAction {
        if quality < self.config.delete_below {
            QualityAction::Delete
        } else if quality < self.config.keep_at_or_above {
            QualityAction::Review
        } else {
            QualityAction::Keep
        }
    }
}
