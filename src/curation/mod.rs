//! Curation: quality scoring and the operations it drives
//!
//! The [`QualityScorer`] is pure; review, cleanup and optimization consult
//! it to decide what to keep, flag or remove.

pub mod cleanup;
pub mod duplicates;
pub mod insights;
pub mod optimize;
pub mod review;
pub mod scorer;

pub use cleanup::{CleanupCandidate, CleanupEngine, CleanupMode, CleanupReason, CleanupReport};
pub use duplicates::{find_duplicates, redundant_artifacts, DuplicateGroup};
pub use insights::{BackupSnapshot, CollectionStats, KnowledgeGraph};
pub use optimize::{OptimizationReport, OptimizationStep, Optimizer, StepFailure, StepReport};
pub use review::{DeleteFailure, ReviewEngine, ReviewEntry, ReviewPolicy, ReviewReport};
pub use scorer::{QualityAction, QualityIssue, QualityReport, QualityScorer, QualityStatus};
