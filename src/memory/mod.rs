//! Memory system: artifacts, their storage and their extraction
//!
//! Artifacts are owned by the [`Store`]; the curation core only holds the
//! transient copies returned from queries.

pub mod analyzer;
pub mod artifact;
pub mod artifact_store;
pub mod conversation;
pub mod extractor;
pub mod store;

pub use analyzer::{Analysis, Analyzer, HeuristicAnalyzer};
pub use artifact::{Artifact, ArtifactBuilder, ArtifactContext, ArtifactType};
pub use artifact_store::MemoryStore;
pub use conversation::{ConversationMessage, ProjectContext};
pub use extractor::{ExtractionCoordinator, ExtractionReport};
pub use store::{ArtifactQuery, MatchFields, QueryOrder, Store, TextMatch};
