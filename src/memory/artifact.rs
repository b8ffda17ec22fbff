//! Artifact data types
//!
//! An Artifact is a unit of extracted knowledge: a piece of content with a
//! category, a relevance score in the 0–10 domain and the context of the
//! conversation message it was extracted from.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lower bound of the relevance domain
pub const MIN_RELEVANCE: f64 = 0.0;
/// Upper bound of the relevance domain
pub const MAX_RELEVANCE: f64 = 10.0;

/// Clamp a relevance score into the 0–10 domain. NaN maps to the lower bound.
pub fn clamp_relevance(score: f64) -> f64 {
    if score.is_nan() {
        MIN_RELEVANCE
    } else {
        score.clamp(MIN_RELEVANCE, MAX_RELEVANCE)
    }
}

fn deserialize_relevance<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map(clamp_relevance))
}

/// A stored unit of extracted knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique artifact identifier
    pub id: Uuid,
    /// The extracted knowledge content
    pub content: String,
    /// Category of knowledge this artifact represents
    pub artifact_type: ArtifactType,
    /// Relevance score (0.0–10.0); absent for rows that were never analyzed
    #[serde(default, deserialize_with = "deserialize_relevance")]
    pub relevance_score: Option<f64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Where the artifact came from
    #[serde(default)]
    pub context: ArtifactContext,
}

impl Artifact {
    /// Content length in characters
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Relevance used for ordering; unscored artifacts sort as zero.
    pub fn sort_relevance(&self) -> f64 {
        self.relevance_score.unwrap_or(MIN_RELEVANCE)
    }

    /// Content normalized for duplicate comparison
    pub fn normalized_content(&self) -> String {
        self.content
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// The category of knowledge an artifact represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Code,
    Documentation,
    Configuration,
    Learning,
    ConversationExtract,
    #[serde(other)]
    Unknown,
}

impl ArtifactType {
    /// All artifact types, in display order
    pub const ALL: [ArtifactType; 6] = [
        Self::Code,
        Self::Documentation,
        Self::Configuration,
        Self::Learning,
        Self::ConversationExtract,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Documentation => "documentation",
            Self::Configuration => "configuration",
            Self::Learning => "learning",
            Self::ConversationExtract => "conversation_extract",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "documentation" | "docs" => Ok(Self::Documentation),
            "configuration" | "config" => Ok(Self::Configuration),
            "learning" => Ok(Self::Learning),
            "conversation_extract" | "conversation" => Ok(Self::ConversationExtract),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::Parse(format!("unknown artifact type: {}", other))),
        }
    }
}

/// Free-form metadata describing where an artifact came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactContext {
    /// Index of the originating message in the conversation history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_index: Option<usize>,
    /// Role of the originating message author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Project the conversation belonged to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Analyzer-supplied or caller-supplied extra fields
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ArtifactContext {
    /// Serialized form used for pattern matching
    pub fn search_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Builder for constructing `Artifact` instances
pub struct ArtifactBuilder {
    artifact_type: ArtifactType,
    content: Option<String>,
    relevance_score: Option<f64>,
    created_at: Option<DateTime<Utc>>,
    context: ArtifactContext,
}

impl ArtifactBuilder {
    /// Create a new builder with the required artifact type
    pub fn new(artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type,
            content: None,
            relevance_score: None,
            created_at: None,
            context: ArtifactContext::default(),
        }
    }

    /// Set the extracted knowledge content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the relevance score (clamped to 0.0–10.0)
    pub fn relevance(mut self, score: f64) -> Self {
        self.relevance_score = Some(clamp_relevance(score));
        self
    }

    /// Override the creation timestamp
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Set the originating message index
    pub fn message_index(mut self, index: usize) -> Self {
        self.context.message_index = Some(index);
        self
    }

    /// Set the originating message role
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.context.role = Some(role.into());
        self
    }

    /// Set the project name
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.context.project = Some(project.into());
        self
    }

    /// Add an extra context entry
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.extra.insert(key.into(), value);
        self
    }

    /// Build the artifact, returning an error if content is missing or blank
    pub fn build(self) -> Result<Artifact> {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Artifact("artifact content is required".to_string()))?;

        Ok(Artifact {
            id: Uuid::new_v4(),
            content,
            artifact_type: self.artifact_type,
            relevance_score: self.relevance_score,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            context: self.context,
        })
    }
}
