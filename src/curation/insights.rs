//! Read-only views over the store: statistics, knowledge map and backup snapshot

use crate::commands::SessionStats;
use crate::error::Result;
use crate::memory::{Artifact, ArtifactQuery, ArtifactType, QueryOrder, Store};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics over the live artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    /// Mean over artifacts that carry a relevance score
    pub average_relevance: Option<f64>,
    pub scored: usize,
    pub unscored: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl CollectionStats {
    pub fn from_artifacts(artifacts: &[Artifact]) -> Self {
        let mut by_type = BTreeMap::new();
        let mut sum = 0.0;
        let mut scored = 0;
        for artifact in artifacts {
            *by_type
                .entry(artifact.artifact_type.to_string())
                .or_insert(0) += 1;
            if let Some(score) = artifact.relevance_score {
                sum += score;
                scored += 1;
            }
        }

        Self {
            total: artifacts.len(),
            by_type,
            average_relevance: (scored > 0).then(|| sum / scored as f64),
            scored,
            unscored: artifacts.len() - scored,
            oldest: artifacts.iter().map(|a| a.created_at).min(),
            newest: artifacts.iter().map(|a| a.created_at).max(),
        }
    }

    pub async fn collect(store: &dyn Store) -> Result<Self> {
        let artifacts = store.query(&ArtifactQuery::all()).await?;
        Ok(Self::from_artifacts(&artifacts))
    }
}

/// Node kinds in the knowledge map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Project,
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub artifact_count: usize,
}

/// Project → type edge weighted by artifact count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub weight: usize,
}

/// Structured knowledge map. Rendering is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Project label for artifacts without a project
pub const UNASSIGNED_PROJECT: &str = "unassigned";

impl KnowledgeGraph {
    pub fn from_artifacts(artifacts: &[Artifact]) -> Self {
        let mut projects: BTreeMap<String, usize> = BTreeMap::new();
        let mut types: BTreeMap<ArtifactType, usize> = BTreeMap::new();
        let mut pairs: BTreeMap<(String, ArtifactType), usize> = BTreeMap::new();

        for artifact in artifacts {
            let project = artifact
                .context
                .project
                .clone()
                .unwrap_or_else(|| UNASSIGNED_PROJECT.to_string());
            *projects.entry(project.clone()).or_insert(0) += 1;
            *types.entry(artifact.artifact_type).or_insert(0) += 1;
            *pairs.entry((project, artifact.artifact_type)).or_insert(0) += 1;
        }

        let nodes = projects
            .into_iter()
            .map(|(id, artifact_count)| GraphNode {
                id: format!("project:{}", id),
                kind: NodeKind::Project,
                artifact_count,
            })
            .chain(types.into_iter().map(|(t, artifact_count)| GraphNode {
                id: format!("type:{}", t),
                kind: NodeKind::Type,
                artifact_count,
            }))
            .collect();

        let edges = pairs
            .into_iter()
            .map(|((project, t), weight)| GraphEdge {
                from: format!("project:{}", project),
                to: format!("type:{}", t),
                weight,
            })
            .collect();

        Self { nodes, edges }
    }

    pub async fn build(store: &dyn Store) -> Result<Self> {
        let artifacts = store.query(&ArtifactQuery::all()).await?;
        Ok(Self::from_artifacts(&artifacts))
    }
}

/// In-memory backup of the store and the session counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub created_at: DateTime<Utc>,
    pub artifact_count: usize,
    /// Oldest first
    pub artifacts: Vec<Artifact>,
    pub session: SessionStats,
}

impl BackupSnapshot {
    pub async fn capture(store: &dyn Store, session: &SessionStats) -> Result<Self> {
        let artifacts = store
            .query(&ArtifactQuery::all().order_by(QueryOrder::CreatedAsc))
            .await?;
        tracing::info!(artifacts = artifacts.len(), "Captured backup snapshot");
        Ok(Self {
            created_at: Utc::now(),
            artifact_count: artifacts.len(),
            artifacts,
            session: session.clone(),
        })
    }
}
