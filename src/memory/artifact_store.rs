//! In-memory artifact store
//!
//! Implements [`Store`] over a `HashMap` guarded by `tokio::sync::RwLock`.
//! A per-type index narrows typed queries; archived artifacts are kept in a
//! separate area and never returned by `query()`.

use super::artifact::{clamp_relevance, Artifact, ArtifactType};
use super::store::{ArtifactQuery, Store};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    artifacts: HashMap<Uuid, Artifact>,
    archived: HashMap<Uuid, Artifact>,
    by_type: HashMap<ArtifactType, HashSet<Uuid>>,
}

impl Inner {
    fn index(&mut self, artifact: &Artifact) {
        self.by_type
            .entry(artifact.artifact_type)
            .or_default()
            .insert(artifact.id);
    }

    fn unindex(&mut self, artifact: &Artifact) {
        if let Some(ids) = self.by_type.get_mut(&artifact.artifact_type) {
            ids.remove(&artifact.id);
        }
    }
}

/// In-memory store for artifacts
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Create a store pre-populated with artifacts
    pub async fn with_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            for mut artifact in artifacts {
                artifact.relevance_score = artifact.relevance_score.map(clamp_relevance);
                inner.index(&artifact);
                inner.artifacts.insert(artifact.id, artifact);
            }
        }
        store
    }

    /// Load a JSON array of artifacts from disk
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let artifacts: Vec<Artifact> = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            count = artifacts.len(),
            "Seeded artifact store"
        );
        Ok(Self::with_artifacts(artifacts).await)
    }

    /// Number of live (non-archived) artifacts
    pub async fn len(&self) -> usize {
        self.inner.read().await.artifacts.len()
    }

    /// Check if the store holds no live artifacts
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.artifacts.is_empty()
    }

    /// Retrieve a live artifact by ID
    pub async fn get(&self, id: &Uuid) -> Option<Artifact> {
        self.inner.read().await.artifacts.get(id).cloned()
    }

    /// Number of archived artifacts
    pub async fn archived_len(&self) -> usize {
        self.inner.read().await.archived.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, query: &ArtifactQuery) -> Result<Vec<Artifact>> {
        let inner = self.inner.read().await;
        let rows: Vec<Artifact> = match query.artifact_type {
            Some(at) => inner
                .by_type
                .get(&at)
                .into_iter()
                .flatten()
                .filter_map(|id| inner.artifacts.get(id))
                .filter(|a| query.accepts(a))
                .cloned()
                .collect(),
            None => inner
                .artifacts
                .values()
                .filter(|a| query.accepts(a))
                .cloned()
                .collect(),
        };
        Ok(query.arrange(rows))
    }

    async fn insert(&self, mut artifact: Artifact) -> Result<Uuid> {
        artifact.relevance_score = artifact.relevance_score.map(clamp_relevance);
        let id = artifact.id;
        let mut inner = self.inner.write().await;
        if let Some(previous) = inner.artifacts.remove(&id) {
            inner.unindex(&previous);
        }
        inner.index(&artifact);
        inner.artifacts.insert(id, artifact);
        Ok(id)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.artifacts.remove(id) {
            Some(artifact) => {
                inner.unindex(&artifact);
                Ok(())
            }
            None => Err(Error::Store(format!("artifact {} not found", id))),
        }
    }

    async fn archive(&self, id: &Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let artifact = inner
            .artifacts
            .remove(id)
            .ok_or_else(|| Error::Store(format!("artifact {} not found", id)))?;
        inner.unindex(&artifact);
        inner.archived.insert(*id, artifact);
        Ok(())
    }

    async fn update_relevance(&self, id: &Uuid, score: f64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let artifact = inner
            .artifacts
            .get_mut(id)
            .ok_or_else(|| Error::Store(format!("artifact {} not found", id)))?;
        artifact.relevance_score = Some(clamp_relevance(score));
        Ok(())
    }

    async fn rebuild_indexes(&self) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut by_type: HashMap<ArtifactType, HashSet<Uuid>> = HashMap::new();
        for artifact in inner.artifacts.values() {
            by_type
                .entry(artifact.artifact_type)
                .or_default()
                .insert(artifact.id);
        }
        inner.by_type = by_type;
        Ok(inner.artifacts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::artifact::ArtifactBuilder;
    use crate::memory::store::{MatchFields, QueryOrder};
    use std::io::Write;

    fn build_test_artifact(artifact_type: ArtifactType, content: &str, score: f64) -> Artifact {
        ArtifactBuilder::new(artifact_type)
            .content(content)
            .relevance(score)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let artifact = build_test_artifact(ArtifactType::Learning, "the borrow checker", 6.0);
        let id = artifact.id;

        assert_eq!(store.insert(artifact).await.unwrap(), id);

        let retrieved = store.get(&id).await.unwrap();
        assert_eq!(retrieved.content, "the borrow checker");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_query_by_type_uses_index() {
        let store = MemoryStore::with_artifacts(vec![
            build_test_artifact(ArtifactType::Code, "fn a()", 5.0),
            build_test_artifact(ArtifactType::Code, "fn b()", 7.0),
            build_test_artifact(ArtifactType::Documentation, "readme", 5.0),
        ])
        .await;

        let code = store
            .query(&ArtifactQuery::all().of_type(Some(ArtifactType::Code)))
            .await
            .unwrap();
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].content, "fn b()");

        let configs = store
            .query(&ArtifactQuery::all().of_type(Some(ArtifactType::Configuration)))
            .await
            .unwrap();
        assert!(configs.is_empty());
    }

    #[tokio::test]
    async fn test_query_text_and_limit() {
        let store = MemoryStore::with_artifacts(vec![
            build_test_artifact(ArtifactType::Learning, "tokio spawn needs Send", 8.0),
            build_test_artifact(ArtifactType::Learning, "Tokio select! macro", 6.0),
            build_test_artifact(ArtifactType::Learning, "serde rename_all", 9.0),
        ])
        .await;

        let query = ArtifactQuery::all()
            .matching("tokio", MatchFields::Content)
            .order_by(QueryOrder::RelevanceDesc)
            .limit(1);
        let rows = store.query(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "tokio spawn needs Send");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let artifact = build_test_artifact(ArtifactType::Code, "to-delete", 1.0);
        let id = artifact.id;
        store.insert(artifact).await.unwrap();

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.is_none());
        assert!(store
            .query(&ArtifactQuery::all().of_type(Some(ArtifactType::Code)))
            .await
            .unwrap()
            .is_empty());

        // Deleting twice is a store error
        assert!(matches!(store.delete(&id).await, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_archive_hides_from_queries() {
        let store = MemoryStore::new();
        let artifact = build_test_artifact(ArtifactType::Code, "archived", 1.0);
        let id = artifact.id;
        store.insert(artifact).await.unwrap();

        store.archive(&id).await.unwrap();
        assert!(store.query(&ArtifactQuery::all()).await.unwrap().is_empty());
        assert_eq!(store.archived_len().await, 1);
        assert!(store.archive(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_relevance_clamps() {
        let store = MemoryStore::new();
        let artifact = build_test_artifact(ArtifactType::Code, "score me", 1.0);
        let id = artifact.id;
        store.insert(artifact).await.unwrap();

        store.update_relevance(&id, 12.0).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().relevance_score, Some(10.0));

        assert!(store.update_relevance(&Uuid::new_v4(), 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_indexes() {
        let store = MemoryStore::with_artifacts(vec![
            build_test_artifact(ArtifactType::Code, "a", 1.0),
            build_test_artifact(ArtifactType::Learning, "b", 1.0),
        ])
        .await;

        assert_eq!(store.rebuild_indexes().await.unwrap(), 2);
        let learning = store
            .query(&ArtifactQuery::all().of_type(Some(ArtifactType::Learning)))
            .await
            .unwrap();
        assert_eq!(learning.len(), 1);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let artifacts = vec![
            build_test_artifact(ArtifactType::Code, "fn seeded()", 7.0),
            build_test_artifact(ArtifactType::Documentation, "seeded docs", 4.0),
        ];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&artifacts).unwrap()).unwrap();

        let store = MemoryStore::from_json_file(file.path()).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.get(&artifacts[0].id).await.is_some());
    }

    #[tokio::test]
    async fn test_seed_file_clamps_relevance() {
        let mut high = build_test_artifact(ArtifactType::Code, "fn inflated()", 5.0);
        high.relevance_score = None;
        let mut rows = serde_json::to_value(vec![high.clone()]).unwrap();
        rows[0]["relevance_score"] = serde_json::json!(42.0);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", rows).unwrap();

        let store = MemoryStore::from_json_file(file.path()).await.unwrap();
        let stored = store.get(&high.id).await.unwrap();
        assert_eq!(stored.relevance_score, Some(10.0));
    }

    #[tokio::test]
    async fn test_insert_and_seed_clamp_out_of_range_relevance() {
        let mut low = build_test_artifact(ArtifactType::Learning, "negative", 5.0);
        low.relevance_score = Some(-3.0);
        let mut high = build_test_artifact(ArtifactType::Learning, "inflated", 5.0);
        high.relevance_score = Some(42.0);

        let store = MemoryStore::with_artifacts(vec![low.clone()]).await;
        store.insert(high.clone()).await.unwrap();

        assert_eq!(store.get(&low.id).await.unwrap().relevance_score, Some(0.0));
        assert_eq!(store.get(&high.id).await.unwrap().relevance_score, Some(10.0));
    }
}
