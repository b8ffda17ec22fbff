//! Test doubles shared by unit tests

use crate::error::{Error, Result};
use crate::memory::{
    Analysis, Analyzer, Artifact, ArtifactQuery, ArtifactType, MatchFields, MemoryStore, Store,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Analyzer returning scripted scores keyed by exact message text.
/// Unscripted text scores 5.0 as `Unknown`.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    scores: HashMap<String, (f64, ArtifactType)>,
    failures: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(self, text: &str, score: f64) -> Self {
        self.typed(text, score, ArtifactType::ConversationExtract)
    }

    pub fn typed(mut self, text: &str, score: f64, artifact_type: ArtifactType) -> Self {
        self.scores.insert(text.to_string(), (score, artifact_type));
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze_content(&self, text: &str) -> Result<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(text) {
            return Err(Error::Analyzer(format!("scripted failure for '{}'", text)));
        }
        let (relevance_score, artifact_type) = self
            .scores
            .get(text)
            .copied()
            .unwrap_or((5.0, ArtifactType::Unknown));
        Ok(Analysis {
            relevance_score,
            artifact_type,
            context: serde_json::Map::new(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Which store operations should fail
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePlan {
    /// Fail every query
    pub any_query: bool,
    /// Fail queries that match on any field (the semantic strategy)
    pub semantic_query: bool,
    /// Fail queries that match on content only (the basic strategy)
    pub basic_query: bool,
    pub delete: bool,
    pub archive: bool,
    pub update: bool,
    pub rebuild: bool,
}

/// Store wrapper recording every call and injecting failures.
pub struct RecordingStore {
    inner: MemoryStore,
    plan: Mutex<FailurePlan>,
    queries: Mutex<Vec<ArtifactQuery>>,
    deletes: Mutex<Vec<Uuid>>,
    archives: Mutex<Vec<Uuid>>,
}

impl RecordingStore {
    pub async fn with_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        Self {
            inner: MemoryStore::with_artifacts(artifacts).await,
            plan: Mutex::new(FailurePlan::default()),
            queries: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            archives: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failures(&self, plan: FailurePlan) {
        *self.plan.lock().unwrap() = plan;
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<ArtifactQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<Uuid> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn archives(&self) -> Vec<Uuid> {
        self.archives.lock().unwrap().clone()
    }

    pub fn reset_counts(&self) {
        self.queries.lock().unwrap().clear();
        self.deletes.lock().unwrap().clear();
        self.archives.lock().unwrap().clear();
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    fn plan(&self) -> FailurePlan {
        *self.plan.lock().unwrap()
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn query(&self, query: &ArtifactQuery) -> Result<Vec<Artifact>> {
        self.queries.lock().unwrap().push(query.clone());
        let plan = self.plan();
        if plan.any_query {
            return Err(Error::Store("query failed".to_string()));
        }
        match query.text.as_ref().map(|t| t.fields) {
            Some(MatchFields::Any) if plan.semantic_query => {
                return Err(Error::Store("semantic query failed".to_string()))
            }
            Some(MatchFields::Content) if plan.basic_query => {
                return Err(Error::Store("basic query failed".to_string()))
            }
            _ => {}
        }
        self.inner.query(query).await
    }

    async fn insert(&self, artifact: Artifact) -> Result<Uuid> {
        self.inner.insert(artifact).await
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.deletes.lock().unwrap().push(*id);
        if self.plan().delete {
            return Err(Error::Store("delete failed".to_string()));
        }
        self.inner.delete(id).await
    }

    async fn archive(&self, id: &Uuid) -> Result<()> {
        self.archives.lock().unwrap().push(*id);
        if self.plan().archive {
            return Err(Error::Store("archive failed".to_string()));
        }
        self.inner.archive(id).await
    }

    async fn update_relevance(&self, id: &Uuid, score: f64) -> Result<()> {
        if self.plan().update {
            return Err(Error::Store("update failed".to_string()));
        }
        self.inner.update_relevance(id, score).await
    }

    async fn rebuild_indexes(&self) -> Result<usize> {
        if self.plan().rebuild {
            return Err(Error::Store("rebuild failed".to_string()));
        }
        self.inner.rebuild_indexes().await
    }
}
