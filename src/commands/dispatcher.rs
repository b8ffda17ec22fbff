//! Command dispatcher
//!
//! Owns the registry, the search coordinator (and with it the result cache)
//! and the session counters. Every method that runs a command takes
//! `&mut self`, so commands of one session execute one at a time.

use super::events::{CommandEvent, COMMAND_EXECUTED};
use super::handlers::{builtin_commands, CommandContext, CommandOutcome, CommandRequest};
use super::parser::parse_input;
use super::registry::{CommandRegistration, CommandRegistry};
use super::session::SessionStats;
use crate::config::CuratorConfig;
use crate::curation::QualityScorer;
use crate::error::Result;
use crate::memory::{Analyzer, ConversationMessage, ProjectContext, Store};
use crate::search::SearchCoordinator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Full result of one handled command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecution {
    /// Canonical command id
    pub command: String,
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CommandOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandExecution {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Routes prefixed input to registered command handlers
pub struct CommandDispatcher {
    config: CuratorConfig,
    store: Arc<dyn Store>,
    analyzer: Arc<dyn Analyzer>,
    scorer: QualityScorer,
    registry: CommandRegistry,
    search: SearchCoordinator,
    stats: SessionStats,
    events: broadcast::Sender<CommandEvent>,
}

impl CommandDispatcher {
    /// Create a dispatcher with the built-in command table
    pub fn new(
        config: CuratorConfig,
        store: Arc<dyn Store>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<Self> {
        let mut dispatcher = Self::empty(config, store, analyzer);
        for registration in builtin_commands() {
            dispatcher.register(registration)?;
        }
        Ok(dispatcher)
    }

    /// Create a dispatcher with no commands registered
    pub fn empty(config: CuratorConfig, store: Arc<dyn Store>, analyzer: Arc<dyn Analyzer>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            search: SearchCoordinator::new(store.clone(), config.search.cache_ttl_ms),
            scorer: QualityScorer::new(config.scoring.clone()),
            registry: CommandRegistry::new(),
            stats: SessionStats::new(),
            config,
            store,
            analyzer,
            events,
        }
    }

    /// Register an additional command
    pub fn register(&mut self, registration: CommandRegistration) -> Result<()> {
        self.registry.register(registration)
    }

    /// Receive a [`CommandEvent`] for every handled command
    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn search_coordinator(&self) -> &SearchCoordinator {
        &self.search
    }

    /// Run `input` if it is a registered command.
    ///
    /// Returns `None` for input without the command prefix and for unknown
    /// commands; neither publishes an event nor touches the store. Handled
    /// commands publish their event whether or not anyone is subscribed.
    pub async fn dispatch(
        &mut self,
        input: &str,
        history: &[ConversationMessage],
        project: &ProjectContext,
    ) -> Option<CommandExecution> {
        let parsed = parse_input(self.config.commands.prefix, input)?;
        let Some(registration) = self.registry.resolve(&parsed.name) else {
            tracing::debug!(command = %parsed.name, "Unknown command, passing through");
            return None;
        };
        let command = registration.id.clone();
        let handler = registration.handler.clone();

        tracing::debug!(command = %command, args = ?parsed.raw_args, "Executing command");

        let mut ctx = CommandContext {
            store: self.store.clone(),
            analyzer: self.analyzer.clone(),
            search: &mut self.search,
            stats: &mut self.stats,
            scorer: &self.scorer,
            config: &self.config,
            registry: &self.registry,
        };
        let req = CommandRequest {
            command: &parsed,
            history,
            project,
        };
        let result = handler.handle(&mut ctx, &req).await;

        let execution = match result {
            Ok(outcome) => CommandExecution {
                command,
                args: parsed.raw_args,
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => {
                tracing::error!(command = %command, error = %e, "Command failed");
                CommandExecution {
                    command,
                    args: parsed.raw_args,
                    outcome: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let event = CommandEvent {
            command: execution.command.clone(),
            args: execution.args.clone(),
            success: execution.success(),
            error: execution.error.clone(),
        };
        let _ = self.events.send(event);
        tracing::info!(
            event = COMMAND_EXECUTED,
            command = %execution.command,
            success = execution.success(),
            "Command executed"
        );

        Some(execution)
    }

    /// Run `input` if it is a registered command; `true` when it was handled,
    /// whether or not the handler succeeded.
    pub async fn process(
        &mut self,
        input: &str,
        history: &[ConversationMessage],
        project: &ProjectContext,
    ) -> bool {
        self.dispatch(input, history, project).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::{CommandHandler, DeletedArtifact};
    use crate::error::Error;
    use crate::memory::{Artifact, ArtifactBuilder, ArtifactType};
    use crate::testing::{FailurePlan, RecordingStore, ScriptedAnalyzer};
    use async_trait::async_trait;
    use tokio::sync::broadcast::error::TryRecvError;

    fn artifact(content: &str, score: f64) -> Artifact {
        ArtifactBuilder::new(ArtifactType::Learning)
            .content(content)
            .relevance(score)
            .build()
            .unwrap()
    }

    async fn fixture() -> (CommandDispatcher, Arc<RecordingStore>) {
        fixture_with(ScriptedAnalyzer::new()).await
    }

    async fn fixture_with(analyzer: ScriptedAnalyzer) -> (CommandDispatcher, Arc<RecordingStore>) {
        let store = Arc::new(
            RecordingStore::with_artifacts(vec![
                artifact("tokio tasks must be Send to be spawned", 9.0),
                artifact("Tokio tasks must be  Send to be spawned", 7.0),
                artifact("a tokio note nobody reads", 1.0),
                artifact("serde derives Deserialize for structs", 8.0),
            ])
            .await,
        );
        let dispatcher = CommandDispatcher::new(
            CuratorConfig::default(),
            store.clone(),
            Arc::new(analyzer),
        )
        .unwrap();
        (dispatcher, store)
    }

    fn no_history() -> (Vec<ConversationMessage>, ProjectContext) {
        (Vec::new(), ProjectContext::default())
    }

    #[tokio::test]
    async fn test_non_prefixed_input_is_ignored() {
        let (mut dispatcher, store) = fixture().await;
        let mut events = dispatcher.subscribe();
        let (history, project) = no_history();

        assert!(!dispatcher.process("search tokio", &history, &project).await);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(store.query_count(), 0);
        assert_eq!(dispatcher.stats().searches_performed, 0);
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_handled() {
        let (mut dispatcher, store) = fixture().await;
        let mut events = dispatcher.subscribe();
        let (history, project) = no_history();

        assert!(!dispatcher.process("/frobnicate now", &history, &project).await);
        assert!(!dispatcher.process("/", &history, &project).await);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_aliases_produce_identical_events() {
        let (mut dispatcher, _) = fixture().await;
        let mut events = dispatcher.subscribe();
        let (history, project) = no_history();

        for line in ["/search tokio", "/s tokio", "/FIND tokio"] {
            assert!(dispatcher.process(line, &history, &project).await);
        }

        let received: Vec<CommandEvent> = (0..3).map(|_| events.try_recv().unwrap()).collect();
        assert!(received.iter().all(|e| e == &received[0]));
        assert_eq!(received[0].command, "search");
        assert_eq!(received[0].args, vec!["tokio"]);
        assert!(received[0].success);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_repeated_search_uses_cache() {
        let (mut dispatcher, store) = fixture().await;
        let (history, project) = no_history();

        let first = dispatcher.dispatch("/search tokio", &history, &project).await.unwrap();
        let second = dispatcher.dispatch("/s TOKIO", &history, &project).await.unwrap();

        assert_eq!(store.query_count(), 1);
        match (first.outcome, second.outcome) {
            (Some(CommandOutcome::Search(a)), Some(CommandOutcome::Search(b))) => {
                assert!(!a.cached);
                assert!(b.cached);
                assert_eq!(a.artifacts, b.artifacts);
            }
            other => panic!("unexpected outcomes: {:?}", other),
        }
        assert_eq!(dispatcher.stats().searches_performed, 2);
    }

    #[tokio::test]
    async fn test_handler_error_is_reported_as_failed_event() {
        let (mut dispatcher, store) = fixture().await;
        let mut events = dispatcher.subscribe();
        let (history, project) = no_history();

        assert!(dispatcher.process("/search tokio --limit=abc", &history, &project).await);
        let event = events.try_recv().unwrap();
        assert_eq!(event.command, "search");
        assert!(!event.success);
        assert!(event.error.unwrap().contains("limit"));
        assert_eq!(store.query_count(), 0);
        assert_eq!(dispatcher.stats().searches_performed, 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_reported() {
        let (mut dispatcher, store) = fixture().await;
        store.set_failures(FailurePlan {
            semantic_query: true,
            basic_query: true,
            ..Default::default()
        });
        let (history, project) = no_history();

        let execution = dispatcher.dispatch("/search tokio", &history, &project).await.unwrap();
        assert!(!execution.success());
        assert!(dispatcher.search_coordinator().cache().is_empty());
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_optimize_clears_cache_and_updates_stats() {
        let (mut dispatcher, store) = fixture().await;
        let (history, project) = no_history();

        dispatcher.process("/search tokio", &history, &project).await;
        assert_eq!(dispatcher.search_coordinator().cache().len(), 1);

        let execution = dispatcher.dispatch("/opt", &history, &project).await.unwrap();
        assert!(execution.success());
        assert!(dispatcher.search_coordinator().cache().is_empty());
        assert_eq!(dispatcher.stats().optimizations_run, 1);
        assert!(dispatcher.stats().last_optimization.is_some());

        store.reset_counts();
        dispatcher.process("/search tokio", &history, &project).await;
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_optimization_leaves_stats_untouched() {
        let (mut dispatcher, store) = fixture().await;
        store.set_failures(FailurePlan {
            rebuild: true,
            ..Default::default()
        });
        let (history, project) = no_history();

        dispatcher.process("/search tokio", &history, &project).await;
        let mut events = dispatcher.subscribe();
        let execution = dispatcher.dispatch("/optimize", &history, &project).await.unwrap();

        assert!(!execution.success());
        assert!(execution.outcome.is_none());
        let error = execution.error.as_deref().unwrap();
        assert!(error.contains("rebuild_indexes"));
        assert!(error.contains("remove_duplicates, archive_low_quality, recalculate_scores"));

        let event = events.try_recv().unwrap();
        assert_eq!(event.command, "optimize");
        assert!(!event.success);
        assert_eq!(event.error, execution.error);

        assert_eq!(dispatcher.stats().optimizations_run, 0);
        assert!(dispatcher.stats().last_optimization.is_none());
        // Cache clearing comes after the failed step
        assert_eq!(dispatcher.search_coordinator().cache().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_counts_persisted_artifacts() {
        let analyzer = ScriptedAnalyzer::new()
            .score("always clone the Arc before moving it into a task", 8.0)
            .score("thanks!", 1.0);
        let (mut dispatcher, store) = fixture_with(analyzer).await;
        let history = vec![
            ConversationMessage::user("thanks!"),
            ConversationMessage::assistant("always clone the Arc before moving it into a task"),
        ];
        let project = ProjectContext::named("runtime");

        let execution = dispatcher.dispatch("/x", &history, &project).await.unwrap();
        match execution.outcome {
            Some(CommandOutcome::Extract(report)) => {
                assert_eq!(report.extracted.len(), 1);
                assert_eq!(report.skipped, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(dispatcher.stats().extractions_performed, 1);
        assert_eq!(store.memory().len().await, 5);

        dispatcher.process("/extract --force", &history, &project).await;
        assert_eq!(dispatcher.stats().extractions_performed, 3);
    }

    #[tokio::test]
    async fn test_cleanup_dry_run_and_execute() {
        let (mut dispatcher, store) = fixture().await;
        let (history, project) = no_history();

        let dry = dispatcher.dispatch("/cleanup --aggressive", &history, &project).await.unwrap();
        let candidates = match dry.outcome {
            Some(CommandOutcome::Cleanup(report)) => {
                assert!(report.dry_run);
                report.candidates.len()
            }
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(candidates, 2);
        assert!(store.deletes().is_empty());

        dispatcher
            .process("/clean --aggressive --execute", &history, &project)
            .await;
        assert_eq!(store.deletes().len(), candidates);
        assert_eq!(store.memory().len().await, 2);
    }

    #[tokio::test]
    async fn test_review_auto_clean() {
        let (mut dispatcher, store) = fixture().await;
        let (history, project) = no_history();

        let execution = dispatcher
            .dispatch("/review --low-score --limit=2 --auto-clean", &history, &project)
            .await
            .unwrap();
        match execution.outcome {
            Some(CommandOutcome::Review(report)) => {
                assert_eq!(report.entries.len(), 2);
                assert_eq!(report.deleted.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.deletes().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_command() {
        let (mut dispatcher, store) = fixture().await;
        let (history, project) = no_history();
        let target = store.memory().query(&crate::memory::ArtifactQuery::all()).await.unwrap()[0].id;

        let execution = dispatcher
            .dispatch(&format!("/rm {}", target), &history, &project)
            .await
            .unwrap();
        assert_eq!(
            execution.outcome,
            Some(CommandOutcome::Delete(DeletedArtifact { id: target }))
        );

        let missing = dispatcher.dispatch("/delete", &history, &project).await.unwrap();
        assert!(!missing.success());
        let invalid = dispatcher.dispatch("/del not-a-uuid", &history, &project).await.unwrap();
        assert!(!invalid.success());
        assert_eq!(store.deletes(), vec![target]);
    }

    #[tokio::test]
    async fn test_stats_graph_backup_help() {
        let (mut dispatcher, _) = fixture().await;
        let (history, project) = no_history();

        let stats = dispatcher.dispatch("/status", &history, &project).await.unwrap();
        match stats.outcome {
            Some(CommandOutcome::Stats(report)) => assert_eq!(report.collection.total, 4),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let graph = dispatcher.dispatch("/map", &history, &project).await.unwrap();
        assert!(matches!(graph.outcome, Some(CommandOutcome::Graph(_))));

        let backup = dispatcher.dispatch("/bak", &history, &project).await.unwrap();
        match backup.outcome {
            Some(CommandOutcome::Backup(snapshot)) => assert_eq!(snapshot.artifact_count, 4),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let help = dispatcher.dispatch("/?", &history, &project).await.unwrap();
        match help.outcome {
            Some(CommandOutcome::Help(entries)) => assert_eq!(entries.len(), 10),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    struct FailingCommand;

    #[async_trait]
    impl CommandHandler for FailingCommand {
        async fn handle(
            &self,
            _ctx: &mut CommandContext<'_>,
            _req: &CommandRequest<'_>,
        ) -> Result<CommandOutcome> {
            Err(Error::Internal("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_custom_registration() {
        let (mut dispatcher, _) = fixture().await;
        let mut events = dispatcher.subscribe();
        let (history, project) = no_history();

        dispatcher
            .register(CommandRegistration::new("fail", &["f"], "Always fails", Arc::new(FailingCommand)))
            .unwrap();
        assert!(dispatcher
            .register(CommandRegistration::new("find2", &["find"], "Clashes", Arc::new(FailingCommand)))
            .is_err());

        assert!(dispatcher.process("/F --loud", &history, &project).await);
        let event = events.try_recv().unwrap();
        assert_eq!(event.command, "fail");
        assert_eq!(event.args, vec!["--loud"]);
        assert_eq!(event.error.as_deref(), Some("Internal error: boom"));
    }
}
