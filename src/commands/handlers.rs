//! Built-in command handlers

use super::parser::ParsedCommand;
use super::registry::{CommandRegistration, CommandRegistry, HelpEntry};
use super::session::SessionStats;
use crate::config::CuratorConfig;
use crate::curation::{
    BackupSnapshot, CleanupEngine, CleanupMode, CleanupReport, CollectionStats, KnowledgeGraph,
    OptimizationReport, Optimizer, QualityScorer, ReviewEngine, ReviewPolicy, ReviewReport,
};
use crate::error::{Error, Result};
use crate::memory::{
    Analyzer, ArtifactType, ConversationMessage, ExtractionCoordinator, ExtractionReport,
    ProjectContext, Store,
};
use crate::search::{SearchCoordinator, SearchOutcome, SearchRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Session state a handler may read or update
pub struct CommandContext<'a> {
    pub store: Arc<dyn Store>,
    pub analyzer: Arc<dyn Analyzer>,
    pub search: &'a mut SearchCoordinator,
    pub stats: &'a mut SessionStats,
    pub scorer: &'a QualityScorer,
    pub config: &'a CuratorConfig,
    pub registry: &'a CommandRegistry,
}

/// The invocation being handled
pub struct CommandRequest<'a> {
    pub command: &'a ParsedCommand,
    pub history: &'a [ConversationMessage],
    pub project: &'a ProjectContext,
}

/// Store and session totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub collection: CollectionStats,
    pub session: SessionStats,
}

/// Result of the `delete` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedArtifact {
    pub id: Uuid,
}

/// Structured result of a handled command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    Search(SearchOutcome),
    Stats(StatsReport),
    Review(ReviewReport),
    Extract(ExtractionReport),
    Optimize(OptimizationReport),
    Graph(KnowledgeGraph),
    Cleanup(CleanupReport),
    Backup(BackupSnapshot),
    Delete(DeletedArtifact),
    Help(Vec<HelpEntry>),
}

/// A command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome>;
}

/// `search <term…> [--limit=N] [--type=T]`
pub struct SearchCommand;

#[async_trait]
impl CommandHandler for SearchCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let cmd = req.command;
        let term = cmd.joined_args();
        if term.trim().is_empty() {
            return Err(Error::Parse("search requires a term".to_string()));
        }
        let limit = cmd
            .usize_option("limit")?
            .unwrap_or(ctx.config.search.default_limit);
        let artifact_type = match cmd.value("type") {
            None => None,
            Some(t) if t.eq_ignore_ascii_case("all") => None,
            Some(t) => Some(t.parse::<ArtifactType>()?),
        };

        let outcome = ctx
            .search
            .search(&SearchRequest {
                term,
                limit,
                artifact_type,
            })
            .await?;
        ctx.stats.record_search();
        Ok(CommandOutcome::Search(outcome))
    }
}

/// `stats`
pub struct StatsCommand;

#[async_trait]
impl CommandHandler for StatsCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        _req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let collection = CollectionStats::collect(ctx.store.as_ref()).await?;
        Ok(CommandOutcome::Stats(StatsReport {
            collection,
            session: ctx.stats.clone(),
        }))
    }
}

/// `review [policy] [--recent|--low-score|--duplicates|--stale] [--limit=N] [--auto-clean]`
pub struct ReviewCommand;

const POLICY_FLAGS: [(&str, ReviewPolicy); 4] = [
    ("recent", ReviewPolicy::Recent),
    ("low-score", ReviewPolicy::LowScore),
    ("duplicates", ReviewPolicy::Duplicates),
    ("stale", ReviewPolicy::Stale),
];

fn review_policy(cmd: &ParsedCommand) -> Result<ReviewPolicy> {
    let mut selected: Vec<ReviewPolicy> = POLICY_FLAGS
        .iter()
        .filter(|(flag, _)| cmd.flag(flag))
        .map(|&(_, policy)| policy)
        .collect();
    if let Some(name) = cmd.args.first() {
        selected.push(name.parse()?);
    }
    selected.dedup();
    match selected.as_slice() {
        [] => Ok(ReviewPolicy::default()),
        [policy] => Ok(*policy),
        _ => Err(Error::Parse(format!(
            "conflicting review policies: {}",
            selected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

#[async_trait]
impl CommandHandler for ReviewCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let cmd = req.command;
        let policy = review_policy(cmd)?;
        let limit = cmd.usize_option("limit")?;
        let engine = ReviewEngine::new(
            ctx.store.clone(),
            ctx.scorer.clone(),
            ctx.config.review.clone(),
        );
        let report = engine.review(policy, limit, cmd.flag("auto-clean")).await?;
        Ok(CommandOutcome::Review(report))
    }
}

/// `extract [--force] [--window=N]`
pub struct ExtractCommand;

#[async_trait]
impl CommandHandler for ExtractCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let cmd = req.command;
        let window = cmd.usize_option("window")?;
        let coordinator = ExtractionCoordinator::new(
            ctx.analyzer.clone(),
            ctx.store.clone(),
            ctx.config.extraction.clone(),
        );
        let report = coordinator
            .extract(req.history, req.project, cmd.flag("force"), window)
            .await;
        ctx.stats.record_extractions(report.extracted.len());
        Ok(CommandOutcome::Extract(report))
    }
}

/// `optimize`
pub struct OptimizeCommand;

#[async_trait]
impl CommandHandler for OptimizeCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        _req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let optimizer = Optimizer::new(ctx.store.clone(), ctx.analyzer.clone(), ctx.scorer.clone());
        let report = optimizer.run(&mut *ctx.search).await;
        if let Some(failure) = &report.failed {
            let finished: Vec<String> = report.steps.iter().map(|s| s.step.to_string()).collect();
            return Err(Error::Store(format!(
                "optimization halted at {} after [{}]: {}",
                failure.step,
                finished.join(", "),
                failure.error
            )));
        }
        ctx.stats.record_optimization(report.finished_at);
        Ok(CommandOutcome::Optimize(report))
    }
}

/// `graph`
pub struct GraphCommand;

#[async_trait]
impl CommandHandler for GraphCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        _req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let graph = KnowledgeGraph::build(ctx.store.as_ref()).await?;
        Ok(CommandOutcome::Graph(graph))
    }
}

/// `cleanup [--aggressive] [--execute]`
pub struct CleanupCommand;

#[async_trait]
impl CommandHandler for CleanupCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let cmd = req.command;
        let mode = if cmd.flag("aggressive") {
            CleanupMode::Aggressive
        } else {
            CleanupMode::Conservative
        };
        let engine = CleanupEngine::new(
            ctx.store.clone(),
            ctx.scorer.clone(),
            ctx.config.cleanup.clone(),
        );
        let report = engine.cleanup(mode, cmd.flag("execute")).await?;
        Ok(CommandOutcome::Cleanup(report))
    }
}

/// `backup`
pub struct BackupCommand;

#[async_trait]
impl CommandHandler for BackupCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        _req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let snapshot = BackupSnapshot::capture(ctx.store.as_ref(), &*ctx.stats).await?;
        Ok(CommandOutcome::Backup(snapshot))
    }
}

/// `delete <id>`
pub struct DeleteCommand;

#[async_trait]
impl CommandHandler for DeleteCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        let raw = req
            .command
            .args
            .first()
            .ok_or_else(|| Error::Parse("delete requires an artifact id".to_string()))?;
        let id = Uuid::parse_str(raw)
            .map_err(|e| Error::Parse(format!("invalid artifact id '{}': {}", raw, e)))?;
        ctx.store.delete(&id).await?;
        tracing::info!(artifact_id = %id, "Deleted artifact");
        Ok(CommandOutcome::Delete(DeletedArtifact { id }))
    }
}

/// `help`
pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn handle(
        &self,
        ctx: &mut CommandContext<'_>,
        _req: &CommandRequest<'_>,
    ) -> Result<CommandOutcome> {
        Ok(CommandOutcome::Help(ctx.registry.help()))
    }
}

/// The built-in command table
pub fn builtin_commands() -> Vec<CommandRegistration> {
    vec![
        CommandRegistration::new(
            "search",
            &["s", "find"],
            "Search artifacts: search <term> [--limit=N] [--type=T]",
            Arc::new(SearchCommand),
        ),
        CommandRegistration::new(
            "stats",
            &["st", "status"],
            "Show collection and session statistics",
            Arc::new(StatsCommand),
        ),
        CommandRegistration::new(
            "review",
            &["r", "rev"],
            "Review artifacts: [--recent|--low-score|--duplicates|--stale] [--limit=N] [--auto-clean]",
            Arc::new(ReviewCommand),
        ),
        CommandRegistration::new(
            "extract",
            &["x", "ext"],
            "Extract artifacts from the conversation: [--force] [--window=N]",
            Arc::new(ExtractCommand),
        ),
        CommandRegistration::new(
            "optimize",
            &["o", "opt"],
            "Deduplicate, archive, re-score, reindex and clear the search cache",
            Arc::new(OptimizeCommand),
        ),
        CommandRegistration::new(
            "graph",
            &["g", "map"],
            "Show the knowledge map by project and type",
            Arc::new(GraphCommand),
        ),
        CommandRegistration::new(
            "cleanup",
            &["c", "clean"],
            "Remove low-quality artifacts: [--aggressive] [--execute]",
            Arc::new(CleanupCommand),
        ),
        CommandRegistration::new(
            "backup",
            &["b", "bak"],
            "Snapshot all artifacts and session statistics",
            Arc::new(BackupCommand),
        ),
        CommandRegistration::new(
            "delete",
            &["del", "rm"],
            "Delete an artifact: delete <id>",
            Arc::new(DeleteCommand),
        ),
        CommandRegistration::new(
            "help",
            &["h", "?"],
            "List available commands",
            Arc::new(HelpCommand),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parser::parse_input;

    #[test]
    fn test_review_policy_selection() {
        let policy = |line: &str| review_policy(&parse_input('/', line).unwrap());
        assert_eq!(policy("/review").unwrap(), ReviewPolicy::Recent);
        assert_eq!(policy("/review --stale").unwrap(), ReviewPolicy::Stale);
        assert_eq!(policy("/review --low_score").unwrap(), ReviewPolicy::LowScore);
        assert_eq!(policy("/review duplicates").unwrap(), ReviewPolicy::Duplicates);
        assert_eq!(policy("/review stale --stale").unwrap(), ReviewPolicy::Stale);
        assert!(matches!(policy("/review --stale --recent"), Err(Error::Parse(_))));
        assert!(policy("/review bogus").is_err());
    }

    #[test]
    fn test_builtin_table_registers_cleanly() {
        let mut registry = CommandRegistry::new();
        for registration in builtin_commands() {
            registry.register(registration).unwrap();
        }
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.resolve("?").unwrap().id, "help");
        assert_eq!(registry.resolve("rm").unwrap().id, "delete");
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let outcome = CommandOutcome::Delete(DeletedArtifact { id: Uuid::nil() });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "delete");
        assert_eq!(json["result"]["id"], Uuid::nil().to_string());
    }
}
