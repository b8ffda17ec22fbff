//! Curator - command-driven curation engine for knowledge artifacts
//!
//! Runs curation commands against an in-memory store, either interactively
//! or one line at a time.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use curator::{
    commands::{CommandDispatcher, CommandExecution},
    config::CuratorConfig,
    memory::{ConversationMessage, HeuristicAnalyzer, MemoryStore, ProjectContext},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser)]
#[command(name = "curator")]
#[command(author = "A3S Lab Team")]
#[command(version)]
#[command(about = "Command-driven curation engine for knowledge artifacts")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CURATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read lines from stdin; commands are executed, anything else joins the conversation
    Repl {
        /// JSON array of artifacts to load into the store
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Project name recorded on extracted artifacts
        #[arg(long)]
        project: Option<String>,
    },

    /// Execute a single command line
    Exec {
        /// The command line, e.g. "/search tokio --limit=5"
        line: String,

        /// JSON array of artifacts to load into the store
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let fmt_layer = if cli.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("curator={}", log_level).into()),
        )
        .with(fmt_layer)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Repl { seed, project } => {
            run_repl(config, seed.as_deref(), project).await?;
        }
        Commands::Exec { line, seed } => {
            run_exec(config, seed.as_deref(), &line).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

/// Explicit path, then ~/.curator/config.toml, then defaults
fn load_config(explicit: Option<&Path>) -> Result<CuratorConfig> {
    if let Some(path) = explicit {
        return CuratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    let path = CuratorConfig::default_path();
    if path.exists() {
        tracing::debug!(path = %path.display(), "Using default config file");
        return CuratorConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    Ok(CuratorConfig::default())
}

async fn build_dispatcher(config: CuratorConfig, seed: Option<&Path>) -> Result<CommandDispatcher> {
    let store = match seed {
        Some(path) => MemoryStore::from_json_file(path)
            .await
            .with_context(|| format!("Failed to load seed {}", path.display()))?,
        None => MemoryStore::new(),
    };
    let analyzer = HeuristicAnalyzer::new()?;
    Ok(CommandDispatcher::new(
        config,
        Arc::new(store),
        Arc::new(analyzer),
    )?)
}

fn print_execution(execution: &CommandExecution) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(execution)?);
    Ok(())
}

async fn run_repl(config: CuratorConfig, seed: Option<&Path>, project: Option<String>) -> Result<()> {
    let mut dispatcher = build_dispatcher(config, seed).await?;
    let project = project.map(ProjectContext::named).unwrap_or_default();
    let mut history: Vec<ConversationMessage> = Vec::new();

    let mut events = dispatcher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        event = event.name(),
                        command = %event.command,
                        success = event.success,
                        "Event received"
                    );
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("Curator ready. Type /help for commands, Ctrl+D to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match dispatcher.dispatch(line, &history, &project).await {
            Some(execution) => print_execution(&execution)?,
            None => history.push(ConversationMessage::user(line)),
        }
    }

    tracing::info!(
        searches = dispatcher.stats().searches_performed,
        extractions = dispatcher.stats().extractions_performed,
        "Session ended"
    );
    Ok(())
}

async fn run_exec(config: CuratorConfig, seed: Option<&Path>, line: &str) -> Result<()> {
    let mut dispatcher = build_dispatcher(config, seed).await?;
    match dispatcher
        .dispatch(line, &[], &ProjectContext::default())
        .await
    {
        Some(execution) => {
            print_execution(&execution)?;
            if !execution.success() {
                anyhow::bail!(
                    "{} failed: {}",
                    execution.command,
                    execution.error.as_deref().unwrap_or("unknown error")
                );
            }
            Ok(())
        }
        None => anyhow::bail!("Not a known command: {}", line),
    }
}

fn show_config(config: Option<&CuratorConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
