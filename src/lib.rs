//! Curator - command-driven curation engine for knowledge artifacts
//!
//! Curator routes textual commands (`/search`, `/review`, `/cleanup`, ...)
//! to operations that search, score, review and prune the artifacts held by
//! a knowledge store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Command Dispatcher                         │
//! │  input ─▶ parse ─▶ registry (ids + aliases) ─▶ handler           │
//! │                                          │                       │
//! │           command:executed event ◀───────┤                       │
//! └──────────────────────────────────────────┼───────────────────────┘
//!        ┌──────────────────┬────────────────┼──────────────────┐
//!        ▼                  ▼                ▼                  ▼
//! ┌──────────────┐  ┌───────────────┐  ┌───────────┐  ┌──────────────────┐
//! │    Search    │  │ Review /      │  │ Optimizer │  │    Extraction    │
//! │  Coordinator │  │ Cleanup       │  │           │  │   Coordinator    │
//! │ cache + chain│  │               │  │           │  │                  │
//! └──────┬───────┘  └──────┬────────┘  └─────┬─────┘  └────────┬─────────┘
//!        │                 └───────┬─────────┘                 │
//!        │                  ┌──────▼───────┐                   │
//!        │                  │Quality Scorer│            ┌──────▼─────┐
//!        │                  └──────────────┘            │  Analyzer  │
//!        ▼                                              └────────────┘
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Store (trait)                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`commands`]: Parsing, registry, handlers and the dispatcher
//! - [`search`]: TTL result cache and the semantic → basic strategy chain
//! - [`curation`]: Quality scoring, review, cleanup and optimization
//! - [`memory`]: Artifacts, the store and analyzer interfaces, extraction
//! - [`config`]: Configuration management

pub mod commands;
pub mod config;
pub mod curation;
pub mod error;
pub mod memory;
pub mod search;

#[cfg(test)]
mod testing;

pub use commands::CommandDispatcher;
pub use config::CuratorConfig;
pub use error::{Error, Result};
