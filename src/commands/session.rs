//! Per-session counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters owned by one dispatcher. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub searches_performed: u64,
    /// Artifacts persisted by extraction
    pub extractions_performed: u64,
    pub optimizations_run: u64,
    pub last_optimization: Option<DateTime<Utc>>,
    pub session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            searches_performed: 0,
            extractions_performed: 0,
            optimizations_run: 0,
            last_optimization: None,
            session_start: Utc::now(),
        }
    }

    pub fn record_search(&mut self) {
        self.searches_performed += 1;
    }

    pub fn record_extractions(&mut self, persisted: usize) {
        self.extractions_performed += persisted as u64;
    }

    /// Record a fully completed optimization run
    pub fn record_optimization(&mut self, at: DateTime<Utc>) {
        self.optimizations_run += 1;
        self.last_optimization = Some(at);
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
