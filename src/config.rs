//! Curator configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest accepted `review.stale_after_days` (about a century)
pub const MAX_STALE_AFTER_DAYS: i64 = 36_500;

/// Main Curator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Command parsing configuration
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Search and cache configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Quality scoring policy
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Review configuration
    #[serde(default)]
    pub review: ReviewConfig,

    /// Cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl CuratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (~/.curator/config.toml)
    pub fn default_path() -> PathBuf {
        dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".curator")
            .join("config.toml")
    }

    /// Reject configurations that would make scoring or parsing ambiguous
    pub fn validate(&self) -> Result<()> {
        if self.commands.prefix.is_whitespace() || self.commands.prefix == '-' {
            return Err(Error::Config(format!(
                "command prefix '{}' is not allowed",
                self.commands.prefix
            )));
        }
        if self.scoring.delete_below > self.scoring.keep_at_or_above {
            return Err(Error::Config(format!(
                "scoring.delete_below ({}) must not exceed scoring.keep_at_or_above ({})",
                self.scoring.delete_below, self.scoring.keep_at_or_above
            )));
        }
        if self.search.default_limit == 0 {
            return Err(Error::Config("search.default_limit must be positive".to_string()));
        }
        if !(0..=MAX_STALE_AFTER_DAYS).contains(&self.review.stale_after_days) {
            return Err(Error::Config(format!(
                "review.stale_after_days ({}) must be between 0 and {}",
                self.review.stale_after_days, MAX_STALE_AFTER_DAYS
            )));
        }
        Ok(())
    }
}

/// Command parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Character that marks input as a command
    pub prefix: char,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { prefix: '/' }
    }
}

/// Search and cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Time-to-live of cached result sets in milliseconds
    pub cache_ttl_ms: u64,

    /// Result limit when `--limit` is not given
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 300_000,
            default_limit: 10,
        }
    }
}

/// Quality scoring policy.
///
/// The action bands gate irreversible deletions, so every threshold here is
/// deployment-tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Relevance assumed when an artifact has none
    pub neutral_relevance: f64,

    /// Content shorter than this (in characters) is flagged `too_short`
    pub min_content_length: usize,

    /// Penalty applied for `too_short`
    pub short_content_penalty: f64,

    /// Relevance below this is flagged `low_relevance`
    pub low_relevance_threshold: f64,

    /// Penalty applied for `low_relevance`
    pub low_relevance_penalty: f64,

    /// Quality below this recommends deletion
    pub delete_below: f64,

    /// Quality at or above this recommends keeping
    pub keep_at_or_above: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            neutral_relevance: 5.0,
            min_content_length: 20,
            short_content_penalty: 2.0,
            low_relevance_threshold: 4.0,
            low_relevance_penalty: 1.0,
            delete_below: 3.0,
            keep_at_or_above: 6.0,
        }
    }
}

/// Review configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Candidates selected when `--limit` is not given
    pub default_limit: usize,

    /// Artifacts older than this many days are stale
    pub stale_after_days: i64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            stale_after_days: 30,
        }
    }
}

/// Cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Maximum number of candidates considered in one run
    pub max_candidates: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_candidates: 100,
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum analyzer relevance for a message to be persisted
    pub threshold: f64,

    /// Number of trailing conversation messages examined
    pub window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            threshold: 6.0,
            window: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CuratorConfig::default();
        assert_eq!(config.commands.prefix, '/');
        assert_eq!(config.search.cache_ttl_ms, 300_000);
        assert_eq!(config.scoring.min_content_length, 20);
        assert_eq!(config.scoring.delete_below, 3.0);
        assert_eq!(config.scoring.keep_at_or_above, 6.0);
        assert_eq!(config.extraction.threshold, 6.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CuratorConfig = toml::from_str(
            r#"
            [scoring]
            delete_below = 2.5

            [search]
            cache_ttl_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.scoring.delete_below, 2.5);
        assert_eq!(config.scoring.keep_at_or_above, 6.0);
        assert_eq!(config.search.cache_ttl_ms, 1000);
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.commands.prefix, '/');
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[commands]\nprefix = \"!\"\n\n[extraction]\nwindow = 3").unwrap();

        let config = CuratorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.commands.prefix, '!');
        assert_eq!(config.extraction.window, 3);
        assert_eq!(config.extraction.threshold, 6.0);
    }

    #[test]
    fn test_from_missing_file() {
        let result = CuratorConfig::from_file("/nonexistent/curator.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_bands() {
        let mut config = CuratorConfig::default();
        config.scoring.delete_below = 7.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dash_prefix() {
        let mut config = CuratorConfig::default();
        config.commands.prefix = '-';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_stale_days_out_of_range() {
        let mut config = CuratorConfig::default();
        config.review.stale_after_days = i64::MAX;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.review.stale_after_days = -1;
        assert!(config.validate().is_err());

        config.review.stale_after_days = MAX_STALE_AFTER_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = CuratorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CuratorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.review.stale_after_days, config.review.stale_after_days);
    }
}
