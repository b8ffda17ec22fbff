//! Content analysis
//!
//! The [`Analyzer`] trait scores arbitrary text for relevance and assigns it
//! an artifact type. [`HeuristicAnalyzer`] is a deterministic, regex-driven
//! implementation (no LLM) used by the binary and as a baseline backend.

use super::artifact::{clamp_relevance, ArtifactType};
use crate::error::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Result of analyzing a piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Relevance score (0.0–10.0)
    pub relevance_score: f64,
    /// Detected artifact type
    pub artifact_type: ArtifactType,
    /// Analyzer-specific context, merged into the artifact's context
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// Pluggable content analyzer.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Score and classify a piece of text
    async fn analyze_content(&self, text: &str) -> Result<Analysis>;

    /// Human-readable name for this analyzer (used in logs)
    fn name(&self) -> &str;
}

struct SignalRule {
    name: &'static str,
    artifact_type: ArtifactType,
    pattern: Regex,
    weight: f64,
}

const SIGNAL_RULES: &[(&str, ArtifactType, &str, f64)] = &[
    (
        "code",
        ArtifactType::Code,
        r"(?m)```|\bfn\s+\w+\s*\(|\bdef\s+\w+\s*\(|\bclass\s+\w+|\bimpl\b|^\s*(use|import)\s+[\w:.]+",
        3.0,
    ),
    (
        "configuration",
        ArtifactType::Configuration,
        r"(?im)^\s*\[[\w.\-]+\]\s*$|\.(toml|ya?ml|env|ini)\b|\bconfig(uration)?\b",
        2.0,
    ),
    (
        "documentation",
        ArtifactType::Documentation,
        r"(?im)^#{1,6}\s+\S|\breadme\b|\bdocumentation\b|\bdocs?\b",
        2.0,
    ),
    (
        "learning",
        ArtifactType::Learning,
        r"(?i)\b(learned|lesson|til|turns out|remember that|note to self|insight|gotcha)\b",
        4.0,
    ),
];

/// Rule-based analyzer.
///
/// Scoring: a base of 2.0, plus up to 3.0 for length (one point per 100
/// characters), plus the weight of every signal rule that matches. Chit-chat
/// acknowledgements score 1.0. The type is the matching rule with the most
/// hits; long unmatched text is a conversation extract, short unmatched text
/// is unknown.
pub struct HeuristicAnalyzer {
    rules: Vec<SignalRule>,
    chit_chat: Regex,
}

impl HeuristicAnalyzer {
    /// Create a new analyzer with the built-in signal rules
    pub fn new() -> Result<Self> {
        let rules = SIGNAL_RULES
            .iter()
            .map(|&(name, artifact_type, pattern, weight)| {
                let pattern = Regex::new(pattern).map_err(|e| {
                    Error::Analyzer(format!("Invalid regex pattern for rule '{}': {}", name, e))
                })?;
                Ok(SignalRule {
                    name,
                    artifact_type,
                    pattern,
                    weight,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let chit_chat = Regex::new(r"(?i)^\s*(ok|okay|thanks|thank you|thx|yes|no|sure|cool|great|nice)[.!]*\s*$")
            .map_err(|e| Error::Analyzer(e.to_string()))?;

        Ok(Self { rules, chit_chat })
    }

    /// Analyze synchronously; the async trait method delegates here
    pub fn analyze(&self, text: &str) -> Analysis {
        let mut context = serde_json::Map::new();

        if self.chit_chat.is_match(text) {
            context.insert("signals".to_string(), serde_json::json!([]));
            return Analysis {
                relevance_score: 1.0,
                artifact_type: ArtifactType::Unknown,
                context,
            };
        }

        let length_bonus = (text.chars().count() as f64 / 100.0).min(3.0);
        let mut score = 2.0 + length_bonus;
        let mut signals = Vec::new();
        let mut best: Option<(ArtifactType, usize)> = None;

        for rule in &self.rules {
            let hits = rule.pattern.find_iter(text).count();
            if hits == 0 {
                continue;
            }
            score += rule.weight;
            signals.push(rule.name);
            if best.map_or(true, |(_, n)| hits > n) {
                best = Some((rule.artifact_type, hits));
            }
        }

        let artifact_type = match best {
            Some((at, _)) => at,
            None if text.chars().count() >= 80 => ArtifactType::ConversationExtract,
            None => ArtifactType::Unknown,
        };

        context.insert("signals".to_string(), serde_json::json!(signals));

        Analysis {
            relevance_score: clamp_relevance((score * 10.0).round() / 10.0),
            artifact_type,
            context,
        }
    }
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    async fn analyze_content(&self, text: &str) -> Result<Analysis> {
        Ok(self.analyze(text))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
