//! Engine configuration
//!
//! Policy knobs live here rather than as constants inside the stages, so the
//! behaviors that are heuristic (ambiguity handling, the prefer-General
//! safety fallback, result caps) stay visible and overridable.

use serde::{Deserialize, Serialize};

/// Intent classification policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// If the top two intent scores are within this gap, the
    /// classification is flagged ambiguous.
    pub ambiguity_threshold: f64,

    /// Weight of the rule-based score in the blended score.
    pub rule_weight: f64,

    /// Weight of the similarity score in the blended score.
    pub similarity_weight: f64,

    /// When a classification is ambiguous and the winner scored below
    /// `general_fallback_threshold`, substitute General as the safer
    /// default. Documented policy, not a hard rule: disabling it keeps
    /// the highest-scoring specific intent.
    pub prefer_general_fallback: bool,

    /// Confidence below which the General substitution applies.
    pub general_fallback_threshold: f64,

    /// Upper bound on one similarity-scorer call, in milliseconds.
    /// On timeout the rule scores are used unmodified.
    pub similarity_timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ambiguity_threshold: 0.15,
            rule_weight: 0.7,
            similarity_weight: 0.3,
            prefer_general_fallback: true,
            general_fallback_threshold: 0.6,
            similarity_timeout_ms: 500,
        }
    }
}

/// Query execution caps. Truncation past a cap is silent and recorded in
/// the result as a more-available indicator, never an error.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// itemized outputs (unique lists, rankings, per-row calculations)
    pub max_result_rows: usize,
    /// verbatim row previews
    pub max_preview_rows: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_result_rows: 1000,
            max_preview_rows: 50,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub executor: ExecutorConfig,
    /// Below this confidence an ambiguous classification gets a
    /// clarification note prepended to the answer.
    pub clarification_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            executor: ExecutorConfig::default(),
            clarification_threshold: 0.5,
        }
    }
}
