//! Optional similarity scoring seam.
//!
//! Classification is correct without any scorer: rule-based detection is
//! the primary signal and a scorer only contributes a 30% re-ranking term.
//! The trait is object-safe and `Send + Sync` so an implementation backed
//! by an external embedding model can be dropped in; the in-tree
//! `LexicalScorer` is a deterministic token-overlap fallback.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::query::intent::IntentKind;

/// Scores a question against each intent category. Implementations must
/// return scores already scaled to `[0, 1]` (cosine scores in `[-1, 1]`
/// rescale as `(s + 1) / 2`). Absence of a kind means "no signal".
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, text: &str) -> anyhow::Result<HashMap<IntentKind, f64>>;
}

/// Canonical example phrasings per intent, used by scorers as the
/// comparison targets. Fixed: these never adapt to loaded data.
pub fn canonical_examples() -> &'static [(IntentKind, &'static [&'static str])] {
    &[
        (
            IntentKind::ColumnNames,
            &[
                "What are all the column names in this file?",
                "List all columns",
                "Show me column names",
            ],
        ),
        (
            IntentKind::RowCount,
            &[
                "How many rows are there?",
                "What is the total number of rows?",
                "Count of records",
            ],
        ),
        (
            IntentKind::Aggregation,
            &[
                "What is the total cost?",
                "Sum of all values",
                "What is the average?",
            ],
        ),
        (
            IntentKind::ListUnique,
            &[
                "What are all the source locations?",
                "List unique values",
                "Show me all different products",
            ],
        ),
        (
            IntentKind::Ranking,
            &[
                "Which has the highest cost?",
                "Top consignment",
                "Most frequent",
            ],
        ),
        (
            IntentKind::Preview,
            &["Show me the first 5 rows", "Preview data", "Sample rows"],
        ),
        (
            IntentKind::TimeRange,
            &["What is the date range?", "Dispatch dates", "Time period"],
        ),
        (
            IntentKind::Filter,
            &[
                "Show consignments going to Mumbai",
                "Filter by destination",
                "Where condition",
            ],
        ),
    ]
}

/// Invoke a scorer with a hard wall-clock bound. Timeout or failure
/// returns `None`; the caller falls back to rule scores unmodified.
pub fn score_with_timeout(
    scorer: Arc<dyn SimilarityScorer>,
    text: &str,
    timeout: Duration,
) -> Option<HashMap<IntentKind, f64>> {
    let (tx, rx) = mpsc::channel();
    let owned = text.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(scorer.score(&owned));
    });
    match rx.recv_timeout(timeout) {
        Ok(Ok(scores)) => Some(scores),
        Ok(Err(err)) => {
            warn!(error = %err, "similarity scoring failed, using rule scores only");
            None
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "similarity scoring timed out");
            None
        }
    }
}

/// Deterministic token-overlap scorer: cosine similarity over binary
/// token sets, max over each intent's canonical examples.
#[derive(Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityScorer for LexicalScorer {
    fn score(&self, text: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
        let query_tokens = tokenize(text);
        let mut scores = HashMap::new();
        for (kind, examples) in canonical_examples() {
            let best = examples
                .iter()
                .map(|ex| token_cosine(&query_tokens, &tokenize(ex)))
                .fold(0.0f64, f64::max);
            scores.insert(*kind, best);
        }
        Ok(scores)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn token_cosine(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let overlap = a.intersection(b).count() as f64;
    overlap / ((a.len() as f64).sqrt() * (b.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_scores_stay_in_unit_interval() {
        let scorer = LexicalScorer::new();
        let scores = scorer.score("How many rows are there?").unwrap();
        for (_, s) in &scores {
            assert!((0.0..=1.0).contains(s));
        }
        // the matching phrasing should dominate
        let row = scores[&IntentKind::RowCount];
        let preview = scores[&IntentKind::Preview];
        assert!(row > preview);
    }

    #[test]
    fn timeout_returns_none_for_slow_scorer() {
        struct SlowScorer;
        impl SimilarityScorer for SlowScorer {
            fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
                std::thread::sleep(Duration::from_millis(200));
                Ok(HashMap::new())
            }
        }
        let result =
            score_with_timeout(Arc::new(SlowScorer), "anything", Duration::from_millis(10));
        assert!(result.is_none());
    }

    #[test]
    fn failure_returns_none() {
        struct FailingScorer;
        impl SimilarityScorer for FailingScorer {
            fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
                anyhow::bail!("model unavailable")
            }
        }
        let result = score_with_timeout(
            Arc::new(FailingScorer),
            "anything",
            Duration::from_millis(100),
        );
        assert!(result.is_none());
    }
}
