//! Rule-based intent classification with optional similarity blending.
//!
//! Every detector runs against the lower-cased question; multiple intents
//! firing at once is expected, not an error. Rule confidences are fixed
//! per intent. When a similarity scorer is attached its scores contribute
//! a 30% re-ranking term for intents that already have a rule score; the
//! scorer failing or timing out degrades transparently to rule-only.

use regex::{Regex, RegexSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClassifierConfig;
use crate::query::intent::{
    AggKind, CalcKind, ClassificationResult, Intent, IntentKind, OperationalKind, SortOrder,
};
use crate::query::similarity::{score_with_timeout, SimilarityScorer};

const GENERAL_CONFIDENCE: f64 = 0.3;
const DEFAULT_RANKING_LIMIT: usize = 10;
const DEFAULT_PREVIEW_LIMIT: usize = 5;

struct Detector {
    kind: IntentKind,
    confidence: f64,
    patterns: RegexSet,
}

pub struct IntentClassifier {
    config: ClassifierConfig,
    scorer: Option<Arc<dyn SimilarityScorer>>,
    detectors: Vec<Detector>,
    limit_re: Regex,
    rows_re: Regex,
    agg_sum_re: Regex,
    agg_mean_re: Regex,
    agg_max_re: Regex,
    agg_min_re: Regex,
    agg_count_re: Regex,
}

fn regex_set(patterns: &[&str]) -> RegexSet {
    RegexSet::new(patterns).expect("static intent patterns compile")
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extraction pattern compiles")
}

impl IntentClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        // Declaration order breaks score ties: specific intents before the
        // generic list/filter readings.
        let detectors = vec![
            Detector {
                kind: IntentKind::ColumnNames,
                confidence: 0.95,
                patterns: regex_set(&[
                    r"column\s+name",
                    r"what\s+are\s+(all\s+)?the\s+columns",
                    r"list\s+(all\s+)?columns",
                    r"show\s+(me\s+)?(all\s+)?columns",
                ]),
            },
            Detector {
                kind: IntentKind::RowCount,
                confidence: 0.95,
                patterns: regex_set(&[
                    r"how\s+many\s+(rows|records|entries|consignments)",
                    r"total\s+(number\s+of\s+)?(rows|records|entries)",
                    r"count\s+(of\s+)?(rows|records|entries)",
                ]),
            },
            Detector {
                kind: IntentKind::Preview,
                confidence: 0.95,
                patterns: regex_set(&[
                    r"show\s+me\s+(the\s+)?(first|last)\s+\d+\s+rows",
                    r"preview",
                    r"first\s+\d+\s+rows",
                    r"sample\s+data",
                ]),
            },
            Detector {
                kind: IntentKind::DataTypes,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"data\s+types?",
                    r"(which\s+)?columns\s+contain\s+(numerical|text|date|time)",
                    r"what\s+are\s+the\s+data\s+types",
                ]),
            },
            Detector {
                kind: IntentKind::MissingValues,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"missing\s+values?",
                    r"null\s+values?",
                    r"which\s+columns\s+have\s+missing",
                    r"how\s+many\s+missing",
                    r"are\s+there\s+any\s+missing",
                ]),
            },
            Detector {
                kind: IntentKind::Calculation,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"per\s+(case|kg|kilogram|unit|consignment)",
                    r"ratio",
                    r"per\s+unit",
                    r"(cost|weight|volume)\s+per",
                    r"efficiency",
                ]),
            },
            Detector {
                kind: IntentKind::GroupBy,
                confidence: 0.85,
                patterns: regex_set(&[
                    r"by\s+(transportation\s+mode|source\s+location|destination|mode|location|customer|product)",
                    r"per\s+(transportation\s+mode|source|destination|mode|location|customer)",
                    r"each\s+(transportation\s+mode|source|destination|mode|location|customer)",
                    r"distribution\s+by",
                    r"grouped\s+by",
                    r"vary\s+by",
                ]),
            },
            Detector {
                kind: IntentKind::Aggregation,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"\b(total|sum|average|mean|avg|maximum|max|minimum|min|count)\b",
                    r"how\s+much\s+(total|sum)",
                    r"what\s+is\s+the\s+(total|sum|average)",
                ]),
            },
            Detector {
                kind: IntentKind::Ranking,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"\b(highest|lowest|top|bottom|maximum|minimum|max|min)\b",
                    r"which\s+.*\s+(has|is)\s+(the\s+)?(highest|lowest|most|least)",
                    r"(most|least)\s+frequent",
                ]),
            },
            Detector {
                kind: IntentKind::ListUnique,
                confidence: 0.90,
                patterns: regex_set(&[
                    r"what\s+are\s+(all\s+)?the",
                    r"list\s+(all\s+)?",
                    r"show\s+me\s+(all\s+)?",
                    r"what\s+(are|is)\s+(all\s+)?(the\s+)?(different|unique)",
                ]),
            },
            Detector {
                kind: IntentKind::TimeRange,
                confidence: 0.85,
                patterns: regex_set(&[
                    r"date\s+range",
                    r"between\s+.*\s+and\s+",
                    r"from\s+.*\s+to\s+",
                    r"dispatch\s+date",
                    r"arrival\s+date",
                ]),
            },
            Detector {
                kind: IntentKind::Operational,
                confidence: 0.85,
                patterns: regex_set(&[
                    r"delay",
                    r"inefficienc",
                    r"outlier",
                    r"underutilized",
                    r"low\s+(weight|volume)\s+fill",
                    r"high\s+cost",
                    r"capacity\s+threshold",
                    r"optimal\s+(weight|volume)",
                    r"operational\s+cost",
                ]),
            },
            Detector {
                kind: IntentKind::Filter,
                confidence: 0.80,
                patterns: regex_set(&[
                    r"where\s+",
                    r"with\s+",
                    r"that\s+(have|are|is)",
                    r"going\s+to\s+",
                    r"coming\s+from\s+",
                ]),
            },
        ];

        Self {
            config,
            scorer: None,
            detectors,
            limit_re: regex(r"(top|first|last)\s+(\d+)"),
            rows_re: regex(r"(\d+)\s+rows?"),
            agg_sum_re: regex(r"\b(total|sum)\b"),
            agg_mean_re: regex(r"\b(average|mean|avg)\b"),
            agg_max_re: regex(r"\b(maximum|max)\b"),
            agg_min_re: regex(r"\b(minimum|min)\b"),
            agg_count_re: regex(r"\b(count)\b"),
        }
    }

    /// Attach a similarity scorer for blended ranking.
    pub fn with_scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Classify a question. Never fails: text no detector matches comes
    /// back as General at low confidence.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lower = text.to_lowercase().trim().to_string();

        let mut candidates = self.rule_scores(&lower);
        let mut used_similarity = false;

        if let Some(scorer) = &self.scorer {
            if !candidates.is_empty() {
                let timeout = Duration::from_millis(self.config.similarity_timeout_ms);
                if let Some(sim) = score_with_timeout(Arc::clone(scorer), text, timeout) {
                    for (kind, score) in candidates.iter_mut() {
                        let s = sim.get(kind).copied().unwrap_or(0.0);
                        *score = *score * self.config.rule_weight
                            + s * self.config.similarity_weight;
                    }
                    used_similarity = true;
                }
            }
        }

        if candidates.is_empty() {
            debug!(text = %text, "no intent detector fired, defaulting to general");
            return ClassificationResult {
                intent: Intent::General,
                confidence: GENERAL_CONFIDENCE,
                is_ambiguous: false,
                alternatives: Vec::new(),
                used_similarity,
                chose_safe_default: false,
                text: text.to_string(),
            };
        }

        // Sorted descending; the candidate vector is already in
        // declaration order, and the stable sort preserves it on ties.
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (mut winner, confidence) = candidates[0];
        let mut is_ambiguous = false;
        let mut alternatives = Vec::new();
        let mut chose_safe_default = false;

        if candidates.len() > 1 {
            let (second, second_score) = candidates[1];
            if confidence - second_score < self.config.ambiguity_threshold {
                is_ambiguous = true;
                alternatives.push((second, second_score));
            }
        }

        // An ambiguous low-confidence winner is worse than admitting
        // uncertainty; the safe default hands the question to the
        // general-answer path instead of guessing.
        if self.config.prefer_general_fallback
            && is_ambiguous
            && confidence < self.config.general_fallback_threshold
        {
            winner = IntentKind::General;
            chose_safe_default = true;
        }

        let intent = self.extract_params(&lower, winner);
        debug!(
            intent = %intent.kind(),
            confidence,
            is_ambiguous,
            "classified question"
        );

        ClassificationResult {
            intent,
            confidence,
            is_ambiguous,
            alternatives,
            used_similarity,
            chose_safe_default,
            text: text.to_string(),
        }
    }

    fn rule_scores(&self, lower: &str) -> Vec<(IntentKind, f64)> {
        let mut scores: Vec<(IntentKind, f64)> = self
            .detectors
            .iter()
            .filter(|d| d.patterns.is_match(lower))
            .map(|d| (d.kind, d.confidence))
            .collect();
        // A grouped aggregation is the more specific reading of the same
        // text; a plain Aggregation candidate would always outscore it,
        // and a Calculation reading with no computable operands yields
        // to the grouped one as well.
        if scores.iter().any(|(k, _)| *k == IntentKind::GroupBy) {
            scores.retain(|(k, _)| *k != IntentKind::Aggregation);
            if let Intent::Calculation { numerator: None, .. } = extract_calculation(lower) {
                scores.retain(|(k, _)| *k != IntentKind::Calculation);
            }
        }
        scores
    }

    fn extract_params(&self, lower: &str, kind: IntentKind) -> Intent {
        match kind {
            IntentKind::ColumnNames => Intent::ColumnNames,
            IntentKind::RowCount => Intent::RowCount {
                count_columns: lower.contains("columns")
                    || (lower.contains("column") && lower.contains("count")),
            },
            IntentKind::Aggregation => self.extract_aggregation(lower),
            IntentKind::GroupBy => self.extract_group_by(lower),
            IntentKind::ListUnique => Intent::ListUnique {
                column: list_target(lower),
            },
            IntentKind::Ranking => self.extract_ranking(lower),
            IntentKind::Preview => Intent::Preview {
                limit: self
                    .rows_re
                    .captures(lower)
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(DEFAULT_PREVIEW_LIMIT),
            },
            IntentKind::TimeRange => Intent::TimeRange {
                column: time_target(lower),
            },
            IntentKind::Filter => Intent::Filter,
            IntentKind::DataTypes => Intent::DataTypes,
            IntentKind::MissingValues => Intent::MissingValues,
            IntentKind::Operational => Intent::Operational {
                kind: operational_kind(lower),
            },
            IntentKind::Calculation => extract_calculation(lower),
            IntentKind::General => Intent::General,
        }
    }

    fn agg_kind(&self, lower: &str) -> AggKind {
        if self.agg_sum_re.is_match(lower) {
            AggKind::Sum
        } else if self.agg_mean_re.is_match(lower) {
            AggKind::Mean
        } else if self.agg_max_re.is_match(lower) {
            AggKind::Max
        } else if self.agg_min_re.is_match(lower) {
            AggKind::Min
        } else if self.agg_count_re.is_match(lower) {
            AggKind::Count
        } else {
            AggKind::Sum
        }
    }

    fn extract_aggregation(&self, lower: &str) -> Intent {
        const COMMON_COLUMNS: &[&str] = &[
            "cost", "weight", "volume", "cases", "mrp", "value", "price", "amount", "quantity",
            "count",
        ];
        let column = COMMON_COLUMNS
            .iter()
            .find(|c| lower.contains(**c))
            .map(|c| c.to_string());
        Intent::Aggregation {
            agg: self.agg_kind(lower),
            column,
        }
    }

    fn extract_ranking(&self, lower: &str) -> Intent {
        let order = if ["highest", "maximum", "max", "most"]
            .iter()
            .any(|w| lower.contains(w))
        {
            SortOrder::Desc
        } else if ["lowest", "minimum", "min", "least"]
            .iter()
            .any(|w| lower.contains(w))
        {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };

        let column = if lower.contains("cases") && lower.contains("order") {
            Some("no_of_cases")
        } else if lower.contains("cost") {
            Some("total_transportation_cost")
        } else if lower.contains("weight") {
            Some("total_weight")
        } else if lower.contains("volume") {
            Some("total_volume")
        } else if lower.contains("mrp") || lower.contains("value") {
            Some("total_consignment_mrp_value")
        } else if lower.contains("price") {
            Some("total_transportation_cost")
        } else if lower.contains("cases") {
            Some("total_no_of_cases")
        } else {
            None
        };

        let limit = self
            .limit_re
            .captures(lower)
            .and_then(|c| c[2].parse().ok())
            .unwrap_or(DEFAULT_RANKING_LIMIT);

        Intent::Ranking {
            column: column.map(str::to_string),
            order,
            limit,
        }
    }

    fn extract_group_by(&self, lower: &str) -> Intent {
        let mut agg = self.agg_kind(lower);

        let agg_column = if lower.contains("average") && lower.contains("weight") && lower.contains("per")
        {
            agg = AggKind::Mean;
            Some("total_weight")
        } else if lower.contains("weight") && lower.contains("per") {
            Some("total_weight")
        } else if lower.contains("cost") {
            Some("total_transportation_cost")
        } else if lower.contains("weight") {
            Some("total_weight")
        } else if lower.contains("volume") {
            Some("total_volume")
        } else if lower.contains("cases") {
            Some("total_no_of_cases")
        } else if lower.contains("mrp") || lower.contains("value") {
            Some("total_consignment_mrp_value")
        } else {
            None
        };

        let group_column = if lower.contains("transportation mode")
            || (lower.contains("mode") && lower.contains("transportation"))
        {
            Some("mode")
        } else if lower.contains("source location")
            || (lower.contains("source") && lower.contains("location") && !lower.contains("type"))
        {
            Some("source_name")
        } else if lower.contains("source") && lower.contains("type") {
            Some("source_type")
        } else if lower.contains("destination location")
            || (lower.contains("destination")
                && lower.contains("location")
                && !lower.contains("type"))
        {
            Some("destination_name")
        } else if lower.contains("destination") && lower.contains("type") {
            Some("destination_type")
        } else if lower.contains("customer") {
            Some("customer_name")
        } else if lower.contains("product") {
            Some("product_name")
        } else if lower.contains("load type") {
            Some("load_type")
        } else if lower.contains("mode") {
            Some("mode")
        } else {
            None
        };

        Intent::GroupBy {
            agg,
            agg_column: agg_column.map(str::to_string),
            group_column: group_column.map(str::to_string),
        }
    }
}

fn list_target(lower: &str) -> Option<String> {
    let column = if lower.contains("source location")
        || (lower.contains("source") && lower.contains("location"))
    {
        "source_name"
    } else if lower.contains("source type") || (lower.contains("source") && lower.contains("type"))
    {
        "source_type"
    } else if lower.contains("destination location")
        || (lower.contains("destination") && lower.contains("location"))
    {
        "destination_name"
    } else if lower.contains("destination type")
        || (lower.contains("destination") && lower.contains("type"))
    {
        "destination_type"
    } else if lower.contains("source") || lower.contains("origin") {
        "source_name"
    } else if lower.contains("destination") {
        "destination_name"
    } else if lower.contains("product code") {
        "product_code"
    } else if lower.contains("product") {
        "product_name"
    } else if lower.contains("mode") || lower.contains("transportation") {
        "mode"
    } else if lower.contains("customer") {
        "customer_name"
    } else if lower.contains("consignment") {
        "consignment_no"
    } else if lower.contains("order") {
        "order"
    } else if lower.contains("unit") {
        "unit"
    } else if lower.contains("plan name") {
        "plan_name"
    } else {
        return None;
    };
    Some(column.to_string())
}

fn time_target(lower: &str) -> Option<String> {
    if lower.contains("dispatch") {
        Some("date_of_dispatch".to_string())
    } else if lower.contains("arrival") || lower.contains("expected") {
        Some("expected_date_of_arrival".to_string())
    } else {
        None
    }
}

fn operational_kind(lower: &str) -> OperationalKind {
    if lower.contains("delay") {
        OperationalKind::Delays
    } else if lower.contains("inefficienc")
        || (lower.contains("low") && (lower.contains("fill") || lower.contains("utilization")))
    {
        OperationalKind::Inefficiency
    } else if lower.contains("outlier") {
        OperationalKind::Outliers
    } else if lower.contains("underutilized") {
        OperationalKind::Underutilization
    } else if lower.contains("optimal") || lower.contains("threshold") {
        OperationalKind::Thresholds
    } else if lower.contains("operational cost") {
        OperationalKind::OperationalCosts
    } else {
        OperationalKind::General
    }
}

fn extract_calculation(lower: &str) -> Intent {
    const COST: &str = "total_transportation_cost";
    const WEIGHT: &str = "total_weight";
    const CASES: &str = "total_no_of_cases";

    let (calc, numerator, denominator) = if lower.contains("per case")
        || lower.contains("case ratio")
    {
        if lower.contains("cost") {
            (CalcKind::PerCase, Some(COST), Some(CASES))
        } else if lower.contains("weight") {
            (CalcKind::PerCase, Some(WEIGHT), Some(CASES))
        } else {
            (CalcKind::PerCase, None, None)
        }
    } else if lower.contains("per kg") || lower.contains("per kilogram") {
        if lower.contains("cost") {
            (CalcKind::PerKg, Some(COST), Some(WEIGHT))
        } else {
            (CalcKind::PerKg, None, None)
        }
    } else if lower.contains("weight per case")
        || lower.contains("weight/case")
        || (lower.contains("weight") && lower.contains("case") && lower.contains("ratio"))
    {
        (CalcKind::WeightPerCase, Some(WEIGHT), Some(CASES))
    } else if lower.contains("ratio") {
        if lower.contains("weight") && lower.contains("case") {
            (CalcKind::Ratio, Some(WEIGHT), Some(CASES))
        } else if lower.contains("cost") && lower.contains("case") {
            (CalcKind::Ratio, Some(COST), Some(CASES))
        } else {
            (CalcKind::Ratio, None, None)
        }
    } else {
        (CalcKind::General, None, None)
    };

    let group_by = if lower.contains("each product") || lower.contains("per product") {
        Some("product_name")
    } else if lower.contains("each consignment") || lower.contains("per consignment") {
        Some("consignment_no")
    } else if lower.contains("each order") || lower.contains("per order") {
        Some("order")
    } else {
        None
    };

    Intent::Calculation {
        calc,
        numerator: numerator.map(str::to_string),
        denominator: denominator.map(str::to_string),
        group_by: group_by.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(ClassifierConfig::default())
    }

    #[test]
    fn row_count_question() {
        let result = classifier().classify("How many rows are there?");
        assert_eq!(result.intent, Intent::RowCount { count_columns: false });
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn column_count_variant() {
        let result = classifier().classify("How many rows and columns does this file have?");
        assert_eq!(result.intent, Intent::RowCount { count_columns: true });
    }

    #[test]
    fn list_unique_source_locations() {
        let result = classifier().classify("What are all the source locations?");
        assert_eq!(
            result.intent,
            Intent::ListUnique {
                column: Some("source_name".to_string())
            }
        );
    }

    #[test]
    fn grouped_aggregation_beats_plain_aggregation() {
        let result = classifier().classify("total weight per transportation mode");
        assert_eq!(
            result.intent,
            Intent::GroupBy {
                agg: AggKind::Sum,
                agg_column: Some("total_weight".to_string()),
                group_column: Some("mode".to_string()),
            }
        );
    }

    #[test]
    fn ranking_with_limit_and_order() {
        let result = classifier().classify("Show the top 3 consignments with highest cost");
        match result.intent {
            Intent::Ranking {
                column,
                order,
                limit,
            } => {
                assert_eq!(column.as_deref(), Some("total_transportation_cost"));
                assert_eq!(order, SortOrder::Desc);
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn ranking_defaults() {
        let result = classifier().classify("Which consignment has the lowest weight?");
        match result.intent {
            Intent::Ranking {
                column,
                order,
                limit,
            } => {
                assert_eq!(column.as_deref(), Some("total_weight"));
                assert_eq!(order, SortOrder::Asc);
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn preview_limit_extraction() {
        let result = classifier().classify("Show me the first 7 rows");
        assert_eq!(result.intent, Intent::Preview { limit: 7 });
    }

    #[test]
    fn calculation_cost_per_case() {
        let result = classifier().classify("What is the cost per case for each product?");
        assert_eq!(
            result.intent,
            Intent::Calculation {
                calc: CalcKind::PerCase,
                numerator: Some("total_transportation_cost".to_string()),
                denominator: Some("total_no_of_cases".to_string()),
                group_by: Some("product_name".to_string()),
            }
        );
    }

    #[test]
    fn unmatched_text_defaults_to_general() {
        let result = classifier().classify("hello there");
        assert_eq!(result.intent, Intent::General);
        assert!((result.confidence - 0.3).abs() < f64::EPSILON);
        assert!(!result.is_ambiguous);
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        let questions = [
            "How many rows?",
            "total cost",
            "show me the first 5 rows",
            "what are the data types",
            "gibberish input",
            "cost per kg by mode",
        ];
        for q in questions {
            let result = classifier().classify(q);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "confidence out of range for {q:?}"
            );
            if result.is_ambiguous {
                assert!(!result.alternatives.is_empty());
                let (_, alt) = result.alternatives[0];
                assert!(result.confidence - alt < 0.15 + 1e-9);
            }
        }
    }

    #[test]
    fn ambiguity_is_flagged_for_close_scores() {
        // preview (0.95) and list (0.90) both fire
        let result = classifier().classify("Show me the first 5 rows");
        assert!(result.is_ambiguous);
        assert_eq!(result.intent.kind(), IntentKind::Preview);
    }

    struct ZeroScorer;
    impl SimilarityScorer for ZeroScorer {
        fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
            Ok(HashMap::new())
        }
    }

    #[test]
    fn shaky_ambiguous_winner_downgrades_to_general() {
        // operational (0.85) and filter (0.80) both fire; with no
        // similarity support the blend lands them at 0.595 and 0.56
        let classifier = classifier().with_scorer(Arc::new(ZeroScorer));
        let result = classifier.classify("consignments with high cost");
        assert!(result.is_ambiguous);
        assert!(result.confidence < 0.6);
        assert!(result.chose_safe_default);
        assert_eq!(result.intent, Intent::General);
    }

    #[test]
    fn safe_default_policy_can_be_disabled() {
        let config = ClassifierConfig {
            prefer_general_fallback: false,
            ..ClassifierConfig::default()
        };
        let classifier = IntentClassifier::new(config).with_scorer(Arc::new(ZeroScorer));
        let result = classifier.classify("consignments with high cost");
        assert!(result.is_ambiguous);
        assert!(!result.chose_safe_default);
        assert_eq!(result.intent.kind(), IntentKind::Operational);
    }

    #[test]
    fn confident_winner_is_never_downgraded() {
        // rule-only scoring keeps the winner above the threshold
        let result = classifier().classify("consignments with high cost");
        assert!(result.confidence >= 0.6);
        assert!(!result.chose_safe_default);
        assert_eq!(result.intent.kind(), IntentKind::Operational);
    }

    #[test]
    fn similarity_blend_keeps_rule_winner_on_failure() {
        struct FailingScorer;
        impl SimilarityScorer for FailingScorer {
            fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
                anyhow::bail!("model unavailable")
            }
        }
        let classifier = classifier().with_scorer(Arc::new(FailingScorer));
        let result = classifier.classify("How many rows are there?");
        assert_eq!(result.intent.kind(), IntentKind::RowCount);
        assert!(!result.used_similarity);
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn similarity_blend_rescales_scores() {
        struct FlatScorer;
        impl SimilarityScorer for FlatScorer {
            fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
                let mut m = HashMap::new();
                m.insert(IntentKind::RowCount, 1.0);
                Ok(m)
            }
        }
        let classifier = classifier().with_scorer(Arc::new(FlatScorer));
        let result = classifier.classify("How many rows are there?");
        assert!(result.used_similarity);
        // 0.95 * 0.7 + 1.0 * 0.3
        assert!((result.confidence - 0.965).abs() < 1e-9);
    }
}
