//! The four-stage question pipeline.
//!
//! Classify, generate, execute, format, strictly in that order, with one
//! early-exit path per stage: any stage error becomes a templated
//! apology and `success: false`. Nothing here is fatal and no state
//! survives a request beyond the shared read-only dataset registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::execution::QueryExecutor;
use crate::query::classifier::IntentClassifier;
use crate::query::generator::QueryGenerator;
use crate::query::intent::IntentKind;
use crate::query::similarity::SimilarityScorer;
use crate::response::ResponseFormatter;
use crate::storage::DatasetStore;

/// Outward-facing result of one question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub answer: String,
    pub success: bool,
    pub intent: IntentKind,
    pub confidence: f64,
    pub is_ambiguous: bool,
    /// true when the safer-General policy replaced a shaky specific
    /// intent; callers can distinguish that from a natural General
    pub chose_safe_default: bool,
}

pub struct QueryPipeline {
    store: Arc<DatasetStore>,
    classifier: IntentClassifier,
    generator: QueryGenerator,
    executor: QueryExecutor,
    formatter: ResponseFormatter,
    config: PipelineConfig,
}

impl QueryPipeline {
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self::with_config(store, PipelineConfig::default())
    }

    pub fn with_config(store: Arc<DatasetStore>, config: PipelineConfig) -> Self {
        Self {
            store,
            classifier: IntentClassifier::new(config.classifier.clone()),
            generator: QueryGenerator::new(),
            executor: QueryExecutor::new(config.executor),
            formatter: ResponseFormatter::new(),
            config,
        }
    }

    /// Attach an optional similarity scorer to the classification stage.
    pub fn with_scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.classifier = self.classifier.with_scorer(scorer);
        self
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Answer one question. Never fails: every error becomes an apology
    /// answer with `success: false`.
    pub fn process(&self, text: &str, dataset_id: Option<&str>) -> PipelineResponse {
        let classification = self.classifier.classify(text);
        let intent = classification.intent.kind();
        info!(
            intent = %intent,
            confidence = classification.confidence,
            ambiguous = classification.is_ambiguous,
            "processing question"
        );

        let outcome = self
            .generator
            .generate(self.store.as_ref(), &classification, dataset_id)
            .and_then(|spec| self.executor.execute(&spec));

        let (answer, success) = match outcome {
            Ok(output) => {
                let mut answer = self.formatter.format(&output);
                if classification.is_ambiguous
                    && classification.confidence < self.config.clarification_threshold
                {
                    answer = format!(
                        "I'm not fully sure what you're asking; here is my best interpretation.\n\n{answer}"
                    );
                }
                (answer, true)
            }
            Err(error) => {
                info!(error = %error, "question failed");
                (self.formatter.format_error(&error), false)
            }
        };

        PipelineResponse {
            answer,
            success,
            intent,
            confidence: classification.confidence,
            is_ambiguous: classification.is_ambiguous,
            chose_safe_default: classification.chose_safe_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use std::sync::Arc;

    fn pipeline() -> QueryPipeline {
        let store = Arc::new(DatasetStore::new());
        let source: ArrayRef = Arc::new(StringArray::from(vec!["Delhi", "Mumbai", "Delhi"]));
        let cost: ArrayRef = Arc::new(Float64Array::from(vec![100.0, 200.0, 300.0]));
        let table = Table::try_new(vec![
            ("Source Name".to_string(), source),
            ("Total Transportation Cost".to_string(), cost),
        ])
        .unwrap();
        store.register("consignments", table);
        QueryPipeline::new(store)
    }

    #[test]
    fn successful_question_end_to_end() {
        let response = pipeline().process("What is the total cost?", None);
        assert!(response.success);
        assert_eq!(response.intent, IntentKind::Aggregation);
        assert!(response.answer.contains("600"));
    }

    #[test]
    fn unique_sources_are_listed_sorted() {
        let response = pipeline().process("What are all the source locations?", None);
        assert!(response.success);
        let delhi = response.answer.find("Delhi").unwrap();
        let mumbai = response.answer.find("Mumbai").unwrap();
        assert!(delhi < mumbai);
        assert!(response.answer.contains("2 unique values"));
    }

    #[test]
    fn missing_column_becomes_apology() {
        let response = pipeline().process("total weight per transportation mode", None);
        assert!(!response.success);
        assert!(response.answer.contains("Source Name"));
    }

    #[test]
    fn response_serializes_for_transport() {
        let response = pipeline().process("How many rows are there?", None);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        let back: PipelineResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.intent, IntentKind::RowCount);
    }

    #[test]
    fn shaky_question_gets_clarification_and_safe_default() {
        use std::collections::HashMap;

        struct ZeroScorer;
        impl SimilarityScorer for ZeroScorer {
            fn score(&self, _: &str) -> anyhow::Result<HashMap<IntentKind, f64>> {
                Ok(HashMap::new())
            }
        }

        let store = pipeline().store;
        let config = PipelineConfig {
            clarification_threshold: 0.7,
            ..PipelineConfig::default()
        };
        let pipeline = QueryPipeline::with_config(store, config).with_scorer(Arc::new(ZeroScorer));
        let response = pipeline.process("consignments with high cost", None);
        assert!(response.success);
        assert!(response.is_ambiguous);
        assert!(response.chose_safe_default);
        assert_eq!(response.intent, IntentKind::General);
        assert!(response.answer.starts_with("I'm not fully sure"));
    }

    #[test]
    fn empty_store_is_not_fatal() {
        let pipeline = QueryPipeline::new(Arc::new(DatasetStore::new()));
        let response = pipeline.process("How many rows?", None);
        assert!(!response.success);
        assert!(response.answer.contains("no dataset"));
    }
}
