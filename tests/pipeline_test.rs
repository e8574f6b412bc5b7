//! End-to-end question answering over in-memory datasets.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};

use tabular_qa_engine::pipeline::QueryPipeline;
use tabular_qa_engine::query::IntentKind;
use tabular_qa_engine::storage::{DatasetStore, Table};

fn consignment_store() -> Arc<DatasetStore> {
    let store = Arc::new(DatasetStore::new());
    let cost: ArrayRef = Arc::new(Float64Array::from(vec![
        Some(100.0),
        Some(200.0),
        None,
    ]));
    let cases: ArrayRef = Arc::new(Int64Array::from(vec![2, 4, 5]));
    let mode: ArrayRef = Arc::new(StringArray::from(vec!["Truck", "Truck", "Rail"]));
    let source: ArrayRef = Arc::new(StringArray::from(vec!["Delhi", "Mumbai", "Delhi"]));
    let dispatch: ArrayRef = Arc::new(StringArray::from(vec![
        "2024-01-01",
        "2024-01-05",
        "2024-01-10",
    ]));
    let table = Table::try_new(vec![
        ("Total Transportation Cost".to_string(), cost),
        ("Total No Of Cases".to_string(), cases),
        ("Mode".to_string(), mode),
        ("Source Name".to_string(), source),
        ("Date of Dispatch".to_string(), dispatch),
    ])
    .unwrap();
    store.register("consignments", table);
    store
}

fn pipeline() -> QueryPipeline {
    QueryPipeline::new(consignment_store())
}

#[test]
fn total_cost_skips_null_cells() {
    let response = pipeline().process("What is the total cost?", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::Aggregation);
    assert!(response.answer.contains("300"), "{}", response.answer);
}

#[test]
fn grouped_cost_partitions_the_total() {
    let response = pipeline().process("total cost by transportation mode", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::GroupBy);
    assert!(response.answer.contains("Truck: 300"), "{}", response.answer);
    // Rail has only a null cost; a sum over nothing is zero
    assert!(response.answer.contains("Rail: 0"), "{}", response.answer);
}

#[test]
fn source_locations_are_listed_sorted() {
    let response = pipeline().process("What are all the source locations?", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::ListUnique);
    let delhi = response.answer.find("Delhi").unwrap();
    let mumbai = response.answer.find("Mumbai").unwrap();
    assert!(delhi < mumbai);
    assert!(response.answer.contains("2 unique values"));
}

#[test]
fn missing_weight_column_names_real_columns() {
    let response = pipeline().process("total weight per transportation mode", None);
    assert_eq!(response.intent, IntentKind::GroupBy);
    assert!(!response.success);
    assert!(response.answer.contains("Mode"), "{}", response.answer);
    assert!(
        response.answer.contains("Total Transportation Cost"),
        "{}",
        response.answer
    );
}

#[test]
fn cost_per_case_excludes_null_rows() {
    let response = pipeline().process("What is the cost per case?", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::Calculation);
    // ratios are [50, 50], third row excluded for its null numerator
    assert!(response.answer.contains("50"), "{}", response.answer);
    assert!(response.answer.contains("1 row excluded"), "{}", response.answer);
}

#[test]
fn row_count_across_datasets() {
    let store = consignment_store();
    let extra: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
    let table = Table::try_new(vec![("N".to_string(), extra)]).unwrap();
    store.register("plans", table);

    let response = QueryPipeline::new(store).process("How many rows are there?", None);
    assert!(response.success);
    assert!(response.answer.contains("Total: 5 rows"), "{}", response.answer);
}

#[test]
fn dispatch_date_range_is_inclusive() {
    let response = pipeline().process("What is the date range of dispatch dates?", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::TimeRange);
    assert!(response.answer.contains("2024-01-01"), "{}", response.answer);
    assert!(response.answer.contains("2024-01-10"), "{}", response.answer);
    assert!(response.answer.contains("10 days"), "{}", response.answer);
}

#[test]
fn preview_targets_requested_dataset() {
    let store = consignment_store();
    let extra: ArrayRef = Arc::new(StringArray::from(vec!["alpha", "beta"]));
    let table = Table::try_new(vec![("Plan Name".to_string(), extra)]).unwrap();
    store.register("plans", table);

    let pipeline = QueryPipeline::new(store);
    let response = pipeline.process("Show me the first 2 rows", Some("plans"));
    assert!(response.success, "{}", response.answer);
    assert!(response.answer.contains("'plans'"), "{}", response.answer);
    assert!(response.answer.contains("alpha"), "{}", response.answer);
}

#[test]
fn unknown_dataset_is_a_polite_failure() {
    let response = pipeline().process("How much is the total cost?", Some("nothing"));
    assert!(!response.success);
    assert!(response.answer.starts_with("Sorry"), "{}", response.answer);
}

#[test]
fn missing_values_are_counted() {
    let response = pipeline().process("Are there any missing values?", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::MissingValues);
    assert!(
        response.answer.contains("Total Transportation Cost: 1 missing"),
        "{}",
        response.answer
    );
}

#[test]
fn general_chatter_falls_back_to_preview() {
    let response = pipeline().process("tell me about this", None);
    assert!(response.success, "{}", response.answer);
    assert_eq!(response.intent, IntentKind::General);
    assert!(response.answer.contains("Showing"), "{}", response.answer);
}

#[test]
fn confidence_is_bounded_and_ambiguity_has_alternatives() {
    let pipeline = pipeline();
    for text in [
        "How many rows are there?",
        "What is the total cost?",
        "Show me the first 5 rows",
        "complete nonsense input",
        "top 3 by cost",
    ] {
        let response = pipeline.process(text, None);
        assert!(
            (0.0..=1.0).contains(&response.confidence),
            "confidence out of range for {text:?}"
        );
    }
}
