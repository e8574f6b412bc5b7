//! Typed payloads produced by query execution.
//!
//! Each variant mirrors the operation that produced it so the formatter
//! dispatches on the payload alone. Coercion counts ride along with
//! numeric results: cells silently treated as null during numeric or
//! temporal coercion stay visible to anyone auditing an answer.

use serde::{Deserialize, Serialize};

use crate::query::intent::{AggKind, CalcKind, OperationalKind, SortOrder};

/// Column listing for one dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetColumns {
    pub dataset_id: String,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetShape {
    pub dataset_id: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupValue {
    pub key: String,
    pub value: f64,
    /// non-null cells behind this value
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub column: String,
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub pct: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetMissing {
    pub dataset_id: String,
    pub total_rows: usize,
    pub columns: Vec<ColumnMissing>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatioRow {
    pub label: Option<String>,
    pub value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum QueryOutput {
    ColumnNames {
        datasets: Vec<DatasetColumns>,
    },
    RowCount {
        datasets: Vec<DatasetShape>,
        total_rows: usize,
        count_columns: bool,
    },
    Aggregation {
        agg: AggKind,
        column: String,
        value: f64,
        non_null: usize,
        coerced_nulls: usize,
    },
    GroupBy {
        agg: AggKind,
        agg_column: String,
        group_column: String,
        /// sorted descending by value before formatting anyway, but
        /// produced in that order so the payload is deterministic
        groups: Vec<GroupValue>,
        /// mean/max/min groups with no numeric cells are dropped
        omitted_groups: usize,
        /// rows whose group key was null
        null_keys_excluded: usize,
        coerced_nulls: usize,
    },
    ListUnique {
        column: String,
        values: Vec<String>,
        distinct_total: usize,
        truncated: bool,
    },
    Ranking {
        column: String,
        order: SortOrder,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        /// ranked value per returned row, aligned with `rows`
        values: Vec<f64>,
        more_available: bool,
    },
    Preview {
        dataset_id: String,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        total_rows: usize,
        more_available: bool,
    },
    TimeRange {
        column: String,
        start: String,
        end: String,
        /// inclusive span in days
        days: i64,
        valid: usize,
        coerced_nulls: usize,
    },
    DataTypes {
        datasets: Vec<(String, Vec<ColumnTypeInfo>)>,
    },
    MissingValues {
        datasets: Vec<DatasetMissing>,
        any_missing: bool,
    },
    Operational {
        kind: OperationalKind,
        datasets: Vec<DatasetShape>,
    },
    Calculation {
        calc: CalcKind,
        numerator: String,
        denominator: String,
        /// per-row ratios, or per-group mean ratios when grouped
        rows: Vec<RatioRow>,
        grouped: bool,
        /// mean over every included ratio, computed before any row cap
        overall_mean: f64,
        /// rows dropped for a null or zero denominator, or a null numerator
        excluded_rows: usize,
        truncated: bool,
    },
}

impl QueryOutput {
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryOutput::ColumnNames { .. } => "column_names",
            QueryOutput::RowCount { .. } => "row_count",
            QueryOutput::Aggregation { .. } => "aggregation",
            QueryOutput::GroupBy { .. } => "group_by",
            QueryOutput::ListUnique { .. } => "list_unique",
            QueryOutput::Ranking { .. } => "ranking",
            QueryOutput::Preview { .. } => "preview",
            QueryOutput::TimeRange { .. } => "time_range",
            QueryOutput::DataTypes { .. } => "data_types",
            QueryOutput::MissingValues { .. } => "missing_values",
            QueryOutput::Operational { .. } => "operational",
            QueryOutput::Calculation { .. } => "calculation",
        }
    }
}
