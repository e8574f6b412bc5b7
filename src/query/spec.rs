//! Executable query plans.
//!
//! A `QuerySpec` is fully bound: every column it names has already been
//! resolved against a real table, and the tables it runs over are
//! captured as `Arc` snapshots. Execution therefore needs no registry
//! lookups and cannot observe a dataset swap mid-query.

use std::sync::Arc;

use crate::query::intent::{AggKind, CalcKind, OperationalKind, SortOrder};
use crate::storage::{ColumnRef, Table};

#[derive(Debug, Clone)]
pub enum QuerySpec {
    /// Column listing across every bound dataset.
    ColumnNames { datasets: Vec<(String, Arc<Table>)> },
    RowCount {
        datasets: Vec<(String, Arc<Table>)>,
        count_columns: bool,
    },
    Aggregation {
        agg: AggKind,
        column: ColumnRef,
        table: Arc<Table>,
    },
    GroupBy {
        agg: AggKind,
        agg_column: ColumnRef,
        group_column: ColumnRef,
        table: Arc<Table>,
    },
    ListUnique {
        column: ColumnRef,
        table: Arc<Table>,
    },
    Ranking {
        column: ColumnRef,
        table: Arc<Table>,
        order: SortOrder,
        limit: usize,
    },
    Preview {
        dataset_id: String,
        table: Arc<Table>,
        limit: usize,
    },
    TimeRange {
        column: ColumnRef,
        table: Arc<Table>,
    },
    DataTypes {
        datasets: Vec<(String, Arc<Table>)>,
    },
    MissingValues {
        datasets: Vec<(String, Arc<Table>)>,
    },
    Operational {
        kind: OperationalKind,
        datasets: Vec<(String, Arc<Table>)>,
    },
    Calculation {
        calc: CalcKind,
        numerator: ColumnRef,
        denominator: ColumnRef,
        group_by: Option<ColumnRef>,
        table: Arc<Table>,
    },
    /// Filter and general questions fall back to a bounded preview so
    /// the caller still gets something to look at.
    Fallback {
        dataset_id: String,
        table: Arc<Table>,
        limit: usize,
    },
}

impl QuerySpec {
    pub fn name(&self) -> &'static str {
        match self {
            QuerySpec::ColumnNames { .. } => "column_names",
            QuerySpec::RowCount { .. } => "row_count",
            QuerySpec::Aggregation { .. } => "aggregation",
            QuerySpec::GroupBy { .. } => "group_by",
            QuerySpec::ListUnique { .. } => "list_unique",
            QuerySpec::Ranking { .. } => "ranking",
            QuerySpec::Preview { .. } => "preview",
            QuerySpec::TimeRange { .. } => "time_range",
            QuerySpec::DataTypes { .. } => "data_types",
            QuerySpec::MissingValues { .. } => "missing_values",
            QuerySpec::Operational { .. } => "operational",
            QuerySpec::Calculation { .. } => "calculation",
            QuerySpec::Fallback { .. } => "fallback",
        }
    }
}
