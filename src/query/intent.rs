//! The closed intent model.
//!
//! `Intent` is a sum type so every consumer (generator, executor,
//! formatter) matches exhaustively: adding an operation forces each stage
//! to handle it at compile time instead of silently falling through to the
//! General path.

use serde::{Deserialize, Serialize};

/// Discriminant-only intent category, used for scoring, alternatives, and
/// outward-facing metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    ColumnNames,
    RowCount,
    Aggregation,
    GroupBy,
    ListUnique,
    Ranking,
    Preview,
    TimeRange,
    Filter,
    DataTypes,
    MissingValues,
    Operational,
    Calculation,
    General,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::ColumnNames => "column_names",
            IntentKind::RowCount => "row_count",
            IntentKind::Aggregation => "aggregation",
            IntentKind::GroupBy => "group_by",
            IntentKind::ListUnique => "list_unique",
            IntentKind::Ranking => "ranking",
            IntentKind::Preview => "preview",
            IntentKind::TimeRange => "time_range",
            IntentKind::Filter => "filter",
            IntentKind::DataTypes => "data_types",
            IntentKind::MissingValues => "missing_values",
            IntentKind::Operational => "operational",
            IntentKind::Calculation => "calculation",
            IntentKind::General => "general",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation reducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggKind {
    Sum,
    Mean,
    Max,
    Min,
    Count,
}

impl AggKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggKind::Sum => "sum",
            AggKind::Mean => "mean",
            AggKind::Max => "max",
            AggKind::Min => "min",
            AggKind::Count => "count",
        }
    }

    /// Answer-facing label ("Total cost", "Average weight", ...).
    pub fn label(&self) -> &'static str {
        match self {
            AggKind::Sum => "Total",
            AggKind::Mean => "Average",
            AggKind::Max => "Maximum",
            AggKind::Min => "Minimum",
            AggKind::Count => "Count",
        }
    }
}

/// Ranking direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Desc,
    Asc,
}

/// Operational analysis category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalKind {
    Delays,
    Inefficiency,
    Outliers,
    Underutilization,
    Thresholds,
    OperationalCosts,
    General,
}

impl OperationalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalKind::Delays => "delays",
            OperationalKind::Inefficiency => "inefficiency",
            OperationalKind::Outliers => "outliers",
            OperationalKind::Underutilization => "underutilization",
            OperationalKind::Thresholds => "thresholds",
            OperationalKind::OperationalCosts => "operational costs",
            OperationalKind::General => "general",
        }
    }
}

/// Calculation category, used for the answer heading and unit fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalcKind {
    PerCase,
    PerKg,
    WeightPerCase,
    Ratio,
    General,
}

impl CalcKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            CalcKind::PerCase => "Per-Case Value",
            CalcKind::PerKg => "Per-Kilogram Value",
            CalcKind::WeightPerCase => "Weight Per Case Ratio",
            CalcKind::Ratio => "Ratio",
            CalcKind::General => "Calculation",
        }
    }
}

/// A classified question: the intent plus everything the generator needs.
/// Column fields here are still free-text phrases; resolution to concrete
/// columns happens in the generator.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    ColumnNames,
    RowCount {
        /// "how many columns" variant answers the column count instead
        count_columns: bool,
    },
    Aggregation {
        agg: AggKind,
        column: Option<String>,
    },
    GroupBy {
        agg: AggKind,
        agg_column: Option<String>,
        group_column: Option<String>,
    },
    ListUnique {
        column: Option<String>,
    },
    Ranking {
        column: Option<String>,
        order: SortOrder,
        limit: usize,
    },
    Preview {
        limit: usize,
    },
    TimeRange {
        column: Option<String>,
    },
    Filter,
    DataTypes,
    MissingValues,
    Operational {
        kind: OperationalKind,
    },
    Calculation {
        calc: CalcKind,
        numerator: Option<String>,
        denominator: Option<String>,
        group_by: Option<String>,
    },
    General,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::ColumnNames => IntentKind::ColumnNames,
            Intent::RowCount { .. } => IntentKind::RowCount,
            Intent::Aggregation { .. } => IntentKind::Aggregation,
            Intent::GroupBy { .. } => IntentKind::GroupBy,
            Intent::ListUnique { .. } => IntentKind::ListUnique,
            Intent::Ranking { .. } => IntentKind::Ranking,
            Intent::Preview { .. } => IntentKind::Preview,
            Intent::TimeRange { .. } => IntentKind::TimeRange,
            Intent::Filter => IntentKind::Filter,
            Intent::DataTypes => IntentKind::DataTypes,
            Intent::MissingValues => IntentKind::MissingValues,
            Intent::Operational { .. } => IntentKind::Operational,
            Intent::Calculation { .. } => IntentKind::Calculation,
            Intent::General => IntentKind::General,
        }
    }
}

/// Output of one classification. Immutable, produced once per request.
#[derive(Clone, Debug)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub is_ambiguous: bool,
    /// runner-up candidates within the ambiguity gap
    pub alternatives: Vec<(IntentKind, f64)>,
    /// whether a similarity scorer contributed to the score
    pub used_similarity: bool,
    /// whether the prefer-General policy replaced a specific intent
    pub chose_safe_default: bool,
    /// the raw question, kept for formatter titles
    pub text: String,
}
