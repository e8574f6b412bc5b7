//! Template rendering of query results into final answers.
//!
//! Every payload variant maps to exactly one template. The formatter
//! never computes anything the executor did not already produce; it only
//! renders, picks units, and truncates long tables for readability.

use crate::error::QaError;
use crate::execution::result::QueryOutput;
use crate::query::intent::{AggKind, OperationalKind, SortOrder};
use crate::response::units::{calc_unit, unit_for, with_unit};

const MAX_TABLE_ROWS: usize = 10;
const MAX_CELL_CHARS: usize = 50;

pub struct ResponseFormatter;

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, output: &QueryOutput) -> String {
        match output {
            QueryOutput::ColumnNames { datasets } => format_column_names(datasets),
            QueryOutput::RowCount {
                datasets,
                total_rows,
                count_columns,
            } => format_row_count(datasets, *total_rows, *count_columns),
            QueryOutput::Aggregation {
                agg,
                column,
                value,
                non_null,
                coerced_nulls,
            } => format_aggregation(*agg, column, *value, *non_null, *coerced_nulls),
            QueryOutput::GroupBy {
                agg,
                agg_column,
                group_column,
                groups,
                omitted_groups,
                ..
            } => format_group_by(*agg, agg_column, group_column, groups, *omitted_groups),
            QueryOutput::ListUnique {
                column,
                values,
                distinct_total,
                truncated,
            } => format_list_unique(column, values, *distinct_total, *truncated),
            QueryOutput::Ranking {
                column,
                order,
                headers,
                rows,
                more_available,
                ..
            } => format_ranking(column, *order, headers, rows, *more_available),
            QueryOutput::Preview {
                dataset_id,
                headers,
                rows,
                total_rows,
                ..
            } => format_preview(dataset_id, headers, rows, *total_rows),
            QueryOutput::TimeRange {
                column,
                start,
                end,
                days,
                valid,
                ..
            } => format!(
                "'{column}' spans from {start} to {end}, covering {days} day{} across {valid} dated row{}.",
                plural(*days as usize),
                plural(*valid)
            ),
            QueryOutput::DataTypes { datasets } => format_data_types(datasets),
            QueryOutput::MissingValues {
                datasets,
                any_missing,
            } => format_missing_values(datasets, *any_missing),
            QueryOutput::Operational { kind, datasets } => format_operational(*kind, datasets),
            QueryOutput::Calculation {
                calc,
                numerator,
                denominator,
                rows,
                grouped,
                overall_mean,
                excluded_rows,
                truncated,
            } => format_calculation(
                *calc,
                numerator,
                denominator,
                rows,
                *grouped,
                *overall_mean,
                *excluded_rows,
                *truncated,
            ),
        }
    }

    /// Uniform apology template for any stage failure.
    pub fn format_error(&self, error: &QaError) -> String {
        match error {
            QaError::ColumnNotFound {
                phrase,
                available,
                total,
            } => {
                let mut out = format!(
                    "Sorry, I couldn't find a column matching '{phrase}'. The dataset has {total} column{}:",
                    plural(*total)
                );
                for column in available {
                    out.push_str("\n- ");
                    out.push_str(column);
                }
                if available.len() < *total {
                    out.push_str(&format!("\n- ... and {} more", total - available.len()));
                }
                out
            }
            QaError::NoDatasetLoaded => {
                "Sorry, no dataset is loaded yet. Please load a CSV file first.".to_string()
            }
            other => format!("Sorry, I couldn't answer that: {other}."),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Grouped-thousands rendering: integral values drop the decimal point.
pub fn fmt_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rendered = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.*}", decimals, value)
    };
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part.as_str()),
    };
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

fn format_column_names(datasets: &[crate::execution::result::DatasetColumns]) -> String {
    let mut out = String::new();
    for dataset in datasets {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!(
            "The dataset '{}' has {} column{}:",
            dataset.dataset_id,
            dataset.columns.len(),
            plural(dataset.columns.len())
        ));
        for column in &dataset.columns {
            out.push_str("\n- ");
            out.push_str(column);
        }
    }
    out
}

fn format_row_count(
    datasets: &[crate::execution::result::DatasetShape],
    total_rows: usize,
    count_columns: bool,
) -> String {
    if datasets.len() == 1 {
        let d = &datasets[0];
        return if count_columns {
            format!(
                "The dataset '{}' has {} column{}.",
                d.dataset_id,
                d.columns,
                plural(d.columns)
            )
        } else {
            format!(
                "The dataset '{}' has {} row{}.",
                d.dataset_id,
                fmt_number(d.rows as f64, 0),
                plural(d.rows)
            )
        };
    }
    let mut out = String::new();
    for d in datasets {
        let (n, noun) = if count_columns {
            (d.columns, "column")
        } else {
            (d.rows, "row")
        };
        out.push_str(&format!(
            "- '{}': {} {}{}\n",
            d.dataset_id,
            fmt_number(n as f64, 0),
            noun,
            plural(n)
        ));
    }
    if !count_columns {
        out.push_str(&format!(
            "Total: {} rows across {} datasets.",
            fmt_number(total_rows as f64, 0),
            datasets.len()
        ));
    }
    out.trim_end().to_string()
}

fn format_aggregation(
    agg: AggKind,
    column: &str,
    value: f64,
    non_null: usize,
    coerced_nulls: usize,
) -> String {
    let mut out = if agg == AggKind::Count {
        format!(
            "'{column}' has {} non-null value{}.",
            fmt_number(value, 0),
            plural(value as usize)
        )
    } else {
        let rendered = with_unit(&fmt_number(value, 2), unit_for(column));
        format!("The {} of '{column}' is {rendered}.", agg.label().to_lowercase())
    };
    if coerced_nulls > 0 {
        out.push_str(&format!(
            " ({} of {} cells were not numeric and were excluded.)",
            coerced_nulls,
            non_null + coerced_nulls
        ));
    }
    out
}

fn format_group_by(
    agg: AggKind,
    agg_column: &str,
    group_column: &str,
    groups: &[crate::execution::result::GroupValue],
    omitted_groups: usize,
) -> String {
    let unit = unit_for(agg_column);
    let mut out = format!("{} of '{agg_column}' by '{group_column}':", agg.label());
    for group in groups {
        out.push_str(&format!(
            "\n- {}: {}",
            group.key,
            with_unit(&fmt_number(group.value, 2), unit)
        ));
    }
    if omitted_groups > 0 {
        out.push_str(&format!(
            "\n({omitted_groups} group{} with no numeric values omitted.)",
            plural(omitted_groups)
        ));
    }
    out
}

fn format_list_unique(
    column: &str,
    values: &[String],
    distinct_total: usize,
    truncated: bool,
) -> String {
    let mut out = format!(
        "There {} {} unique value{} in '{column}':",
        if distinct_total == 1 { "is" } else { "are" },
        distinct_total,
        plural(distinct_total)
    );
    for value in values {
        out.push_str("\n- ");
        out.push_str(value);
    }
    if truncated {
        out.push_str(&format!("\n(Showing the first {} values.)", values.len()));
    }
    out
}

fn format_ranking(
    column: &str,
    order: SortOrder,
    headers: &[String],
    rows: &[Vec<Option<String>>],
    more_available: bool,
) -> String {
    let direction = match order {
        SortOrder::Desc => "highest",
        SortOrder::Asc => "lowest",
    };
    let mut out = format!(
        "Top {} row{} by '{column}' ({direction} first):\n\n",
        rows.len(),
        plural(rows.len())
    );
    out.push_str(&render_table(headers, rows));
    if more_available {
        out.push_str("\n(More rows available beyond this limit.)");
    }
    out
}

fn format_preview(
    dataset_id: &str,
    headers: &[String],
    rows: &[Vec<Option<String>>],
    total_rows: usize,
) -> String {
    let mut out = format!(
        "Showing {} of {} row{} from '{dataset_id}':\n\n",
        rows.len(),
        fmt_number(total_rows as f64, 0),
        plural(total_rows)
    );
    out.push_str(&render_table(headers, rows));
    out
}

fn render_table(headers: &[String], rows: &[Vec<Option<String>>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&headers.join(" | "));
    out.push_str(" |\n|");
    for _ in headers {
        out.push_str("---|");
    }
    for row in rows.iter().take(MAX_TABLE_ROWS) {
        out.push('\n');
        out.push('|');
        for cell in row {
            out.push(' ');
            out.push_str(&render_cell(cell.as_deref()));
            out.push_str(" |");
        }
    }
    if rows.len() > MAX_TABLE_ROWS {
        out.push_str(&format!("\n... and {} more rows", rows.len() - MAX_TABLE_ROWS));
    }
    out
}

fn render_cell(cell: Option<&str>) -> String {
    match cell {
        None => "NULL".to_string(),
        Some(value) if value.chars().count() > MAX_CELL_CHARS => {
            let truncated: String = value.chars().take(MAX_CELL_CHARS - 3).collect();
            format!("{truncated}...")
        }
        Some(value) => value.to_string(),
    }
}

fn format_data_types(datasets: &[(String, Vec<crate::execution::result::ColumnTypeInfo>)]) -> String {
    let mut out = String::new();
    for (dataset_id, columns) in datasets {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("Column types in '{dataset_id}':"));
        for info in columns {
            out.push_str(&format!("\n- {}: {}", info.column, info.kind));
        }
    }
    out
}

fn format_missing_values(
    datasets: &[crate::execution::result::DatasetMissing],
    any_missing: bool,
) -> String {
    if !any_missing {
        return "No missing values found in the loaded data.".to_string();
    }
    let mut out = String::new();
    for dataset in datasets {
        let with_missing: Vec<_> = dataset.columns.iter().filter(|c| c.missing > 0).collect();
        if with_missing.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!(
            "Missing values in '{}' ({} rows):",
            dataset.dataset_id,
            fmt_number(dataset.total_rows as f64, 0)
        ));
        for column in with_missing {
            out.push_str(&format!(
                "\n- {}: {} missing ({:.1}%)",
                column.column,
                fmt_number(column.missing as f64, 0),
                column.pct
            ));
        }
    }
    out
}

fn format_operational(
    kind: OperationalKind,
    datasets: &[crate::execution::result::DatasetShape],
) -> String {
    let topic = match kind {
        OperationalKind::Delays => "delivery delays",
        OperationalKind::Inefficiency => "load inefficiencies",
        OperationalKind::Outliers => "outliers",
        OperationalKind::Underutilization => "underutilized capacity",
        OperationalKind::Thresholds => "capacity thresholds",
        OperationalKind::OperationalCosts => "operational costs",
        OperationalKind::General => "operational patterns",
    };
    let total_rows: usize = datasets.iter().map(|d| d.rows).sum();
    format!(
        "This looks like a question about {topic}. {} dataset{} with {} total row{} {} loaded; try an aggregation, ranking, or group-by question on the relevant columns for specifics.",
        datasets.len(),
        plural(datasets.len()),
        fmt_number(total_rows as f64, 0),
        plural(total_rows),
        if datasets.len() == 1 { "is" } else { "are" }
    )
}

#[allow(clippy::too_many_arguments)]
fn format_calculation(
    calc: crate::query::intent::CalcKind,
    numerator: &str,
    denominator: &str,
    rows: &[crate::execution::result::RatioRow],
    grouped: bool,
    overall_mean: f64,
    excluded_rows: usize,
    truncated: bool,
) -> String {
    let unit = calc_unit(calc, numerator, denominator);
    let name = calc.display_name();
    let mut out = if grouped {
        let mut out = format!("{name} ('{numerator}' / '{denominator}') by group:");
        for row in rows.iter().take(MAX_TABLE_ROWS) {
            let label = row.label.as_deref().unwrap_or("(unlabelled)");
            out.push_str(&format!(
                "\n- {label}: {}",
                with_unit(&fmt_number(row.value, 4), &unit)
            ));
        }
        if rows.len() > MAX_TABLE_ROWS {
            out.push_str(&format!("\n... and {} more groups", rows.len() - MAX_TABLE_ROWS));
        }
        out
    } else {
        let mut out = format!("{name} ('{numerator}' / '{denominator}') per row:\n\n");
        let headers = vec![name.to_string()];
        let cells: Vec<Vec<Option<String>>> = rows
            .iter()
            .map(|r| vec![Some(with_unit(&fmt_number(r.value, 4), &unit))])
            .collect();
        out.push_str(&render_table(&headers, &cells));
        out.push_str(&format!(
            "\n\nAverage: {} over {} row{}.",
            with_unit(&fmt_number(overall_mean, 4), &unit),
            fmt_number(rows.len() as f64, 0),
            plural(rows.len())
        ));
        out
    };
    if excluded_rows > 0 {
        out.push_str(&format!(
            " ({excluded_rows} row{} excluded for null or zero values.)",
            plural(excluded_rows)
        ));
    }
    if truncated {
        out.push_str(" (Result truncated.)");
    }
    out
}
