//! Read-only evaluation of bound query specs.
//!
//! Every operation works over the `Arc<Table>` snapshot captured in the
//! spec; nothing here touches the registry, so a concurrent dataset
//! reload cannot change an answer mid-query. Numeric and temporal
//! coercion treat unparsable cells as null and count them, and oversized
//! outputs are truncated with a recorded more-available flag rather than
//! failing.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ExecutorConfig;
use crate::error::{QaError, QaResult};
use crate::execution::result::{
    ColumnMissing, ColumnTypeInfo, DatasetColumns, DatasetMissing, DatasetShape, GroupValue,
    QueryOutput, RatioRow,
};
use crate::query::intent::AggKind;
use crate::query::spec::QuerySpec;
use crate::storage::{ColumnView, Table};

pub struct QueryExecutor {
    config: ExecutorConfig,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl QueryExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, spec: &QuerySpec) -> QaResult<QueryOutput> {
        debug!(query = spec.name(), "executing query");
        match spec {
            QuerySpec::ColumnNames { datasets } => Ok(QueryOutput::ColumnNames {
                datasets: datasets
                    .iter()
                    .map(|(id, table)| {
                        let mut columns = table.column_names();
                        columns.sort();
                        DatasetColumns {
                            dataset_id: id.clone(),
                            columns,
                        }
                    })
                    .collect(),
            }),
            QuerySpec::RowCount {
                datasets,
                count_columns,
            } => {
                let shapes: Vec<DatasetShape> = datasets
                    .iter()
                    .map(|(id, table)| DatasetShape {
                        dataset_id: id.clone(),
                        rows: table.row_count(),
                        columns: table.column_count(),
                    })
                    .collect();
                let total_rows = shapes.iter().map(|s| s.rows).sum();
                Ok(QueryOutput::RowCount {
                    datasets: shapes,
                    total_rows,
                    count_columns: *count_columns,
                })
            }
            QuerySpec::Aggregation { agg, column, table } => {
                let view = column_view(table, &column.column_name)?;
                let (values, coerced_nulls) = view.numeric_values();
                let non_null: Vec<f64> = values.into_iter().flatten().collect();
                if non_null.is_empty() {
                    return Err(QaError::no_numeric_data(&column.column_name));
                }
                let value = reduce(*agg, &non_null);
                Ok(QueryOutput::Aggregation {
                    agg: *agg,
                    column: column.column_name.clone(),
                    value,
                    non_null: non_null.len(),
                    coerced_nulls,
                })
            }
            QuerySpec::GroupBy {
                agg,
                agg_column,
                group_column,
                table,
            } => self.group_by(*agg, table, &agg_column.column_name, &group_column.column_name),
            QuerySpec::ListUnique { column, table } => {
                let view = column_view(table, &column.column_name)?;
                let mut distinct = std::collections::BTreeSet::new();
                for idx in 0..table.row_count() {
                    if let Some(value) = view.value_at(idx) {
                        distinct.insert(value);
                    }
                }
                let distinct_total = distinct.len();
                let values: Vec<String> = distinct
                    .into_iter()
                    .take(self.config.max_result_rows)
                    .collect();
                let truncated = values.len() < distinct_total;
                Ok(QueryOutput::ListUnique {
                    column: column.column_name.clone(),
                    values,
                    distinct_total,
                    truncated,
                })
            }
            QuerySpec::Ranking {
                column,
                table,
                order,
                limit,
            } => self.ranking(table, &column.column_name, *order, *limit),
            QuerySpec::Preview {
                dataset_id,
                table,
                limit,
            }
            | QuerySpec::Fallback {
                dataset_id,
                table,
                limit,
            } => Ok(self.preview(dataset_id, table, *limit)),
            QuerySpec::TimeRange { column, table } => {
                let view = column_view(table, &column.column_name)?;
                let (values, coerced_nulls) = view.temporal_values();
                let valid: Vec<_> = values.into_iter().flatten().collect();
                let (start, end) = match (valid.iter().min(), valid.iter().max()) {
                    (Some(min), Some(max)) => (*min, *max),
                    _ => return Err(QaError::no_valid_dates(&column.column_name)),
                };
                let days = (end.date() - start.date()).num_days() + 1;
                Ok(QueryOutput::TimeRange {
                    column: column.column_name.clone(),
                    start: format_datetime(start),
                    end: format_datetime(end),
                    days,
                    valid: valid.len(),
                    coerced_nulls,
                })
            }
            QuerySpec::DataTypes { datasets } => Ok(QueryOutput::DataTypes {
                datasets: datasets
                    .iter()
                    .map(|(id, table)| {
                        let columns = table
                            .columns()
                            .map(|c| ColumnTypeInfo {
                                column: c.name().to_string(),
                                kind: c.kind().as_str().to_string(),
                            })
                            .collect();
                        (id.clone(), columns)
                    })
                    .collect(),
            }),
            QuerySpec::MissingValues { datasets } => {
                let per_dataset: Vec<DatasetMissing> = datasets
                    .iter()
                    .map(|(id, table)| {
                        let total_rows = table.row_count();
                        let columns = table
                            .columns()
                            .map(|c| {
                                let missing = c.null_count();
                                let pct = if total_rows == 0 {
                                    0.0
                                } else {
                                    missing as f64 * 100.0 / total_rows as f64
                                };
                                ColumnMissing {
                                    column: c.name().to_string(),
                                    missing,
                                    pct,
                                }
                            })
                            .collect();
                        DatasetMissing {
                            dataset_id: id.clone(),
                            total_rows,
                            columns,
                        }
                    })
                    .collect();
                let any_missing = per_dataset
                    .iter()
                    .any(|d| d.columns.iter().any(|c| c.missing > 0));
                Ok(QueryOutput::MissingValues {
                    datasets: per_dataset,
                    any_missing,
                })
            }
            QuerySpec::Operational { kind, datasets } => Ok(QueryOutput::Operational {
                kind: *kind,
                datasets: datasets
                    .iter()
                    .map(|(id, table)| DatasetShape {
                        dataset_id: id.clone(),
                        rows: table.row_count(),
                        columns: table.column_count(),
                    })
                    .collect(),
            }),
            QuerySpec::Calculation {
                calc,
                numerator,
                denominator,
                group_by,
                table,
            } => self.calculation(
                *calc,
                table,
                &numerator.column_name,
                &denominator.column_name,
                group_by.as_ref().map(|c| c.column_name.as_str()),
            ),
        }
    }

    fn group_by(
        &self,
        agg: AggKind,
        table: &Table,
        agg_column: &str,
        group_column: &str,
    ) -> QaResult<QueryOutput> {
        let agg_view = column_view(table, agg_column)?;
        let group_view = column_view(table, group_column)?;
        let (values, coerced_nulls) = agg_view.numeric_values();

        struct Acc {
            sum: f64,
            count: usize,
            max: f64,
            min: f64,
        }
        let mut buckets: BTreeMap<String, Acc> = BTreeMap::new();
        let mut null_keys_excluded = 0;

        for idx in 0..table.row_count() {
            let Some(key) = group_view.value_at(idx) else {
                null_keys_excluded += 1;
                continue;
            };
            let acc = buckets.entry(key).or_insert(Acc {
                sum: 0.0,
                count: 0,
                max: f64::NEG_INFINITY,
                min: f64::INFINITY,
            });
            if let Some(v) = values.get(idx).copied().flatten() {
                acc.sum += v;
                acc.count += 1;
                acc.max = acc.max.max(v);
                acc.min = acc.min.min(v);
            }
        }

        // groups with no numeric cells still mean something for sum and
        // count (zero), but a mean, max or min of nothing is dropped
        let mut omitted_groups = 0;
        let mut groups: Vec<GroupValue> = Vec::with_capacity(buckets.len());
        for (key, acc) in buckets {
            let value = match agg {
                AggKind::Sum => acc.sum,
                AggKind::Count => acc.count as f64,
                AggKind::Mean | AggKind::Max | AggKind::Min if acc.count == 0 => {
                    omitted_groups += 1;
                    continue;
                }
                AggKind::Mean => acc.sum / acc.count as f64,
                AggKind::Max => acc.max,
                AggKind::Min => acc.min,
            };
            groups.push(GroupValue {
                key,
                value,
                count: acc.count,
            });
        }

        groups.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });

        Ok(QueryOutput::GroupBy {
            agg,
            agg_column: agg_column.to_string(),
            group_column: group_column.to_string(),
            groups,
            omitted_groups,
            null_keys_excluded,
            coerced_nulls,
        })
    }

    fn ranking(
        &self,
        table: &Table,
        column: &str,
        order: crate::query::intent::SortOrder,
        limit: usize,
    ) -> QaResult<QueryOutput> {
        use crate::query::intent::SortOrder;

        let view = column_view(table, column)?;
        let (values, _) = view.numeric_values();

        // null cells cannot be ranked; they are excluded the same way
        // aggregation excludes them
        let mut ranked: Vec<(usize, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.map(|v| (idx, v)))
            .collect();
        ranked.sort_by(|a, b| {
            let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
            match order {
                SortOrder::Desc => ord.reverse(),
                SortOrder::Asc => ord,
            }
        });

        let take = limit.min(self.config.max_result_rows);
        let more_available = ranked.len() > take;
        let headers = table.column_names();
        let mut rows = Vec::new();
        let mut row_values = Vec::new();
        for (idx, value) in ranked.into_iter().take(take) {
            rows.push(
                (0..table.column_count())
                    .map(|c| table.column_at(c).value_at(idx))
                    .collect(),
            );
            row_values.push(value);
        }

        Ok(QueryOutput::Ranking {
            column: column.to_string(),
            order,
            headers,
            rows,
            values: row_values,
            more_available,
        })
    }

    fn preview(&self, dataset_id: &str, table: &Table, limit: usize) -> QueryOutput {
        let take = limit
            .min(self.config.max_preview_rows)
            .min(table.row_count());
        let headers = table.column_names();
        let rows = (0..take)
            .map(|idx| {
                (0..table.column_count())
                    .map(|c| table.column_at(c).value_at(idx))
                    .collect()
            })
            .collect();
        QueryOutput::Preview {
            dataset_id: dataset_id.to_string(),
            headers,
            rows,
            total_rows: table.row_count(),
            more_available: table.row_count() > take,
        }
    }

    fn calculation(
        &self,
        calc: crate::query::intent::CalcKind,
        table: &Table,
        numerator: &str,
        denominator: &str,
        group_by: Option<&str>,
    ) -> QaResult<QueryOutput> {
        let num_view = column_view(table, numerator)?;
        let den_view = column_view(table, denominator)?;
        let (num_values, _) = num_view.numeric_values();
        let (den_values, _) = den_view.numeric_values();

        // a null operand or zero denominator drops the row, it never
        // poisons the rest of the result
        let mut ratios: Vec<(usize, f64)> = Vec::new();
        let mut excluded_rows = 0;
        for idx in 0..table.row_count() {
            match (
                num_values.get(idx).copied().flatten(),
                den_values.get(idx).copied().flatten(),
            ) {
                (Some(n), Some(d)) if d != 0.0 => ratios.push((idx, n / d)),
                _ => excluded_rows += 1,
            }
        }

        let overall_mean = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().map(|(_, r)| r).sum::<f64>() / ratios.len() as f64
        };

        let (rows, grouped, truncated) = match group_by {
            Some(group_column) => {
                let group_view = column_view(table, group_column)?;
                let mut buckets: BTreeMap<String, (f64, usize)> = BTreeMap::new();
                for (idx, ratio) in &ratios {
                    if let Some(key) = group_view.value_at(*idx) {
                        let entry = buckets.entry(key).or_insert((0.0, 0));
                        entry.0 += ratio;
                        entry.1 += 1;
                    }
                }
                let mut rows: Vec<RatioRow> = buckets
                    .into_iter()
                    .map(|(key, (sum, count))| RatioRow {
                        label: Some(key),
                        value: sum / count as f64,
                    })
                    .collect();
                rows.sort_by(|a, b| {
                    b.value
                        .partial_cmp(&a.value)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let total = rows.len();
                rows.truncate(self.config.max_result_rows);
                let truncated = rows.len() < total;
                (rows, true, truncated)
            }
            None => {
                let total = ratios.len();
                let rows: Vec<RatioRow> = ratios
                    .into_iter()
                    .take(self.config.max_result_rows)
                    .map(|(_, value)| RatioRow { label: None, value })
                    .collect();
                let truncated = rows.len() < total;
                (rows, false, truncated)
            }
        };

        Ok(QueryOutput::Calculation {
            calc,
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            rows,
            grouped,
            overall_mean,
            excluded_rows,
            truncated,
        })
    }
}

fn column_view<'a>(table: &'a Table, name: &str) -> QaResult<ColumnView<'a>> {
    table
        .column(name)
        .ok_or_else(|| QaError::column_not_found(name, table.column_names()))
}

fn reduce(agg: AggKind, values: &[f64]) -> f64 {
    match agg {
        AggKind::Sum => values.iter().sum(),
        AggKind::Mean => values.iter().sum::<f64>() / values.len() as f64,
        AggKind::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggKind::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggKind::Count => values.len() as f64,
    }
}

fn format_datetime(dt: chrono::NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::intent::{CalcKind, SortOrder};
    use crate::storage::{ColumnRef, Table};
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn sample_table() -> Arc<Table> {
        let cost: ArrayRef = Arc::new(Float64Array::from(vec![
            Some(100.0),
            Some(200.0),
            None,
        ]));
        let cases: ArrayRef = Arc::new(Int64Array::from(vec![2, 4, 5]));
        let mode: ArrayRef = Arc::new(StringArray::from(vec!["Truck", "Truck", "Rail"]));
        Arc::new(
            Table::try_new(vec![
                ("Cost".to_string(), cost),
                ("Cases".to_string(), cases),
                ("Mode".to_string(), mode),
            ])
            .unwrap(),
        )
    }

    fn col(name: &str) -> ColumnRef {
        ColumnRef {
            dataset_id: "d".to_string(),
            column_name: name.to_string(),
        }
    }

    fn executor() -> QueryExecutor {
        QueryExecutor::default()
    }

    #[test]
    fn sum_skips_nulls() {
        let out = executor()
            .execute(&QuerySpec::Aggregation {
                agg: AggKind::Sum,
                column: col("Cost"),
                table: sample_table(),
            })
            .unwrap();
        match out {
            QueryOutput::Aggregation {
                value, non_null, ..
            } => {
                assert_eq!(value, 300.0);
                assert_eq!(non_null, 2);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn grouped_sums_partition_the_total() {
        let out = executor()
            .execute(&QuerySpec::GroupBy {
                agg: AggKind::Sum,
                agg_column: col("Cost"),
                group_column: col("Mode"),
                table: sample_table(),
            })
            .unwrap();
        match out {
            QueryOutput::GroupBy { groups, .. } => {
                let total: f64 = groups.iter().map(|g| g.value).sum();
                assert_eq!(total, 300.0);
                // all-null Rail group keeps a zero sum
                let rail = groups.iter().find(|g| g.key == "Rail").unwrap();
                assert_eq!(rail.value, 0.0);
                assert_eq!(rail.count, 0);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn all_null_mean_group_is_omitted() {
        let out = executor()
            .execute(&QuerySpec::GroupBy {
                agg: AggKind::Mean,
                agg_column: col("Cost"),
                group_column: col("Mode"),
                table: sample_table(),
            })
            .unwrap();
        match out {
            QueryOutput::GroupBy {
                groups,
                omitted_groups,
                ..
            } => {
                assert_eq!(omitted_groups, 1);
                assert!(groups.iter().all(|g| g.key != "Rail"));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn ranking_limit_one_matches_max_and_min() {
        let table = sample_table();
        for (order, expected) in [(SortOrder::Desc, 200.0), (SortOrder::Asc, 100.0)] {
            let out = executor()
                .execute(&QuerySpec::Ranking {
                    column: col("Cost"),
                    table: Arc::clone(&table),
                    order,
                    limit: 1,
                })
                .unwrap();
            match out {
                QueryOutput::Ranking { values, .. } => assert_eq!(values, vec![expected]),
                other => panic!("unexpected output: {other:?}"),
            }
        }
    }

    #[test]
    fn ratio_excludes_null_numerators() {
        let out = executor()
            .execute(&QuerySpec::Calculation {
                calc: CalcKind::PerCase,
                numerator: col("Cost"),
                denominator: col("Cases"),
                group_by: None,
                table: sample_table(),
            })
            .unwrap();
        match out {
            QueryOutput::Calculation {
                rows,
                excluded_rows,
                overall_mean,
                ..
            } => {
                let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
                assert_eq!(values, vec![50.0, 50.0]);
                assert_eq!(excluded_rows, 1);
                assert_eq!(overall_mean, 50.0);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn all_null_aggregation_is_an_error() {
        let nulls: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), Some("b")]));
        let table = Arc::new(Table::try_new(vec![("Label".to_string(), nulls)]).unwrap());
        let err = executor()
            .execute(&QuerySpec::Aggregation {
                agg: AggKind::Sum,
                column: col("Label"),
                table,
            })
            .unwrap_err();
        assert!(matches!(err, QaError::NoNumericData { .. }));
    }

    #[test]
    fn preview_caps_at_fifty_rows() {
        let values: ArrayRef = Arc::new(Int64Array::from((0..120).collect::<Vec<i64>>()));
        let table = Arc::new(Table::try_new(vec![("N".to_string(), values)]).unwrap());
        let out = executor()
            .execute(&QuerySpec::Preview {
                dataset_id: "d".to_string(),
                table,
                limit: 200,
            })
            .unwrap();
        match out {
            QueryOutput::Preview {
                rows,
                total_rows,
                more_available,
                ..
            } => {
                assert_eq!(rows.len(), 50);
                assert_eq!(total_rows, 120);
                assert!(more_available);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn list_unique_is_sorted_and_deduplicated() {
        let table = sample_table();
        let out = executor()
            .execute(&QuerySpec::ListUnique {
                column: col("Mode"),
                table,
            })
            .unwrap();
        match out {
            QueryOutput::ListUnique {
                values,
                distinct_total,
                truncated,
                ..
            } => {
                assert_eq!(values, vec!["Rail".to_string(), "Truck".to_string()]);
                assert_eq!(distinct_total, 2);
                assert!(!truncated);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }
}
