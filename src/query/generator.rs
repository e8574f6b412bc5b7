//! Turns a classified intent into a fully bound `QuerySpec`.
//!
//! This is the stage that touches the dataset registry: it snapshots the
//! tables a query needs, resolves every column phrase to a real column,
//! and fails fast with a structured error rather than letting a bad name
//! reach execution. The generator never invents parameters the
//! classifier did not extract.

use std::sync::Arc;

use tracing::debug;

use crate::error::{QaError, QaResult};
use crate::query::column_resolver::ColumnResolver;
use crate::query::intent::{AggKind, ClassificationResult, Intent};
use crate::query::spec::QuerySpec;
use crate::storage::{ColumnKind, ColumnRef, DatasetStore, Table};

const FALLBACK_PREVIEW_LIMIT: usize = 5;

pub struct QueryGenerator {
    resolver: ColumnResolver,
}

impl Default for QueryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryGenerator {
    pub fn new() -> Self {
        Self {
            resolver: ColumnResolver::new(),
        }
    }

    /// Bind an intent to the loaded datasets. `dataset_id` narrows
    /// single-table intents to a specific dataset; when absent the first
    /// dataset in id order is used.
    pub fn generate(
        &self,
        store: &DatasetStore,
        classification: &ClassificationResult,
        dataset_id: Option<&str>,
    ) -> QaResult<QuerySpec> {
        if store.is_empty() {
            return Err(QaError::NoDatasetLoaded);
        }

        let spec = match &classification.intent {
            Intent::ColumnNames => QuerySpec::ColumnNames {
                datasets: self.multi_target(store, dataset_id)?,
            },
            Intent::RowCount { count_columns } => QuerySpec::RowCount {
                datasets: self.multi_target(store, dataset_id)?,
                count_columns: *count_columns,
            },
            Intent::DataTypes => QuerySpec::DataTypes {
                datasets: self.multi_target(store, dataset_id)?,
            },
            Intent::MissingValues => QuerySpec::MissingValues {
                datasets: self.multi_target(store, dataset_id)?,
            },
            Intent::Operational { kind } => QuerySpec::Operational {
                kind: *kind,
                datasets: self.multi_target(store, dataset_id)?,
            },
            Intent::Aggregation { agg, column } => {
                let (id, table) = self.target(store, dataset_id)?;
                match column {
                    Some(phrase) => {
                        let column = self.bind(&id, phrase, &table)?;
                        QuerySpec::Aggregation {
                            agg: *agg,
                            column,
                            table,
                        }
                    }
                    // a bare count with no target column is a row count
                    None if *agg == AggKind::Count => QuerySpec::RowCount {
                        datasets: vec![(id, table)],
                        count_columns: false,
                    },
                    None => {
                        return Err(QaError::invalid_spec(
                            "could not determine which column to aggregate",
                        ))
                    }
                }
            }
            Intent::GroupBy {
                agg,
                agg_column,
                group_column,
            } => {
                let (id, table) = self.target(store, dataset_id)?;
                let agg_phrase = agg_column.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine which column to aggregate")
                })?;
                let group_phrase = group_column.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine which column to group by")
                })?;
                // both columns come from the same table so the grouped
                // rows line up
                let agg_column = self.bind(&id, agg_phrase, &table)?;
                let group_column = self.bind(&id, group_phrase, &table)?;
                QuerySpec::GroupBy {
                    agg: *agg,
                    agg_column,
                    group_column,
                    table,
                }
            }
            Intent::ListUnique { column } => {
                let (id, table) = self.target(store, dataset_id)?;
                let phrase = column.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine which values to list")
                })?;
                let column = self.bind(&id, phrase, &table)?;
                QuerySpec::ListUnique { column, table }
            }
            Intent::Ranking {
                column,
                order,
                limit,
            } => {
                let (id, table) = self.target(store, dataset_id)?;
                let phrase = column.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine which column to rank by")
                })?;
                let column = self.bind(&id, phrase, &table)?;
                QuerySpec::Ranking {
                    column,
                    table,
                    order: *order,
                    limit: *limit,
                }
            }
            Intent::Preview { limit } => {
                let (id, table) = self.target(store, dataset_id)?;
                QuerySpec::Preview {
                    dataset_id: id,
                    table,
                    limit: *limit,
                }
            }
            Intent::TimeRange { column } => {
                let (id, table) = self.target(store, dataset_id)?;
                let column = match column {
                    Some(phrase) => self.bind(&id, phrase, &table)?,
                    None => first_temporal_column(&id, &table).ok_or_else(|| {
                        QaError::invalid_spec("no date column found in the dataset")
                    })?,
                };
                QuerySpec::TimeRange { column, table }
            }
            Intent::Calculation {
                calc,
                numerator,
                denominator,
                group_by,
            } => {
                let (id, table) = self.target(store, dataset_id)?;
                let num_phrase = numerator.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine the numerator column")
                })?;
                let den_phrase = denominator.as_deref().ok_or_else(|| {
                    QaError::invalid_spec("could not determine the denominator column")
                })?;
                let numerator = self.bind(&id, num_phrase, &table)?;
                let denominator = self.bind(&id, den_phrase, &table)?;
                let group_by = match group_by {
                    Some(phrase) => Some(self.bind(&id, phrase, &table)?),
                    None => None,
                };
                QuerySpec::Calculation {
                    calc: *calc,
                    numerator,
                    denominator,
                    group_by,
                    table,
                }
            }
            Intent::Filter | Intent::General => {
                let (id, table) = self.target(store, dataset_id)?;
                QuerySpec::Fallback {
                    dataset_id: id,
                    table,
                    limit: FALLBACK_PREVIEW_LIMIT,
                }
            }
        };

        debug!(query = spec.name(), "generated query spec");
        Ok(spec)
    }

    /// Datasets a cross-dataset query runs over: the requested one, or
    /// every registered one.
    fn multi_target(
        &self,
        store: &DatasetStore,
        dataset_id: Option<&str>,
    ) -> QaResult<Vec<(String, Arc<Table>)>> {
        match dataset_id {
            Some(id) => Ok(vec![(id.to_string(), store.get_table(id)?)]),
            None => Ok(store.snapshot()),
        }
    }

    /// Pick the dataset a single-table query runs over.
    fn target(
        &self,
        store: &DatasetStore,
        dataset_id: Option<&str>,
    ) -> QaResult<(String, Arc<Table>)> {
        match dataset_id {
            Some(id) => Ok((id.to_string(), store.get_table(id)?)),
            None => store
                .snapshot()
                .into_iter()
                .next()
                .ok_or(QaError::NoDatasetLoaded),
        }
    }

    fn bind(&self, dataset_id: &str, phrase: &str, table: &Table) -> QaResult<ColumnRef> {
        let name = self.resolver.resolve(phrase, table)?;
        Ok(ColumnRef {
            dataset_id: dataset_id.to_string(),
            column_name: name,
        })
    }
}

fn first_temporal_column(dataset_id: &str, table: &Table) -> Option<ColumnRef> {
    table
        .columns()
        .find(|c| c.kind() == ColumnKind::Temporal)
        .map(|c| ColumnRef {
            dataset_id: dataset_id.to_string(),
            column_name: c.name().to_string(),
        })
}
