//! Dataset registry: the only shared mutable state in the engine.
//!
//! Tables are stored behind `Arc` and replaced wholesale on reload, so a
//! query that has taken its snapshot keeps reading the table it started
//! with even if the dataset is cleared or replaced mid-flight.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::error::{QaError, QaResult};
use crate::storage::table::Table;

/// Per-column metadata recorded at registration time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub data_type: String,
    pub null_count: usize,
    pub distinct_count: usize,
    /// first few non-null values, for schema inspection
    pub sample_values: Vec<String>,
}

/// Schema metadata for one registered dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub dataset_id: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnMeta>,
}

/// Registry-wide statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_datasets: usize,
    pub total_rows: usize,
    pub dataset_ids: Vec<String>,
}

struct DatasetEntry {
    table: Arc<Table>,
    schema: DatasetSchema,
}

/// In-memory `{dataset_id -> table}` registry.
#[derive(Default)]
pub struct DatasetStore {
    inner: RwLock<HashMap<String, DatasetEntry>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) a dataset. Schema metadata is computed once
    /// here so later schema queries never touch the column data.
    pub fn register(&self, dataset_id: impl Into<String>, table: Table) {
        let dataset_id = dataset_id.into();
        let schema = build_schema(&dataset_id, &table);
        info!(
            dataset_id = %dataset_id,
            rows = table.row_count(),
            columns = table.column_count(),
            "registered dataset"
        );
        let mut inner = self.inner.write().unwrap();
        inner.insert(
            dataset_id,
            DatasetEntry {
                table: Arc::new(table),
                schema,
            },
        );
    }

    /// Dataset ids in sorted order (deterministic targeting).
    pub fn list_datasets(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut ids: Vec<String> = inner.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    pub fn get_table(&self, dataset_id: &str) -> QaResult<Arc<Table>> {
        let inner = self.inner.read().unwrap();
        inner
            .get(dataset_id)
            .map(|e| Arc::clone(&e.table))
            .ok_or_else(|| QaError::dataset_not_found(dataset_id))
    }

    pub fn get_schema(&self, dataset_id: &str) -> Option<DatasetSchema> {
        let inner = self.inner.read().unwrap();
        inner.get(dataset_id).map(|e| e.schema.clone())
    }

    /// Stable snapshot of every registered dataset, sorted by id.
    pub fn snapshot(&self) -> Vec<(String, Arc<Table>)> {
        let inner = self.inner.read().unwrap();
        let mut datasets: Vec<(String, Arc<Table>)> = inner
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.table)))
            .collect();
        datasets.sort_by(|a, b| a.0.cmp(&b.0));
        datasets
    }

    /// Union of column names across one dataset or all of them, sorted.
    pub fn column_names(&self, dataset_id: Option<&str>) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut names = BTreeSet::new();
        match dataset_id {
            Some(id) => {
                if let Some(entry) = inner.get(id) {
                    names.extend(entry.table.column_names());
                }
            }
            None => {
                for entry in inner.values() {
                    names.extend(entry.table.column_names());
                }
            }
        }
        names.into_iter().collect()
    }

    /// Drop one dataset, or everything when no id is given.
    pub fn clear(&self, dataset_id: Option<&str>) {
        let mut inner = self.inner.write().unwrap();
        match dataset_id {
            Some(id) => {
                inner.remove(id);
                info!(dataset_id = %id, "cleared dataset");
            }
            None => {
                inner.clear();
                info!("cleared all datasets");
            }
        }
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read().unwrap();
        let mut ids: Vec<String> = inner.keys().cloned().collect();
        ids.sort();
        StoreStats {
            total_datasets: inner.len(),
            total_rows: inner.values().map(|e| e.table.row_count()).sum(),
            dataset_ids: ids,
        }
    }
}

const SCHEMA_SAMPLE_VALUES: usize = 5;

fn build_schema(dataset_id: &str, table: &Table) -> DatasetSchema {
    let columns = table
        .columns()
        .map(|col| {
            let values = col.string_values();
            let mut distinct = BTreeSet::new();
            for v in values.iter().flatten() {
                distinct.insert(v.clone());
            }
            ColumnMeta {
                name: col.name().to_string(),
                data_type: format!("{}", col.data_type()).to_lowercase(),
                null_count: col.null_count(),
                distinct_count: distinct.len(),
                sample_values: values
                    .into_iter()
                    .flatten()
                    .take(SCHEMA_SAMPLE_VALUES)
                    .collect(),
            }
        })
        .collect();
    DatasetSchema {
        dataset_id: dataset_id.to_string(),
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};

    fn sample_table() -> Table {
        Table::try_new(vec![
            (
                "Mode".to_string(),
                Arc::new(StringArray::from(vec![Some("Truck"), Some("Rail"), None])) as ArrayRef,
            ),
            (
                "Cost".to_string(),
                Arc::new(Int64Array::from(vec![Some(100), Some(200), Some(300)])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn register_and_lookup() {
        let store = DatasetStore::new();
        store.register("shipments", sample_table());
        assert_eq!(store.list_datasets(), vec!["shipments"]);
        let table = store.get_table("shipments").unwrap();
        assert_eq!(table.row_count(), 3);
        assert!(store.get_table("missing").is_err());
    }

    #[test]
    fn snapshot_survives_clear() {
        let store = DatasetStore::new();
        store.register("shipments", sample_table());
        let snapshot = store.snapshot();
        store.clear(None);
        assert!(store.is_empty());
        // in-flight readers keep the old table
        assert_eq!(snapshot[0].1.row_count(), 3);
    }

    #[test]
    fn schema_records_null_and_distinct_counts() {
        let store = DatasetStore::new();
        store.register("shipments", sample_table());
        let schema = store.get_schema("shipments").unwrap();
        assert_eq!(schema.column_count, 2);
        let mode = &schema.columns[0];
        assert_eq!(mode.name, "Mode");
        assert_eq!(mode.null_count, 1);
        assert_eq!(mode.distinct_count, 2);
    }
}
