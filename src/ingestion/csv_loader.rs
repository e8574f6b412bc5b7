//! CSV ingestion with per-column type inference.
//!
//! A column is Int64 if every non-empty cell parses as an integer, Float64
//! if every non-empty cell parses as a number, Utf8 otherwise. Empty cells
//! become nulls in all three cases, so downstream null handling sees loads
//! and hand-built tables identically.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{QaError, QaResult};
use crate::storage::{DatasetStore, Table};

/// Load a CSV file into a `Table`. The dataset id defaults to the file
/// stem when not supplied.
pub fn load_csv(path: &str, dataset_id: Option<&str>) -> QaResult<(String, Table)> {
    let path_obj = Path::new(path);
    let id = match dataset_id {
        Some(id) => id.to_string(),
        None => path_obj
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string()),
    };

    let file = File::open(path_obj)
        .map_err(|e| QaError::ingestion_with_path(e.to_string(), path))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| QaError::ingestion_with_path(e.to_string(), path))?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| QaError::ingestion_with_path(e.to_string(), path))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    if headers.is_empty() {
        return Err(QaError::ingestion_with_path("CSV has no header row", path));
    }

    let mut columns: Vec<(String, ArrayRef)> = Vec::with_capacity(headers.len());
    for (col_idx, name) in headers.iter().enumerate() {
        let cells: Vec<Option<&str>> = rows
            .iter()
            .map(|row| {
                row.get(col_idx)
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
            })
            .collect();
        columns.push((name.clone(), infer_column(&cells)));
    }

    let table = Table::try_new(columns)?;
    info!(
        dataset_id = %id,
        rows = table.row_count(),
        columns = table.column_count(),
        path = %path,
        "loaded CSV"
    );
    Ok((id, table))
}

/// Load a CSV file and register it in the store. Returns the dataset id.
pub fn load_csv_into(
    store: &DatasetStore,
    path: &str,
    dataset_id: Option<&str>,
) -> QaResult<String> {
    let (id, table) = load_csv(path, dataset_id)?;
    store.register(id.clone(), table);
    Ok(id)
}

/// Pick the narrowest arrow type that fits every non-empty cell.
fn infer_column(cells: &[Option<&str>]) -> ArrayRef {
    let mut is_int = true;
    let mut is_float = true;
    let mut has_value = false;
    for cell in cells.iter().flatten() {
        has_value = true;
        if cell.parse::<i64>().is_err() {
            is_int = false;
        }
        if cell.parse::<f64>().is_err() {
            is_float = false;
        }
        if !is_int && !is_float {
            break;
        }
    }

    if has_value && is_int {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| c.and_then(|v| v.parse::<i64>().ok()))
            .collect();
        Arc::new(Int64Array::from(values)) as ArrayRef
    } else if has_value && is_float {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| c.and_then(|v| v.parse::<f64>().ok()))
            .collect();
        Arc::new(Float64Array::from(values)) as ArrayRef
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| c.map(|v| v.to_string()))
            .collect();
        Arc::new(StringArray::from(values)) as ArrayRef
    }
}
