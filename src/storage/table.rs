//! Immutable in-memory table over arrow columns.
//!
//! A `Table` is frozen at load time: queries only ever read it, so one
//! `Arc<Table>` snapshot can serve any number of concurrent queries while
//! the registry swaps in replacements wholesale.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{QaError, QaResult};

/// A fully resolved column reference: concrete dataset and column name,
/// never a free-text phrase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub dataset_id: String,
    pub column_name: String,
}

/// Broad column classification used by data-type answers and unit lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Temporal => "temporal",
        }
    }
}

/// Ordered set of named, typed columns with equal row counts.
#[derive(Clone, Debug)]
pub struct Table {
    schema: SchemaRef,
    columns: Vec<ArrayRef>,
    row_count: usize,
}

impl Table {
    /// Build a table from `(name, array)` pairs. All arrays must share the
    /// same length.
    pub fn try_new(columns: Vec<(String, ArrayRef)>) -> QaResult<Self> {
        if columns.is_empty() {
            return Err(QaError::ingestion("table has no columns"));
        }
        let row_count = columns[0].1.len();
        for (name, array) in &columns {
            if array.len() != row_count {
                return Err(QaError::ingestion(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    array.len(),
                    row_count
                )));
            }
        }
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(name.clone(), array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, a)| a).collect();
        Ok(Self {
            schema: Arc::new(Schema::new(fields)),
            columns: arrays,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Case-insensitive column index lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.schema
            .fields()
            .iter()
            .position(|f| f.name().trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn column(&self, name: &str) -> Option<ColumnView<'_>> {
        self.index_of(name).map(|idx| self.column_at(idx))
    }

    pub fn column_at(&self, idx: usize) -> ColumnView<'_> {
        ColumnView {
            name: self.schema.field(idx).name(),
            array: &self.columns[idx],
        }
    }

    /// Iterate columns in schema order.
    pub fn columns(&self) -> impl Iterator<Item = ColumnView<'_>> {
        (0..self.columns.len()).map(move |idx| self.column_at(idx))
    }
}

/// Typed accessor over one column. Coercion never fails: cells that cannot
/// be read as the requested kind come back as nulls, with the count of
/// non-null cells lost to coercion reported alongside.
#[derive(Clone, Copy)]
pub struct ColumnView<'a> {
    name: &'a str,
    array: &'a ArrayRef,
}

impl<'a> ColumnView<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    pub fn data_type(&self) -> &DataType {
        self.array.data_type()
    }

    /// Declared-or-inferred kind. Utf8 columns whose non-null values all
    /// parse as dates are reported temporal; a short sample is enough.
    pub fn kind(&self) -> ColumnKind {
        match self.array.data_type() {
            DataType::Int64 | DataType::Float64 => ColumnKind::Numeric,
            DataType::Utf8 => {
                let sample: Vec<String> = self
                    .string_values()
                    .into_iter()
                    .flatten()
                    .take(20)
                    .collect();
                if !sample.is_empty() && sample.iter().all(|v| parse_datetime(v).is_some()) {
                    ColumnKind::Temporal
                } else {
                    ColumnKind::Text
                }
            }
            _ => ColumnKind::Text,
        }
    }

    /// Coerce to f64 values. Returns `(values, coerced_nulls)` where
    /// `coerced_nulls` counts non-null cells that failed to parse.
    pub fn numeric_values(&self) -> (Vec<Option<f64>>, usize) {
        let mut coerced = 0usize;
        if let Some(arr) = self.array.as_any().downcast_ref::<Int64Array>() {
            let values = (0..arr.len())
                .map(|i| (!arr.is_null(i)).then(|| arr.value(i) as f64))
                .collect();
            return (values, 0);
        }
        if let Some(arr) = self.array.as_any().downcast_ref::<Float64Array>() {
            let values = (0..arr.len())
                .map(|i| (!arr.is_null(i)).then(|| arr.value(i)))
                .collect();
            return (values, 0);
        }
        if let Some(arr) = self.array.as_any().downcast_ref::<StringArray>() {
            let values = (0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        None
                    } else {
                        match parse_numeric(arr.value(i)) {
                            Some(v) => Some(v),
                            None => {
                                coerced += 1;
                                None
                            }
                        }
                    }
                })
                .collect();
            return (values, coerced);
        }
        // Unsupported array type: everything coerces to null
        (vec![None; self.array.len()], self.array.len() - self.null_count())
    }

    /// All values rendered as strings, nulls preserved.
    pub fn string_values(&self) -> Vec<Option<String>> {
        (0..self.array.len()).map(|i| self.value_at(i)).collect()
    }

    /// Coerce to timestamps. Returns `(values, coerced_nulls)`.
    pub fn temporal_values(&self) -> (Vec<Option<NaiveDateTime>>, usize) {
        let mut coerced = 0usize;
        let values = (0..self.array.len())
            .map(|i| match self.value_at(i) {
                None => None,
                Some(raw) => match parse_datetime(&raw) {
                    Some(dt) => Some(dt),
                    None => {
                        coerced += 1;
                        None
                    }
                },
            })
            .collect();
        (values, coerced)
    }

    /// One cell rendered as a string, `None` for null.
    pub fn value_at(&self, idx: usize) -> Option<String> {
        if self.array.is_null(idx) {
            return None;
        }
        if let Some(arr) = self.array.as_any().downcast_ref::<Int64Array>() {
            return Some(arr.value(idx).to_string());
        }
        if let Some(arr) = self.array.as_any().downcast_ref::<Float64Array>() {
            return Some(arr.value(idx).to_string());
        }
        if let Some(arr) = self.array.as_any().downcast_ref::<StringArray>() {
            return Some(arr.value(idx).to_string());
        }
        None
    }
}

/// Lenient numeric parse: trims whitespace and tolerates thousands
/// separators ("1,234.5") and currency-free signs.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    let stripped: String = trimmed.chars().filter(|c| *c != ',').collect();
    stripped.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient timestamp parse covering the date layouts spreadsheets commonly
/// carry. Date-only values map to midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d-%m-%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d-%m-%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%d-%b-%Y",
        "%d %b %Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_col(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values)) as ArrayRef
    }

    #[test]
    fn numeric_coercion_counts_unparsable_cells() {
        let table = Table::try_new(vec![(
            "Cost".to_string(),
            string_col(vec![Some("100"), Some("n/a"), None, Some("2,500.5")]),
        )])
        .unwrap();
        let col = table.column("cost").unwrap();
        let (values, coerced) = col.numeric_values();
        assert_eq!(values, vec![Some(100.0), None, None, Some(2500.5)]);
        assert_eq!(coerced, 1);
    }

    #[test]
    fn utf8_date_column_reports_temporal_kind() {
        let table = Table::try_new(vec![(
            "Date of Dispatch".to_string(),
            string_col(vec![Some("2024-01-05"), Some("2024-02-10"), None]),
        )])
        .unwrap();
        assert_eq!(
            table.column("Date of Dispatch").unwrap().kind(),
            ColumnKind::Temporal
        );
    }

    #[test]
    fn mismatched_column_lengths_are_rejected() {
        let result = Table::try_new(vec![
            ("a".to_string(), string_col(vec![Some("x")])),
            ("b".to_string(), string_col(vec![Some("y"), Some("z")])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_datetime_accepts_common_layouts() {
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("01/03/2024").is_some());
        assert!(parse_datetime("2024-03-01 08:30:00").is_some());
        assert!(parse_datetime("not a date").is_none());
    }
}
