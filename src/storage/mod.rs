//! Columnar storage: immutable arrow-backed tables and the dataset registry.

pub mod registry;
pub mod table;

pub use registry::{DatasetSchema, DatasetStore, StoreStats};
pub use table::{ColumnKind, ColumnRef, ColumnView, Table};
