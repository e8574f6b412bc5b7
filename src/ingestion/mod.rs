//! Dataset ingestion: CSV files into arrow-backed tables.

pub mod csv_loader;

pub use csv_loader::{load_csv, load_csv_into};
