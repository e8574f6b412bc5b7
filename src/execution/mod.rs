//! Query execution: read-only evaluation of bound specs into typed results.

pub mod executor;
pub mod result;

pub use executor::QueryExecutor;
pub use result::{
    ColumnMissing, ColumnTypeInfo, DatasetColumns, DatasetMissing, DatasetShape, GroupValue,
    QueryOutput, RatioRow,
};
