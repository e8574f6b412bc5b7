//! # Tabular Q&A Engine
//!
//! A deterministic query-driven analytics engine that answers
//! natural-language questions about loaded CSV datasets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabular_qa_engine::ingestion::load_csv_into;
//! use tabular_qa_engine::pipeline::QueryPipeline;
//! use tabular_qa_engine::storage::DatasetStore;
//!
//! let store = Arc::new(DatasetStore::new());
//! load_csv_into(&store, "consignments.csv", None).unwrap();
//!
//! let pipeline = QueryPipeline::new(store);
//! let response = pipeline.process("What is the total transportation cost?", None);
//! println!("{}", response.answer);
//! ```
//!
//! ## How a question is answered
//!
//! Every question runs the same four stages, strictly in order:
//!
//! 1. **Classification** - rule-based pattern detectors map the text to
//!    an intent with a confidence, optionally blended with similarity
//!    scores when a scorer is attached.
//! 2. **Generation** - the intent's column phrases are resolved against
//!    real columns (exact, then substring, then alias table) into a
//!    fully bound query spec; unresolvable phrases fail here.
//! 3. **Execution** - the bound query runs read-only over a table snapshot
//!    with null-safe numeric coercion and bounded output sizes.
//! 4. **Formatting** - fixed templates render the typed result, with a
//!    column-to-unit lookup for numbers.
//!
//! Answers are reproducible: the same question over the same data always
//! produces the same text.

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod query;
pub mod response;
pub mod storage;

pub use error::{QaError, QaResult};
pub use pipeline::{PipelineResponse, QueryPipeline};
pub use storage::DatasetStore;
