//! Query front end: intent model, classification, column resolution,
//! and generation of executable query specs.

pub mod classifier;
pub mod column_resolver;
pub mod generator;
pub mod intent;
pub mod similarity;
pub mod spec;

pub use classifier::IntentClassifier;
pub use column_resolver::ColumnResolver;
pub use generator::QueryGenerator;
pub use intent::{
    AggKind, CalcKind, ClassificationResult, Intent, IntentKind, OperationalKind, SortOrder,
};
pub use similarity::{LexicalScorer, SimilarityScorer};
pub use spec::QuerySpec;
