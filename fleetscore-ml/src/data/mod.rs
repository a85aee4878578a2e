//! Data loading: raw CSV batches and typed numeric tables.

pub mod schema;
pub mod source;

pub use schema::{FeatureTable, RecordView, TableSchema};
pub use source::{CsvSource, DataBatch, DataSource, DataSourceInfo};
