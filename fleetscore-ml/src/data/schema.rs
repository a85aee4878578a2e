//! Typed numeric view over a raw batch.

use crate::data::source::DataBatch;
use crate::error::MlError;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Identifier column plus the numeric columns a pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub id_column: String,
    pub numeric_columns: Vec<String>,
}

impl TableSchema {
    /// Build a schema from several column lists, dropping duplicates but keeping first-seen order.
    pub fn new<'a>(
        id_column: impl Into<String>,
        column_lists: impl IntoIterator<Item = &'a [String]>,
    ) -> Self {
        let mut numeric_columns: Vec<String> = Vec::new();
        for list in column_lists {
            for name in list {
                if !numeric_columns.contains(name) {
                    numeric_columns.push(name.clone());
                }
            }
        }
        Self {
            id_column: id_column.into(),
            numeric_columns,
        }
    }
}

/// Entity identifiers alongside a dense `f64` matrix, one row per input record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub ids: Vec<String>,
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureTable {
    /// Extract the schema's columns from a raw batch. Every numeric cell must parse.
    pub fn from_batch(batch: &DataBatch, schema: &TableSchema) -> Result<Self, MlError> {
        let ids = batch.text_column(&schema.id_column)?;
        let mut values = Array2::<f64>::zeros((batch.row_count(), schema.numeric_columns.len()));
        for (j, name) in schema.numeric_columns.iter().enumerate() {
            let column = Array1::from(batch.numeric_column(name)?);
            values.column_mut(j).assign(&column);
        }
        Ok(Self {
            ids,
            columns: schema.numeric_columns.clone(),
            values,
        })
    }

    pub fn row_count(&self) -> usize {
        self.values.nrows()
    }

    /// Borrow one row as a named record.
    pub fn record(&self, row: usize) -> RecordView<'_> {
        RecordView::new(&self.columns, self.values.row(row))
    }

    /// Copy out the named columns, in the order given.
    pub fn select_columns(&self, names: &[String]) -> Result<Array2<f64>, MlError> {
        let indices = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| MlError::missing_column(name.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.values.select(Axis(1), &indices))
    }
}

/// A single raw record: column names paired with that row's values.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    columns: &'a [String],
    values: ArrayView1<'a, f64>,
}

impl<'a> RecordView<'a> {
    pub fn new(columns: &'a [String], values: ArrayView1<'a, f64>) -> Self {
        Self { columns, values }
    }

    /// Value of a named column in this record.
    pub fn value(&self, name: &str) -> Result<f64, MlError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
            .ok_or_else(|| MlError::missing_column(name))
    }
}
