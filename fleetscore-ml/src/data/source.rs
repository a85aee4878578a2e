//! Data source abstraction for loading telemetry tables.

use crate::error::MlError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A batch of raw rows, every cell kept as text until a schema asks for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataBatch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Result<usize, MlError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MlError::missing_column(name))
    }

    /// All cells of a text column, in row order.
    pub fn text_column(&self, name: &str) -> Result<Vec<String>, MlError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells.get(idx).cloned().ok_or_else(|| {
                    MlError::dataset(format!("Row {row} has no value for column '{name}'"))
                })
            })
            .collect()
    }

    /// All cells of a column parsed as `f64`. Fails on the first cell that does not parse
    /// to a finite number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, MlError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells.get(idx).ok_or_else(|| {
                    MlError::dataset(format!("Row {row} has no value for column '{name}'"))
                })?;
                cell.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| MlError::NonNumeric {
                        column: name.to_string(),
                        row,
                        value: cell.clone(),
                    })
            })
            .collect()
    }
}

/// Information about a data source, carried into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub source_type: String,
    pub location: String,
    pub accessed_at: chrono::DateTime<chrono::Utc>,
    pub row_count: Option<usize>,
}

/// Trait for loading a raw table.
pub trait DataSource {
    /// Load every row of this source.
    fn load(&self) -> Result<DataBatch, MlError>;

    /// Return metadata about this source.
    fn source_info(&self) -> DataSourceInfo;
}

// ---------------------------------------------------------------------------
// CsvSource
// ---------------------------------------------------------------------------

/// Delimited text file with a header row.
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: ',',
        }
    }

    /// Parse CSV text that is already in memory.
    ///
    /// Quoted fields may contain the delimiter; `""` inside quotes is a literal quote.
    /// Cells are trimmed and blank lines are skipped.
    pub fn parse(content: &str, delimiter: char) -> Result<DataBatch, MlError> {
        let delimiter = u8::try_from(delimiter)
            .map_err(|_| MlError::config(format!("Delimiter {delimiter:?} is not a single byte")))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| MlError::dataset(format!("Failed to read CSV header: {e}")))?
            .iter()
            .map(|s| s.to_string())
            .collect();
        if columns.is_empty() {
            return Err(MlError::dataset("Empty CSV file"));
        }

        let mut rows = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| MlError::dataset(format!("Row {row}: {e}")))?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(DataBatch { columns, rows })
    }
}

impl DataSource for CsvSource {
    fn load(&self) -> Result<DataBatch, MlError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            MlError::dataset(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        let batch = Self::parse(&content, self.delimiter)?;
        tracing::debug!(
            path = %self.path.display(),
            rows = batch.row_count(),
            columns = batch.column_count(),
            "Loaded CSV"
        );
        Ok(batch)
    }

    fn source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            source_type: "csv".to_string(),
            location: self.path.display().to_string(),
            accessed_at: chrono::Utc::now(),
            row_count: None,
        }
    }
}
