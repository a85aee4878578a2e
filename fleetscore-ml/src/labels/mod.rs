//! Label synthesis: derive target columns from raw telemetry with fixed formulas.
//!
//! Raw telemetry carries no ground-truth skill or maintenance measurements, so each
//! pipeline computes its targets from the input columns and then trains a model to
//! reproduce them. Every formula is clamped to a closed range.

pub mod maintenance;
pub mod skill;

pub use maintenance::{Direction, MaintenanceRule, MaintenanceSynthesizer};
pub use skill::{AffineRule, SkillSynthesizer};

use crate::data::{FeatureTable, RecordView};
use crate::error::MlError;
use ndarray::Array2;

/// Turns one raw record into a fixed-size vector of named labels.
pub trait LabelSynthesizer {
    /// Names of the produced labels, in output order.
    fn label_names(&self) -> Vec<String>;

    /// Raw columns the formulas read.
    fn required_columns(&self) -> Vec<String>;

    /// Compute the label vector for one record. Pure: same record, same labels.
    fn synthesize(&self, record: &RecordView<'_>) -> Result<Vec<f64>, MlError>;
}

/// Synthesized labels for a whole table, one row per input record.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl LabelSet {
    pub fn row_count(&self) -> usize {
        self.values.nrows()
    }
}

/// Apply a synthesizer to every row of a table.
pub fn synthesize_table(
    synthesizer: &dyn LabelSynthesizer,
    table: &FeatureTable,
) -> Result<LabelSet, MlError> {
    let names = synthesizer.label_names();
    let mut values = Array2::<f64>::zeros((table.row_count(), names.len()));
    for row in 0..table.row_count() {
        let labels = synthesizer.synthesize(&table.record(row))?;
        if labels.len() != names.len() {
            return Err(MlError::invalid_input(format!(
                "Synthesizer produced {} labels for row {row}, expected {}",
                labels.len(),
                names.len()
            )));
        }
        for (j, value) in labels.into_iter().enumerate() {
            values[[row, j]] = value;
        }
    }
    tracing::debug!(rows = table.row_count(), labels = names.len(), "Synthesized labels");
    Ok(LabelSet { names, values })
}
