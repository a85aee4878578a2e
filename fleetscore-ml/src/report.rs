//! Run report: per-entity aggregation and console rendering.

use crate::config::{MAX_DECIMALS, ReportConfig};
use crate::data::DataSourceInfo;
use crate::pipeline::PipelineKind;
use crate::training::EvaluationResult;
use chrono::{DateTime, Utc};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Mean label values of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityScores {
    pub id: String,
    pub scores: Vec<f64>,
}

/// Rounded prediction of one held-out row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: String,
    pub predicted: Vec<f64>,
}

/// Everything a run produced, ready to print or export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub pipeline: PipelineKind,
    pub source: DataSourceInfo,
    pub generated_at: DateTime<Utc>,
    pub id_column: String,
    pub seed: u64,
    pub total_rows: usize,
    pub train_rows: usize,
    pub held_out_rows: usize,
    pub label_names: Vec<String>,
    pub evaluation: EvaluationResult,
    /// Mean rounded prediction per held-out entity, sorted by identifier.
    pub predicted_by_entity: Vec<EntityScores>,
    /// Mean synthesized label per entity over the whole input.
    pub actual_by_entity: Vec<EntityScores>,
    /// First held-out rows in split order.
    pub sample: Vec<PredictionRow>,
    pub display: ReportConfig,
}

impl Report {
    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), crate::MlError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }

    /// Predicted mean of `label` for entity `id`, if both exist.
    pub fn predicted_score(&self, id: &str, label: &str) -> Option<f64> {
        let col = self.label_names.iter().position(|l| l == label)?;
        self.predicted_by_entity
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.scores[col])
    }
}

/// Round half to even, at `decimals` places (at most [`MAX_DECIMALS`]).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    (value * factor).round_ties_even() / factor
}

/// Round every element of every row.
pub fn round_rows(values: ArrayView2<'_, f64>, decimals: u32) -> Vec<Vec<f64>> {
    values
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| round_to(*v, decimals)).collect())
        .collect()
}

/// Mean of each column per identifier, sorted by identifier, rounded to `decimals`.
pub fn group_mean(ids: &[String], rows: &[Vec<f64>], decimals: u32) -> Vec<EntityScores> {
    let mut groups: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
    for (id, row) in ids.iter().zip(rows) {
        let (count, sums) = groups
            .entry(id.as_str())
            .or_insert_with(|| (0, vec![0.0; row.len()]));
        *count += 1;
        for (sum, v) in sums.iter_mut().zip(row) {
            *sum += v;
        }
    }

    groups
        .into_iter()
        .map(|(id, (count, sums))| EntityScores {
            id: id.to_string(),
            scores: sums
                .into_iter()
                .map(|s| round_to(s / count as f64, decimals))
                .collect(),
        })
        .collect()
}

/// Width in characters, which is what `{:<w$}` pads to.
fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn write_table(
    f: &mut fmt::Formatter<'_>,
    id_header: &str,
    labels: &[String],
    rows: &[EntityScores],
    decimals: usize,
) -> fmt::Result {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.scores.iter().map(|v| format!("{v:.decimals$}")).collect())
        .collect();

    let id_width = rows
        .iter()
        .map(|r| display_width(&r.id))
        .chain(std::iter::once(display_width(id_header)))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = labels
        .iter()
        .enumerate()
        .map(|(j, label)| {
            cells
                .iter()
                .map(|c| display_width(&c[j]))
                .chain(std::iter::once(display_width(label)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    write!(f, "{id_header:<id_width$}")?;
    for (label, w) in labels.iter().zip(&widths) {
        write!(f, "  {label:>w$}")?;
    }
    writeln!(f)?;
    for (row, cells) in rows.iter().zip(&cells) {
        write!(f, "{:<id_width$}", row.id)?;
        for (cell, w) in cells.iter().zip(&widths) {
            write!(f, "  {cell:>w$}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.display.decimals as usize;

        if self.display.show_metrics {
            writeln!(f, "Mean Absolute Error per {}:", self.pipeline.label_noun())?;
            for (label, mae) in self.evaluation.mae_by_label() {
                writeln!(f, "  {label}: {mae:.4}")?;
            }
            writeln!(f, "Overall R2 Score: {:.4}", self.evaluation.r2_variance_weighted)?;
        }

        if self.display.show_actual {
            writeln!(f)?;
            writeln!(f, "Average {} by {}:", self.pipeline.score_noun(), self.id_column)?;
            write_table(
                f,
                &self.id_column,
                &self.label_names,
                &self.actual_by_entity,
                decimals,
            )?;
        }

        if self.display.grouped {
            writeln!(f)?;
            writeln!(
                f,
                "Predicted {} for {} in Test Set:",
                self.pipeline.score_noun(),
                self.pipeline.entity_noun()
            )?;
            write_table(
                f,
                &self.id_column,
                &self.label_names,
                &self.predicted_by_entity,
                decimals,
            )?;
        }

        if !self.sample.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{}: [{}]",
                self.pipeline.score_noun(),
                self.label_names.join(", ")
            )?;
            let id_width = self
                .sample
                .iter()
                .map(|r| display_width(&r.id))
                .chain(std::iter::once(display_width(&self.id_column)))
                .max()
                .unwrap_or(0);
            writeln!(f, "{:<id_width$}  Predicted", self.id_column)?;
            for row in &self.sample {
                let values: Vec<String> = row
                    .predicted
                    .iter()
                    .map(|v| format!("{v:.decimals$}"))
                    .collect();
                writeln!(f, "{:<id_width$}  [{}]", row.id, values.join(", "))?;
            }
        }

        Ok(())
    }
}
