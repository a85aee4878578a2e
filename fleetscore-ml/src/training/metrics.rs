//! Regression metrics for held-out predictions.

use crate::error::MlError;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Regression metrics for one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub explained_variance: Option<f64>,
}

impl RegressionMetrics {
    pub fn compute(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> Self {
        let n = y_true.len() as f64;
        let residuals = &y_true - &y_pred;
        let mse = residuals.mapv(|r| r * r).sum() / n;
        let mae = residuals.mapv(f64::abs).sum() / n;

        let mean = y_true.sum() / n;
        let total_ss = y_true.mapv(|v| (v - mean).powi(2)).sum();
        let residual_ss = residuals.mapv(|r| r * r).sum();

        let residual_mean = residuals.sum() / n;
        let residual_var = residuals.mapv(|r| (r - residual_mean).powi(2)).sum() / n;
        let explained_variance = (total_ss > 0.0).then(|| 1.0 - residual_var / (total_ss / n));

        Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r_squared: r2_from_sums(residual_ss, total_ss),
            explained_variance,
        }
    }
}

/// R² for one output, with the degenerate cases pinned to finite values:
/// a perfect fit is 1.0 and an imperfect fit of a constant target is 0.0.
fn r2_from_sums(residual_ss: f64, total_ss: f64) -> f64 {
    if residual_ss == 0.0 {
        1.0
    } else if total_ss == 0.0 {
        0.0
    } else {
        1.0 - residual_ss / total_ss
    }
}

/// Metrics of one named label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub label: String,
    #[serde(flatten)]
    pub metrics: RegressionMetrics,
}

/// Everything measured on the held-out partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub labels: Vec<LabelMetrics>,
    /// R² averaged over labels, weighted by each label's variance.
    pub r2_variance_weighted: f64,
}

impl EvaluationResult {
    /// `(label, mae)` pairs in label order.
    pub fn mae_by_label(&self) -> Vec<(&str, f64)> {
        self.labels
            .iter()
            .map(|l| (l.label.as_str(), l.metrics.mae))
            .collect()
    }
}

fn check_shapes(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> Result<(), MlError> {
    if y_true.dim() != y_pred.dim() {
        return Err(MlError::evaluation(format!(
            "Shape mismatch: actual {:?}, predicted {:?}",
            y_true.dim(),
            y_pred.dim()
        )));
    }
    if y_true.nrows() == 0 {
        return Err(MlError::evaluation("No rows to evaluate"));
    }
    Ok(())
}

/// Mean absolute error of each column.
pub fn mean_absolute_error(
    y_true: ArrayView2<'_, f64>,
    y_pred: ArrayView2<'_, f64>,
) -> Result<Vec<f64>, MlError> {
    check_shapes(y_true, y_pred)?;
    let abs = (&y_true - &y_pred).mapv(f64::abs);
    Ok(abs.mean_axis(Axis(0)).map(|m| m.to_vec()).unwrap_or_default())
}

/// Multi-output R² where each output's score is weighted by its total sum of squares.
///
/// Undefined (NaN) with fewer than two rows. If no output varies the result is 1.0 for a
/// perfect fit and 0.0 otherwise.
pub fn r2_score_variance_weighted(
    y_true: ArrayView2<'_, f64>,
    y_pred: ArrayView2<'_, f64>,
) -> Result<f64, MlError> {
    check_shapes(y_true, y_pred)?;
    if y_true.nrows() < 2 {
        tracing::warn!(rows = y_true.nrows(), "R² is not defined for fewer than two rows");
        return Ok(f64::NAN);
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut any_error = false;
    for (actual, predicted) in y_true.columns().into_iter().zip(y_pred.columns()) {
        let mean = actual.sum() / actual.len() as f64;
        let total_ss = actual.mapv(|v| (v - mean).powi(2)).sum();
        let residual_ss = (&actual - &predicted).mapv(|r| r * r).sum();
        any_error |= residual_ss != 0.0;
        weighted += r2_from_sums(residual_ss, total_ss) * total_ss;
        total_weight += total_ss;
    }

    if total_weight == 0.0 {
        return Ok(if any_error { 0.0 } else { 1.0 });
    }
    Ok(weighted / total_weight)
}

/// Compute per-label metrics and the aggregate R².
pub fn evaluate(
    label_names: &[String],
    y_true: ArrayView2<'_, f64>,
    y_pred: ArrayView2<'_, f64>,
) -> Result<EvaluationResult, MlError> {
    check_shapes(y_true, y_pred)?;
    if label_names.len() != y_true.ncols() {
        return Err(MlError::evaluation(format!(
            "{} label names for {} columns",
            label_names.len(),
            y_true.ncols()
        )));
    }

    let labels = label_names
        .iter()
        .zip(y_true.columns().into_iter().zip(y_pred.columns()))
        .map(|(label, (actual, predicted))| LabelMetrics {
            label: label.clone(),
            metrics: RegressionMetrics::compute(actual, predicted),
        })
        .collect::<Vec<_>>();

    for l in &labels {
        tracing::debug!(label = %l.label, mae = l.metrics.mae, r2 = l.metrics.r_squared, "Label metrics");
    }

    Ok(EvaluationResult {
        labels,
        r2_variance_weighted: r2_score_variance_weighted(y_true, y_pred)?,
    })
}
