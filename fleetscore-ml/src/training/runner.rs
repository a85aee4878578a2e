//! Training runner: split, fit, predict, evaluate.

use crate::config::{ForestConfig, PipelineConfig};
use crate::error::MlError;
use crate::labels::LabelSet;
use crate::training::forest::MultiOutputRegressor;
use crate::training::metrics::{EvaluationResult, evaluate};
use crate::training::split::{SplitIndices, train_test_split};
use ndarray::{Array2, ArrayView2, Axis};

/// Result of one fit on the training partition, scored on the held-out rows.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub split: SplitIndices,
    /// Identifiers of the held-out rows, aligned with `predictions`.
    pub test_ids: Vec<String>,
    pub y_test: Array2<f64>,
    pub predictions: Array2<f64>,
    pub evaluation: EvaluationResult,
}

/// Runs the train/evaluate stage of a pipeline.
#[derive(Debug, Clone)]
pub struct TrainingRunner {
    pub forest: ForestConfig,
    /// Fraction of rows held out.
    pub split_ratio: f64,
    pub seed: u64,
}

impl TrainingRunner {
    pub fn new(forest: ForestConfig, split_ratio: f64, seed: u64) -> Self {
        Self {
            forest,
            split_ratio,
            seed,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.forest.clone(), config.split_ratio, config.seed)
    }

    /// Split the rows, fit on the training part and evaluate on the held-out part.
    pub fn run(
        &self,
        ids: &[String],
        features: ArrayView2<'_, f64>,
        labels: &LabelSet,
    ) -> Result<TrainingOutcome, MlError> {
        let n = features.nrows();
        if labels.row_count() != n || ids.len() != n {
            return Err(MlError::training(format!(
                "Row counts differ: {n} feature rows, {} label rows, {} identifiers",
                labels.row_count(),
                ids.len()
            )));
        }

        let split = train_test_split(n, self.split_ratio, self.seed)?;
        tracing::info!(
            train = split.train.len(),
            held_out = split.test.len(),
            seed = self.seed,
            "Split rows"
        );

        let x_train = features.select(Axis(0), &split.train);
        let y_train = labels.values.select(Axis(0), &split.train);
        let x_test = features.select(Axis(0), &split.test);
        let y_test = labels.values.select(Axis(0), &split.test);

        let mut model = MultiOutputRegressor::new(self.forest.clone());
        model.fit(x_train.view(), y_train.view(), self.seed)?;
        let predictions = model.predict(x_test.view())?;

        let evaluation = evaluate(&labels.names, y_test.view(), predictions.view())?;
        tracing::info!(
            r2 = evaluation.r2_variance_weighted,
            labels = labels.names.len(),
            "Evaluated held-out rows"
        );

        let test_ids = split.test.iter().map(|&i| ids[i].clone()).collect();
        Ok(TrainingOutcome {
            split,
            test_ids,
            y_test,
            predictions,
            evaluation,
        })
    }
}
