//! Random forest regression and the multi-output wrapper around it.

use crate::config::ForestConfig;
use crate::error::MlError;
use crate::training::tree::RegressionTree;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bagged ensemble of [`RegressionTree`]s predicting a single target.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    /// Fit `config.n_estimators` trees. The same seed always yields the same forest.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<(), MlError> {
        self.config.validate()?;
        let n = x.nrows();
        if n != y.len() {
            return Err(MlError::training(format!(
                "Feature rows ({n}) and target rows ({}) differ",
                y.len()
            )));
        }
        if n == 0 {
            return Err(MlError::training("Cannot fit a forest on an empty table"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        self.trees.clear();
        for _ in 0..self.config.n_estimators {
            let samples: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            self.trees
                .push(RegressionTree::fit(x, y, samples, &self.config, &mut rng)?);
        }
        Ok(())
    }

    /// Mean of the trees' predictions for every row of `x`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, MlError> {
        let first = self
            .trees
            .first()
            .ok_or_else(|| MlError::training("Forest has not been fitted"))?;
        if x.ncols() != first.n_features() {
            return Err(MlError::invalid_input(format!(
                "Expected {} features, got {}",
                first.n_features(),
                x.ncols()
            )));
        }
        let n_trees = self.trees.len() as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// One independent forest per output column.
#[derive(Debug, Clone)]
pub struct MultiOutputRegressor {
    config: ForestConfig,
    estimators: Vec<RandomForestRegressor>,
}

impl MultiOutputRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            estimators: Vec::new(),
        }
    }

    /// Fit one forest per column of `y`, each seeded with `seed`.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView2<'_, f64>,
        seed: u64,
    ) -> Result<(), MlError> {
        if x.nrows() != y.nrows() {
            return Err(MlError::training(format!(
                "Feature rows ({}) and label rows ({}) differ",
                x.nrows(),
                y.nrows()
            )));
        }
        if y.ncols() == 0 {
            return Err(MlError::training("No label columns to fit"));
        }

        self.estimators = y
            .columns()
            .into_iter()
            .map(|column| {
                let mut forest = RandomForestRegressor::new(self.config.clone());
                forest.fit(x, column, seed)?;
                Ok(forest)
            })
            .collect::<Result<Vec<_>, MlError>>()?;

        tracing::debug!(
            outputs = self.estimators.len(),
            trees_per_output = self.config.n_estimators,
            rows = x.nrows(),
            "Fitted multi-output forest"
        );
        Ok(())
    }

    /// Predictions with one column per fitted output.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, MlError> {
        if self.estimators.is_empty() {
            return Err(MlError::training("Model has not been fitted"));
        }
        let mut out = Array2::<f64>::zeros((x.nrows(), self.estimators.len()));
        for (j, forest) in self.estimators.iter().enumerate() {
            out.column_mut(j).assign(&forest.predict(x)?);
        }
        Ok(out)
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }
}
