//! Seeded train/held-out row partitioning.

use crate::error::MlError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Row indices of each partition, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_ratio * n_rows)` rows.
///
/// The held-out rows are the head of the permutation, the training rows the tail.
pub fn train_test_split(
    n_rows: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<SplitIndices, MlError> {
    if n_rows < 2 {
        return Err(MlError::training(format!(
            "Need at least 2 rows to split, got {n_rows}"
        )));
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(MlError::invalid_input(format!(
            "test ratio must be in (0, 1), got {test_ratio}"
        )));
    }

    let n_test = (test_ratio * n_rows as f64).ceil() as usize;
    if n_test >= n_rows {
        return Err(MlError::training(format!(
            "Holding out {n_test} of {n_rows} rows leaves nothing to train on"
        )));
    }

    let mut order: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(SplitIndices { train, test: order })
}
