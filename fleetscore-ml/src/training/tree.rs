//! CART regression tree with a squared-error split criterion.

use crate::config::ForestConfig;
use crate::error::MlError;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Nodes smaller than this spread are treated as pure.
const IMPURITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree. Node 0 is the root; rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grow a tree on the given sample indices (duplicates allowed, as in a bootstrap draw).
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        samples: Vec<usize>,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Result<Self, MlError> {
        if x.nrows() != y.len() {
            return Err(MlError::training(format!(
                "Feature rows ({}) and target rows ({}) differ",
                x.nrows(),
                y.len()
            )));
        }
        if samples.is_empty() {
            return Err(MlError::training("Cannot grow a tree on zero samples"));
        }

        let mut tree = Self {
            nodes: vec![Node::Leaf {
                value: mean(y, &samples),
            }],
            n_features: x.ncols(),
        };

        let mut pending = vec![(0usize, samples, 0usize)];
        while let Some((idx, samples, depth)) = pending.pop() {
            if !should_split(y, &samples, depth, config) {
                continue;
            }
            let features = candidate_features(x.ncols(), config.max_features, rng);
            let Some(split) = best_split(x, y, &samples, &features, config.min_samples_leaf)
            else {
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            let left = tree.nodes.len();
            tree.nodes.push(Node::Leaf {
                value: mean(y, &left_samples),
            });
            let right = tree.nodes.len();
            tree.nodes.push(Node::Leaf {
                value: mean(y, &right_samples),
            });
            tree.nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            pending.push((left, left_samples, depth + 1));
            pending.push((right, right_samples, depth + 1));
        }

        Ok(tree)
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

fn mean(y: ArrayView1<'_, f64>, samples: &[usize]) -> f64 {
    samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64
}

fn should_split(
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    depth: usize,
    config: &ForestConfig,
) -> bool {
    if samples.len() < config.min_samples_split || samples.len() < 2 * config.min_samples_leaf {
        return false;
    }
    if config.max_depth.is_some_and(|max| depth >= max) {
        return false;
    }
    let m = mean(y, samples);
    let sse: f64 = samples.iter().map(|&i| (y[i] - m).powi(2)).sum();
    sse / samples.len() as f64 > IMPURITY_EPSILON
}

fn candidate_features(n_features: usize, max_features: Option<usize>, rng: &mut StdRng) -> Vec<usize> {
    match max_features {
        Some(k) if k < n_features => {
            let mut picked = rand::seq::index::sample(rng, n_features, k).into_vec();
            picked.sort_unstable();
            picked
        }
        _ => (0..n_features).collect(),
    }
}

/// Best threshold over the candidate features.
///
/// Minimising the children's summed squared error is the same as maximising
/// `sum_l² / n_l + sum_r² / n_r`, which a single sorted sweep per feature can track.
fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    features: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = samples.len();
    let total: f64 = samples.iter().map(|&i| y[i]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<BestSplit> = None;
    let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);

    for &feature in features {
        column.clear();
        column.extend(samples.iter().map(|&i| (x[[i, feature]], y[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += column[k - 1].1;
            let (lo, hi) = (column[k - 1].0, column[k].0);
            if lo >= hi || k < min_samples_leaf || n - k < min_samples_leaf {
                continue;
            }
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
            if score <= parent_score + IMPURITY_EPSILON {
                continue;
            }
            if best.as_ref().is_none_or(|b| score > b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};
    use rand::SeedableRng;

    fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ForestConfig) -> RegressionTree {
        let mut rng = StdRng::seed_from_u64(42);
        RegressionTree::fit(x.view(), y.view(), (0..y.len()).collect(), config, &mut rng).unwrap()
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![5.0, 5.0, 5.0];
        let tree = fit(&x, &y, &ForestConfig::default());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(array![10.0].view()), 5.0);
    }

    #[test]
    fn test_step_function_is_recovered() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [10.0], [11.0], [12.0], [13.0]];
        let y = array![1.0, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 9.0];
        let tree = fit(&x, &y, &ForestConfig::default());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict_row(array![2.5].view()), 1.0);
        assert_eq!(tree.predict_row(array![6.6].view()), 9.0);
    }

    #[test]
    fn test_threshold_is_midpoint() {
        let x = array![[0.0], [4.0]];
        let y = array![0.0, 1.0];
        let tree = fit(&x, &y, &ForestConfig::default());
        assert_eq!(tree.predict_row(array![2.0].view()), 0.0);
        assert_eq!(tree.predict_row(array![2.0001].view()), 1.0);
    }

    #[test]
    fn test_picks_informative_feature() {
        // Feature 0 is noise, feature 1 determines the target.
        let x = array![[5.0, 0.0], [1.0, 0.0], [4.0, 1.0], [2.0, 1.0]];
        let y = array![0.0, 0.0, 8.0, 8.0];
        let tree = fit(&x, &y, &ForestConfig::default());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict_row(array![5.0, 1.0].view()), 8.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];
        let config = ForestConfig {
            max_depth: Some(1),
            ..ForestConfig::default()
        };
        let tree = fit(&x, &y, &config);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_fully_grown_tree_interpolates_training_rows() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![3.0, 1.0, 4.0, 1.5];
        let tree = fit(&x, &y, &ForestConfig::default());
        for (row, target) in x.rows().into_iter().zip(y.iter()) {
            assert_eq!(tree.predict_row(row), *target);
        }
    }

    #[test]
    fn test_mismatched_rows() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(
            RegressionTree::fit(x.view(), y.view(), vec![0], &ForestConfig::default(), &mut rng)
                .is_err()
        );
    }
}
