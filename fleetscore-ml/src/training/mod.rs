//! Training infrastructure: splitting, random forests, metrics, and the runner that ties them.

pub mod forest;
pub mod metrics;
pub mod runner;
pub mod split;
pub mod tree;

pub use forest::{MultiOutputRegressor, RandomForestRegressor};
pub use metrics::{EvaluationResult, LabelMetrics, RegressionMetrics};
pub use runner::{TrainingOutcome, TrainingRunner};
pub use split::{SplitIndices, train_test_split};
pub use tree::RegressionTree;
