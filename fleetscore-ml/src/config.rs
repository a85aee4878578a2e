//! Configuration for the scoring pipelines.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace config ->
//! explicit file -> environment. CLI flags are applied on top by the binary.
//! Configuration is loaded from `~/.config/fleetscore/config.toml` and/or
//! `.fleetscore/config.toml` in the workspace directory.

use crate::error::MlError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration: one section per pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Driver skill pipeline.
    #[serde(default = "PipelineConfig::drivers")]
    pub drivers: PipelineConfig,
    /// Vehicle maintenance pipeline.
    #[serde(default = "PipelineConfig::fleet")]
    pub fleet: PipelineConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            drivers: PipelineConfig::drivers(),
            fleet: PipelineConfig::fleet(),
        }
    }
}

/// Configuration for a single load -> synthesize -> train -> report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// CSV file to read.
    pub input_path: PathBuf,
    /// Column holding the entity identifier (driver name, vehicle id).
    pub id_column: String,
    /// Numeric columns fed to the regressor, in order.
    pub feature_columns: Vec<String>,
    /// Per-feature maintenance thresholds. Empty for pipelines without threshold labels.
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    /// Per-feature values at which the maintenance level saturates.
    #[serde(default)]
    pub max_values: BTreeMap<String, f64>,
    /// Fraction of rows held out for evaluation.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,
    /// Seed for both the row shuffle and the forest.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_split_ratio() -> f64 {
    0.3
}

fn default_seed() -> u64 {
    42
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Defaults for the driver skill pipeline.
    pub fn drivers() -> Self {
        Self {
            input_path: PathBuf::from("Driver Metrics Sample.csv"),
            id_column: "driver_name".to_string(),
            feature_columns: columns(&[
                "impact_score",
                "fuel_saved",
                "co2_reduced",
                "idle_time",
                "perfect_trips",
                "incident_free_days",
            ]),
            thresholds: BTreeMap::new(),
            max_values: BTreeMap::new(),
            split_ratio: default_split_ratio(),
            seed: default_seed(),
            forest: ForestConfig::default(),
            report: ReportConfig {
                show_metrics: false,
                grouped: true,
                show_actual: false,
                sample_rows: 0,
                decimals: default_decimals(),
            },
        }
    }

    /// Defaults for the vehicle maintenance pipeline.
    pub fn fleet() -> Self {
        let thresholds = [
            ("engine_temperature", 100.0),
            ("battery_voltage", 12.0),
            ("tire_pressure", 32.0),
            ("oil_level", 70.0),
            ("coolant_level", 60.0),
        ];
        let max_values = [
            ("engine_temperature", 150.0),
            ("battery_voltage", 10.0),
            ("tire_pressure", 25.0),
            ("oil_level", 50.0),
            ("coolant_level", 40.0),
        ];
        Self {
            input_path: PathBuf::from("Fleet Metrics Sample Large.csv"),
            id_column: "vehicle_id".to_string(),
            feature_columns: thresholds.iter().map(|(k, _)| k.to_string()).collect(),
            thresholds: thresholds
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            max_values: max_values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            split_ratio: default_split_ratio(),
            seed: default_seed(),
            forest: ForestConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Check the settings that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), MlError> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(MlError::config(format!(
                "split_ratio must be in (0, 1), got {}",
                self.split_ratio
            )));
        }
        if self.id_column.trim().is_empty() {
            return Err(MlError::config("id_column must not be empty"));
        }
        if self.feature_columns.is_empty() {
            return Err(MlError::config("feature_columns must not be empty"));
        }
        self.report.validate()?;
        self.forest.validate()
    }
}

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees per label.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Maximum tree depth (unbounded if not set).
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Features considered per split (all features if not set).
    #[serde(default)]
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree.
    #[serde(default = "default_true")]
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), MlError> {
        if self.n_estimators == 0 {
            return Err(MlError::config("forest.n_estimators must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(MlError::config(
                "forest.min_samples_split must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(MlError::config("forest.min_samples_leaf must be at least 1"));
        }
        if self.max_features == Some(0) {
            return Err(MlError::config("forest.max_features must be at least 1"));
        }
        Ok(())
    }
}

fn default_n_estimators() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Controls what the console report shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print per-label MAE and the overall R².
    #[serde(default = "default_true")]
    pub show_metrics: bool,
    /// Print the per-entity mean prediction table.
    #[serde(default)]
    pub grouped: bool,
    /// Print the per-entity mean of the synthesized labels over the whole input.
    #[serde(default)]
    pub show_actual: bool,
    /// Number of held-out rows to print individually (0 disables the sample).
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    /// Decimal places used when rounding predictions.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_metrics: true,
            grouped: false,
            show_actual: false,
            sample_rows: default_sample_rows(),
            decimals: default_decimals(),
        }
    }
}

/// Most decimal places an `f64` can meaningfully be rounded to.
pub const MAX_DECIMALS: u32 = 15;

impl ReportConfig {
    pub fn validate(&self) -> Result<(), MlError> {
        if self.decimals > MAX_DECIMALS {
            return Err(MlError::config(format!(
                "report.decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}

fn default_sample_rows() -> usize {
    5
}

fn default_decimals() -> u32 {
    1
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".fleetscore").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `FLEETSCORE_`)
/// 2. Explicit config file
/// 3. Workspace-local config (`.fleetscore/config.toml`)
/// 4. User config (`~/.config/fleetscore/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<ScoringConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ScoringConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "fleetscore", "fleetscore") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }

    // FLEETSCORE_FLEET__SEED, FLEETSCORE_DRIVERS__FOREST__N_ESTIMATORS, etc.
    figment = figment.merge(Env::prefixed("FLEETSCORE_").split("__"));

    figment.extract().map_err(Box::new)
}
