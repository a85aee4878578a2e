//! Vehicle maintenance levels derived from sensor thresholds.
//!
//! A level of 0 means the sensor reading is on the healthy side of its threshold; 10 means
//! it has reached (or passed) the configured maximum.

use crate::data::RecordView;
use crate::error::MlError;
use crate::labels::LabelSynthesizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LEVEL_MIN: f64 = 0.0;
pub const LEVEL_MAX: f64 = 10.0;

/// Sensors where a rising reading means more maintenance is needed.
const HIGHER_IS_WORSE: &[&str] = &["engine_temperature"];

/// Which way a reading degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsWorse,
    LowerIsWorse,
}

impl Direction {
    pub fn for_feature(feature: &str) -> Self {
        if HIGHER_IS_WORSE.contains(&feature) {
            Self::HigherIsWorse
        } else {
            Self::LowerIsWorse
        }
    }
}

/// Linear scale from `threshold` (level 0) to `max_value` (level 10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRule {
    pub feature: String,
    pub threshold: f64,
    pub max_value: f64,
    pub direction: Direction,
}

impl MaintenanceRule {
    /// Build a rule, rejecting a degenerate or inverted scale.
    pub fn new(feature: &str, threshold: f64, max_value: f64) -> Result<Self, MlError> {
        let direction = Direction::for_feature(feature);
        if threshold == max_value {
            return Err(MlError::config(format!(
                "Threshold and max value for '{feature}' are both {threshold}"
            )));
        }
        let ordered = match direction {
            Direction::HigherIsWorse => max_value > threshold,
            Direction::LowerIsWorse => max_value < threshold,
        };
        if !ordered {
            return Err(MlError::config(format!(
                "Max value {max_value} for '{feature}' is on the wrong side of threshold {threshold} ({direction:?})"
            )));
        }
        Ok(Self {
            feature: feature.to_string(),
            threshold,
            max_value,
            direction,
        })
    }

    /// Name of the label column this rule produces.
    pub fn label(&self) -> String {
        format!("{}_maintenance", self.feature)
    }

    /// Unclamped level.
    pub fn raw_score(&self, value: f64) -> f64 {
        match self.direction {
            Direction::HigherIsWorse => {
                (value - self.threshold) / (self.max_value - self.threshold) * LEVEL_MAX
            }
            Direction::LowerIsWorse => {
                (self.threshold - value) / (self.threshold - self.max_value) * LEVEL_MAX
            }
        }
    }

    pub fn score(&self, value: f64) -> f64 {
        self.raw_score(value).clamp(LEVEL_MIN, LEVEL_MAX)
    }
}

/// One maintenance level per configured sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceSynthesizer {
    rules: Vec<MaintenanceRule>,
}

impl MaintenanceSynthesizer {
    /// Build rules for every feature in `thresholds`.
    ///
    /// Features listed in `order` come first, in that order; any remaining thresholded
    /// features follow alphabetically.
    pub fn from_thresholds(
        order: &[String],
        thresholds: &BTreeMap<String, f64>,
        max_values: &BTreeMap<String, f64>,
    ) -> Result<Self, MlError> {
        if thresholds.is_empty() {
            return Err(MlError::config("No maintenance thresholds configured"));
        }
        if let Some(extra) = max_values.keys().find(|k| !thresholds.contains_key(*k)) {
            return Err(MlError::config(format!(
                "Max value configured for '{extra}' without a threshold"
            )));
        }

        let mut features: Vec<&String> = order
            .iter()
            .filter(|f| thresholds.contains_key(*f))
            .collect();
        features.extend(thresholds.keys().filter(|k| !order.contains(k)));

        let rules = features
            .into_iter()
            .map(|feature| {
                let max_value = max_values.get(feature).ok_or_else(|| {
                    MlError::config(format!("No max value configured for '{feature}'"))
                })?;
                MaintenanceRule::new(feature, thresholds[feature], *max_value)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[MaintenanceRule] {
        &self.rules
    }
}

impl LabelSynthesizer for MaintenanceSynthesizer {
    fn label_names(&self) -> Vec<String> {
        self.rules.iter().map(MaintenanceRule::label).collect()
    }

    fn required_columns(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.feature.clone()).collect()
    }

    fn synthesize(&self, record: &RecordView<'_>) -> Result<Vec<f64>, MlError> {
        self.rules
            .iter()
            .map(|r| Ok(r.score(record.value(&r.feature)?)))
            .collect()
    }
}
