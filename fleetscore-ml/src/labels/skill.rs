//! Driver skill scores.
//!
//! The coefficients are demonstration heuristics chosen to spread scores across the
//! upper part of the range, not validated driving-science constants.

use crate::data::RecordView;
use crate::error::MlError;
use crate::labels::LabelSynthesizer;

/// Closed range every skill score is clamped to.
pub const SKILL_MIN: f64 = 0.0;
pub const SKILL_MAX: f64 = 100.0;

/// `(sum of inputs) * multiplier + base`, clamped to the skill range.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineRule {
    pub label: String,
    pub inputs: Vec<String>,
    pub multiplier: f64,
    pub base: f64,
}

impl AffineRule {
    pub fn new(label: &str, inputs: &[&str], multiplier: f64, base: f64) -> Self {
        Self {
            label: label.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            multiplier,
            base,
        }
    }

    /// Unclamped value of the formula.
    pub fn raw_score(&self, record: &RecordView<'_>) -> Result<f64, MlError> {
        let mut sum = 0.0;
        for input in &self.inputs {
            sum += record.value(input)?;
        }
        Ok(sum * self.multiplier + self.base)
    }

    pub fn score(&self, record: &RecordView<'_>) -> Result<f64, MlError> {
        Ok(self.raw_score(record)?.clamp(SKILL_MIN, SKILL_MAX))
    }
}

/// The six driving skills.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillSynthesizer {
    rules: Vec<AffineRule>,
}

impl Default for SkillSynthesizer {
    fn default() -> Self {
        Self {
            rules: vec![
                AffineRule::new("Acceleration", &["impact_score"], 20.0, 60.0),
                AffineRule::new("Braking", &["perfect_trips"], 12.0, 40.0),
                AffineRule::new("Cornering", &["impact_score"], 20.0, 60.0),
                AffineRule::new("Speed Control", &["incident_free_days"], 4.0, 50.0),
                AffineRule::new("Following Distance", &["perfect_trips"], 12.0, 40.0),
                AffineRule::new("Eco-Driving", &["fuel_saved", "co2_reduced"], 7.0, 50.0),
            ],
        }
    }
}

impl SkillSynthesizer {
    pub fn rules(&self) -> &[AffineRule] {
        &self.rules
    }

    /// Look up a rule by its label.
    pub fn rule(&self, label: &str) -> Option<&AffineRule> {
        self.rules.iter().find(|r| r.label == label)
    }
}

impl LabelSynthesizer for SkillSynthesizer {
    fn label_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.label.clone()).collect()
    }

    fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for input in self.rules.iter().flat_map(|r| r.inputs.iter()) {
            if !columns.contains(input) {
                columns.push(input.clone());
            }
        }
        columns
    }

    fn synthesize(&self, record: &RecordView<'_>) -> Result<Vec<f64>, MlError> {
        self.rules.iter().map(|r| r.score(record)).collect()
    }
}
