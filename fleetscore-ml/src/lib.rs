//! # fleetscore-ml: driver skill and vehicle maintenance scoring
//!
//! Both scoring pipelines share one shape:
//! 1. **Load** a CSV into a typed numeric table ([`data`])
//! 2. **Synthesize** target labels from raw columns with fixed, clamped formulas ([`labels`])
//! 3. **Train and evaluate** a multi-output random forest on a seeded split ([`training`])
//! 4. **Report** per-entity mean predictions and held-out metrics ([`report`])
//!
//! [`pipeline::run`] executes all four stages for a [`PipelineKind`] and returns a [`Report`].

pub mod config;
pub mod data;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod report;
pub mod training;

pub use config::{ForestConfig, PipelineConfig, ReportConfig, ScoringConfig, load_config};
pub use error::MlError;
pub use labels::{LabelSet, LabelSynthesizer, MaintenanceSynthesizer, SkillSynthesizer};
pub use pipeline::{Pipeline, PipelineKind, run};
pub use report::Report;
