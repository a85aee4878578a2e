//! The generic tabular regression pipeline: load, synthesize, train, report.

use crate::config::PipelineConfig;
use crate::data::{CsvSource, DataBatch, DataSource, DataSourceInfo, FeatureTable, TableSchema};
use crate::error::MlError;
use crate::labels::{LabelSynthesizer, MaintenanceSynthesizer, SkillSynthesizer, synthesize_table};
use crate::report::{PredictionRow, Report, group_mean, round_rows};
use crate::training::TrainingRunner;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two scoring pipelines a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Drivers,
    Fleet,
}

impl PipelineKind {
    /// Label synthesizer for this pipeline, built from its configuration.
    pub fn synthesizer(
        &self,
        config: &PipelineConfig,
    ) -> Result<Box<dyn LabelSynthesizer>, MlError> {
        match self {
            Self::Drivers => Ok(Box::new(SkillSynthesizer::default())),
            Self::Fleet => Ok(Box::new(MaintenanceSynthesizer::from_thresholds(
                &config.feature_columns,
                &config.thresholds,
                &config.max_values,
            )?)),
        }
    }

    pub(crate) fn score_noun(&self) -> &'static str {
        match self {
            Self::Drivers => "Skill Scores",
            Self::Fleet => "Maintenance Levels",
        }
    }

    pub(crate) fn label_noun(&self) -> &'static str {
        match self {
            Self::Drivers => "skill",
            Self::Fleet => "sector",
        }
    }

    pub(crate) fn entity_noun(&self) -> &'static str {
        match self {
            Self::Drivers => "Drivers",
            Self::Fleet => "Vehicles",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drivers => write!(f, "drivers"),
            Self::Fleet => write!(f, "fleet"),
        }
    }
}

/// A configured pipeline. Holds no state between runs.
pub struct Pipeline {
    kind: PipelineKind,
    config: PipelineConfig,
    synthesizer: Box<dyn LabelSynthesizer>,
}

impl Pipeline {
    /// Validate `config` and build the pipeline's label synthesizer.
    pub fn new(kind: PipelineKind, config: PipelineConfig) -> Result<Self, MlError> {
        let synthesizer = kind.synthesizer(&config)?;
        Self::with_synthesizer(kind, config, synthesizer)
    }

    /// Use a custom synthesizer in place of the pipeline's built-in one.
    pub fn with_synthesizer(
        kind: PipelineKind,
        config: PipelineConfig,
        synthesizer: Box<dyn LabelSynthesizer>,
    ) -> Result<Self, MlError> {
        config.validate()?;
        Ok(Self {
            kind,
            config,
            synthesizer,
        })
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Columns the input table must provide as numbers.
    pub fn schema(&self) -> TableSchema {
        let required = self.synthesizer.required_columns();
        TableSchema::new(
            self.config.id_column.clone(),
            [self.config.feature_columns.as_slice(), required.as_slice()],
        )
    }

    /// Read and type the configured input file.
    pub fn load(&self) -> Result<(FeatureTable, DataSourceInfo), MlError> {
        let source = CsvSource::new(&self.config.input_path);
        let batch = source.load()?;
        let mut info = source.source_info();
        info.row_count = Some(batch.row_count());
        Ok((FeatureTable::from_batch(&batch, &self.schema())?, info))
    }

    /// Run every stage on the configured input file.
    pub fn run(&self) -> Result<Report, MlError> {
        tracing::info!(
            pipeline = %self.kind,
            input = %self.config.input_path.display(),
            "Starting run"
        );
        let (table, info) = self.load()?;
        self.run_table(&table, info)
    }

    /// Run every stage on a batch that is already in memory.
    pub fn run_batch(&self, batch: &DataBatch, info: DataSourceInfo) -> Result<Report, MlError> {
        let table = FeatureTable::from_batch(batch, &self.schema())?;
        self.run_table(&table, info)
    }

    fn run_table(&self, table: &FeatureTable, source: DataSourceInfo) -> Result<Report, MlError> {
        tracing::info!(rows = table.row_count(), "Loaded input table");

        let labels = synthesize_table(self.synthesizer.as_ref(), table)?;
        let features = table.select_columns(&self.config.feature_columns)?;

        let outcome =
            TrainingRunner::from_config(&self.config).run(&table.ids, features.view(), &labels)?;

        let display = &self.config.report;
        let rounded = round_rows(outcome.predictions.view(), display.decimals);
        let predicted_by_entity = group_mean(&outcome.test_ids, &rounded, display.decimals);

        let actual_rows: Vec<Vec<f64>> = labels
            .values
            .rows()
            .into_iter()
            .map(|r| r.to_vec())
            .collect();
        let actual_by_entity = group_mean(&table.ids, &actual_rows, display.decimals);

        let sample = outcome
            .test_ids
            .iter()
            .zip(&rounded)
            .take(display.sample_rows)
            .map(|(id, predicted)| PredictionRow {
                id: id.clone(),
                predicted: predicted.clone(),
            })
            .collect();

        tracing::info!(
            pipeline = %self.kind,
            entities = predicted_by_entity.len(),
            "Run complete"
        );

        Ok(Report {
            pipeline: self.kind,
            source,
            generated_at: chrono::Utc::now(),
            id_column: self.config.id_column.clone(),
            seed: self.config.seed,
            total_rows: table.row_count(),
            train_rows: outcome.split.train.len(),
            held_out_rows: outcome.split.test.len(),
            label_names: labels.names,
            evaluation: outcome.evaluation,
            predicted_by_entity,
            actual_by_entity,
            sample,
            display: display.clone(),
        })
    }
}

/// Build and run a pipeline in one call.
pub fn run(kind: PipelineKind, config: &PipelineConfig) -> Result<Report, MlError> {
    Pipeline::new(kind, config.clone())?.run()
}
