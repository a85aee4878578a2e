//! Integration tests for the scoring pipelines.
//!
//! Each test writes a small CSV fixture to a temp directory and runs a pipeline
//! end-to-end through `fleetscore_ml::run`.

use fleetscore_ml::config::PipelineConfig;
use fleetscore_ml::{MlError, PipelineKind, Report, run};
use pretty_assertions::assert_eq;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DRIVERS: [&str; 4] = ["Alice", "Bruno", "Chen", "Dana"];

/// Helper to write a driver telemetry CSV with `n` rows.
fn write_driver_csv(dir: &Path, n: usize) -> PathBuf {
    let mut csv = String::from(
        "driver_name,impact_score,fuel_saved,co2_reduced,idle_time,perfect_trips,incident_free_days\n",
    );
    for i in 0..n {
        writeln!(
            csv,
            "{},{},{},{},{},{},{}",
            DRIVERS[i % DRIVERS.len()],
            (i % 5) as f64 * 0.5 - 1.0,
            (i % 7) as f64 * 0.3,
            (i % 3) as f64 * 0.4,
            i % 11,
            i % 4,
            i % 9
        )
        .unwrap();
    }
    let path = dir.join("drivers.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Helper to write a fleet sensor CSV with `n` rows.
fn write_fleet_csv(dir: &Path, n: usize) -> PathBuf {
    let mut csv = String::from(
        "vehicle_id,engine_temperature,battery_voltage,tire_pressure,oil_level,coolant_level\n",
    );
    for i in 0..n {
        writeln!(
            csv,
            "V{:03},{},{},{},{},{}",
            i % 6,
            90 + (i * 7) % 70,
            9.5 + (i % 6) as f64 * 0.5,
            24 + (i * 3) % 10,
            45 + (i * 5) % 30,
            35 + (i * 11) % 30
        )
        .unwrap();
    }
    let path = dir.join("fleet.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn fast(mut config: PipelineConfig, input: PathBuf) -> PipelineConfig {
    config.input_path = input;
    config.forest.n_estimators = 20;
    config
}

fn assert_scores_within(report: &Report, lo: f64, hi: f64) {
    for entity in &report.predicted_by_entity {
        for score in &entity.scores {
            assert!(
                (lo..=hi).contains(score),
                "{} score {score} outside [{lo}, {hi}]",
                entity.id
            );
        }
    }
}

#[test]
fn test_driver_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = fast(PipelineConfig::drivers(), write_driver_csv(dir.path(), 40));

    let report = run(PipelineKind::Drivers, &config).unwrap();

    assert_eq!(report.pipeline, PipelineKind::Drivers);
    assert_eq!(
        report.label_names,
        vec![
            "Acceleration",
            "Braking",
            "Cornering",
            "Speed Control",
            "Following Distance",
            "Eco-Driving",
        ]
    );
    assert_eq!(report.total_rows, 40);
    assert_eq!(report.held_out_rows, 12);
    assert_eq!(report.train_rows, 28);
    assert_eq!(report.evaluation.labels.len(), 6);
    assert!(report.sample.is_empty());
    assert_eq!(report.actual_by_entity.len(), DRIVERS.len());
    assert_eq!(report.source.row_count, Some(40));

    let ids: Vec<&str> = report
        .predicted_by_entity
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert!(ids.iter().all(|id| DRIVERS.contains(id)));
    assert_scores_within(&report, 0.0, 100.0);

    let text = report.to_string();
    assert!(text.contains("Predicted Skill Scores for Drivers in Test Set:"));
    assert!(!text.contains("Overall R2 Score"));
}

#[test]
fn test_fleet_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = fast(PipelineConfig::fleet(), write_fleet_csv(dir.path(), 60));

    let report = run(PipelineKind::Fleet, &config).unwrap();

    assert_eq!(report.held_out_rows, 18);
    assert_eq!(report.sample.len(), 5);
    assert!(!report.predicted_by_entity.is_empty());
    let labels: Vec<&str> = report
        .evaluation
        .mae_by_label()
        .into_iter()
        .map(|(l, _)| l)
        .collect();
    assert_eq!(
        labels,
        vec![
            "engine_temperature_maintenance",
            "battery_voltage_maintenance",
            "tire_pressure_maintenance",
            "oil_level_maintenance",
            "coolant_level_maintenance",
        ]
    );
    for row in &report.sample {
        assert_eq!(row.predicted.len(), 5);
        assert!(row.predicted.iter().all(|v| (0.0..=10.0).contains(v)));
    }
    assert_scores_within(&report, 0.0, 10.0);

    let text = report.to_string();
    assert!(text.contains("Mean Absolute Error per sector:"));
    assert!(text.contains("Overall R2 Score:"));
    assert!(text.contains("vehicle_id  Predicted"));
}

#[test]
fn test_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let config = fast(PipelineConfig::fleet(), write_fleet_csv(dir.path(), 30));

    let a = run(PipelineKind::Fleet, &config).unwrap();
    let b = run(PipelineKind::Fleet, &config).unwrap();

    assert_eq!(a.sample, b.sample);
    assert_eq!(a.predicted_by_entity, b.predicted_by_entity);
    assert_eq!(a.evaluation, b.evaluation);
}

#[test]
fn test_seed_changes_held_out_rows() {
    let dir = TempDir::new().unwrap();
    let mut config = fast(PipelineConfig::fleet(), write_fleet_csv(dir.path(), 60));
    config.report.sample_rows = 18;
    let a = run(PipelineKind::Fleet, &config).unwrap();
    config.seed = 7;
    let b = run(PipelineKind::Fleet, &config).unwrap();

    let ids = |r: &Report| r.sample.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
    assert_ne!(ids(&a), ids(&b));
}

#[test]
fn test_json_export() {
    let dir = TempDir::new().unwrap();
    let config = fast(PipelineConfig::drivers(), write_driver_csv(dir.path(), 20));
    let report = run(PipelineKind::Drivers, &config).unwrap();

    let out = dir.path().join("driver_skill_scores.json");
    report.write_json(&out).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["pipeline"], "drivers");
    assert_eq!(value["held_out_rows"], 6);
    assert_eq!(value["label_names"].as_array().unwrap().len(), 6);
    assert!(value["evaluation"]["r2_variance_weighted"].is_number());
}

#[test]
fn test_missing_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drivers.csv");
    std::fs::write(&path, "driver_name,impact_score\nAlice,1\nBruno,2\n").unwrap();
    let config = fast(PipelineConfig::drivers(), path);

    let err = run(PipelineKind::Drivers, &config).unwrap_err();
    assert!(matches!(err, MlError::MissingColumn(_)));
}

#[test]
fn test_non_numeric_cell_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet_csv(dir.path(), 10);
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("V999,hot,12,30,60,50\n");
    std::fs::write(&path, content).unwrap();
    let config = fast(PipelineConfig::fleet(), path);

    let err = run(PipelineKind::Fleet, &config).unwrap_err();
    assert!(matches!(
        err,
        MlError::NonNumeric { ref column, row: 10, .. } if column == "engine_temperature"
    ));
}

#[test]
fn test_single_row_cannot_be_split() {
    let dir = TempDir::new().unwrap();
    let config = fast(PipelineConfig::fleet(), write_fleet_csv(dir.path(), 1));
    let err = run(PipelineKind::Fleet, &config).unwrap_err();
    assert!(matches!(err, MlError::Training(_)));
}

#[test]
fn test_equal_threshold_and_max_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = fast(PipelineConfig::fleet(), write_fleet_csv(dir.path(), 10));
    config
        .max_values
        .insert("battery_voltage".to_string(), 12.0);
    let err = run(PipelineKind::Fleet, &config).unwrap_err();
    assert!(matches!(err, MlError::Config(_)));
}

#[test]
fn test_nan_cell_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet_csv(dir.path(), 10);
    let content = std::fs::read_to_string(&path)
        .unwrap()
        .replacen("\nV000,90,", "\nV000,NaN,", 1);
    std::fs::write(&path, content).unwrap();
    let config = fast(PipelineConfig::fleet(), path);

    let err = run(PipelineKind::Fleet, &config).unwrap_err();
    assert!(matches!(
        err,
        MlError::NonNumeric { ref column, row: 0, ref value } if column == "engine_temperature" && value == "NaN"
    ));
}

#[test]
fn test_quoted_driver_name_with_comma() {
    let dir = TempDir::new().unwrap();
    let path = write_driver_csv(dir.path(), 20);
    let content = std::fs::read_to_string(&path)
        .unwrap()
        .replace("\nAlice,", "\n\"Smith, Alice\",");
    std::fs::write(&path, content).unwrap();
    let mut config = fast(PipelineConfig::drivers(), path);
    config.report.show_actual = true;

    let report = run(PipelineKind::Drivers, &config).unwrap();
    assert_eq!(report.total_rows, 20);
    assert!(
        report
            .actual_by_entity
            .iter()
            .any(|e| e.id == "Smith, Alice")
    );
}
