//! Property-based tests for label synthesis using proptest.

use fleetscore_ml::config::PipelineConfig;
use fleetscore_ml::data::RecordView;
use fleetscore_ml::labels::{LabelSynthesizer, MaintenanceSynthesizer, SkillSynthesizer};
use fleetscore_ml::report::group_mean;
use fleetscore_ml::training::train_test_split;
use ndarray::Array1;
use proptest::prelude::*;

fn skill_columns() -> Vec<String> {
    [
        "impact_score",
        "perfect_trips",
        "incident_free_days",
        "fuel_saved",
        "co2_reduced",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn maintenance() -> MaintenanceSynthesizer {
    let fleet = PipelineConfig::fleet();
    MaintenanceSynthesizer::from_thresholds(
        &fleet.feature_columns,
        &fleet.thresholds,
        &fleet.max_values,
    )
    .unwrap()
}

fn skills_for(values: Vec<f64>) -> Vec<f64> {
    let columns = skill_columns();
    let row = Array1::from(values);
    SkillSynthesizer::default()
        .synthesize(&RecordView::new(&columns, row.view()))
        .unwrap()
}

fn levels_for(values: Vec<f64>) -> Vec<f64> {
    let synth = maintenance();
    let columns = synth.required_columns();
    let row = Array1::from(values);
    synth
        .synthesize(&RecordView::new(&columns, row.view()))
        .unwrap()
}

// --- Range properties ---

proptest! {
    #[test]
    fn skill_scores_stay_in_range(values in prop::collection::vec(-1e9f64..1e9, 5)) {
        for score in skills_for(values) {
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn maintenance_levels_stay_in_range(values in prop::collection::vec(-1e9f64..1e9, 5)) {
        for level in levels_for(values) {
            prop_assert!((0.0..=10.0).contains(&level));
        }
    }
}

// --- Determinism and parity ---

proptest! {
    #[test]
    fn skill_synthesis_is_deterministic(values in prop::collection::vec(-50f64..50.0, 5)) {
        prop_assert_eq!(skills_for(values.clone()), skills_for(values));
    }

    #[test]
    fn maintenance_synthesis_is_deterministic(values in prop::collection::vec(0f64..200.0, 5)) {
        prop_assert_eq!(levels_for(values.clone()), levels_for(values));
    }

    #[test]
    fn declared_equal_skills_agree(values in prop::collection::vec(-50f64..50.0, 5)) {
        let s = skills_for(values);
        // Acceleration == Cornering, Braking == Following Distance
        prop_assert_eq!(s[0], s[2]);
        prop_assert_eq!(s[1], s[4]);
    }
}

// --- Monotonicity (before clamping) ---

proptest! {
    #[test]
    fn engine_level_never_falls_as_temperature_rises(a in -500f64..500.0, delta in 0f64..500.0) {
        let synth = maintenance();
        let engine = &synth.rules()[0];
        prop_assert_eq!(engine.feature.as_str(), "engine_temperature");
        prop_assert!(engine.raw_score(a + delta) >= engine.raw_score(a));
    }

    #[test]
    fn other_levels_never_rise_as_reading_rises(a in -500f64..500.0, delta in 0f64..500.0) {
        let synth = maintenance();
        for rule in synth.rules().iter().skip(1) {
            prop_assert!(rule.raw_score(a + delta) <= rule.raw_score(a), "{}", rule.feature);
        }
    }
}

// --- Split and aggregation ---

proptest! {
    #[test]
    fn split_is_reproducible_and_complete(n in 2usize..300, seed in any::<u64>()) {
        let a = train_test_split(n, 0.3, seed).unwrap();
        let b = train_test_split(n, 0.3, seed).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.train.len() + a.test.len(), n);
        prop_assert!(!a.train.is_empty());
        prop_assert!(!a.test.is_empty());
    }

    #[test]
    fn group_mean_of_single_entity_is_plain_mean(values in prop::collection::vec(0u32..1000, 1..20)) {
        let ids = vec!["E1".to_string(); values.len()];
        let rows: Vec<Vec<f64>> = values.iter().map(|v| vec![*v as f64]).collect();
        let expected = values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64;
        let means = group_mean(&ids, &rows, 6);
        prop_assert_eq!(means.len(), 1);
        prop_assert!((means[0].scores[0] - expected).abs() < 1e-6);
    }
}
