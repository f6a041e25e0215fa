//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the classifier is INVALID.
//!
//! ## Tiers
//! - T0: Snapshot Normalization
//! - T1: Stage Table Integrity
//! - T2: Classification
//! - T3: Comparison and Catch-Up

use serde_json::{Value, json};
use stagewise_core::{
    ComparisonOutcome, Decimal, ProgressError, SaveSnapshot, StageId, StageTable, compare_saves,
};

fn save_with(fields: &[(&str, Value)]) -> SaveSnapshot {
    fields
        .iter()
        .fold(SaveSnapshot::zeroed(), |save, (path, value)| {
            save.with(path, value.clone()).expect("set field")
        })
}

// =============================================================================
// TIER T0: SNAPSHOT NORMALIZATION
// =============================================================================

mod t0_snapshot_normalization {
    use super::*;

    /// T0.1: String and numeric encodings of the same quantity agree.
    #[test]
    fn string_and_number_agree() {
        let as_string = save_with(&[("infinities", json!("600"))]);
        let as_number = save_with(&[("infinities", json!(600))]);

        assert_eq!(
            as_string.decimal("infinities").expect("string"),
            as_number.decimal("infinities").expect("number")
        );
    }

    /// T0.2: Quantities beyond f64 keep their magnitude.
    #[test]
    fn huge_quantities_do_not_saturate() {
        let save = save_with(&[("eternityPoints", json!("1.8e308000"))]);
        let ep = save.decimal("eternityPoints").expect("read");

        assert!(ep.log10().is_finite());
        assert!(ep.gt(&"1e308".parse::<Decimal>().expect("parse")));
    }

    /// T0.3: A cloud save parsed from text classifies like the in-memory one.
    #[test]
    fn parsed_text_matches_in_memory() {
        let in_memory = save_with(&[("eternities", json!("12"))]);
        let text = serde_json::to_string(in_memory.as_value()).expect("serialize");
        let parsed = SaveSnapshot::from_json_str(&text).expect("parse");

        let table = StageTable::standard().expect("standard table");
        assert_eq!(
            table.classify(&in_memory).expect("classify"),
            table.classify(&parsed).expect("classify")
        );
    }

    /// T0.4: Missing fields are errors, never zeros.
    #[test]
    fn missing_field_is_not_zero() {
        let save = SaveSnapshot::from_value(json!({ "galaxies": 3 })).expect("object");
        assert!(matches!(
            save.number("dimensionBoosts"),
            Err(ProgressError::MalformedSave { .. })
        ));
    }
}

// =============================================================================
// TIER T1: STAGE TABLE INTEGRITY
// =============================================================================

mod t1_table_integrity {
    use super::*;

    /// T1.1: The first stage is the only catch-all.
    #[test]
    fn single_leading_catch_all() {
        let table = StageTable::standard().expect("standard table");
        let catch_alls: Vec<_> = table
            .stages()
            .iter()
            .filter(|s| s.reached.is_catch_all())
            .map(|s| s.id)
            .collect();
        assert_eq!(catch_alls, vec![StageId::PreInfinity]);
    }

    /// T1.2: Table order is id order.
    #[test]
    fn ids_strictly_increase() {
        let table = StageTable::standard().expect("standard table");
        assert!(table.stages().windows(2).all(|w| w[0].id < w[1].id));
    }

    /// T1.3: A broken table is a configuration error, not a save error.
    #[test]
    fn broken_table_is_configuration_error() {
        let err = StageTable::new(vec![StageId::Pelle.definition()]).expect_err("no catch-all");
        assert!(matches!(err, ProgressError::Configuration(_)));
        assert!(!err.is_malformed_save());
    }
}

// =============================================================================
// TIER T2: CLASSIFICATION
// =============================================================================

mod t2_classification {
    use super::*;

    /// T2.1: The default snapshot is stage 0.
    #[test]
    fn default_snapshot_is_stage_zero() {
        let result = StageTable::standard().expect("standard table")
            .classify(&SaveSnapshot::zeroed())
            .expect("classify");
        assert_eq!(result.stage_id(), 0);
    }

    /// T2.2: Before Infinity, five galaxies and two boosts overshoot 1.
    #[test]
    fn pre_infinity_example() {
        let save = save_with(&[
            ("infinities", json!(0)),
            ("galaxies", json!(5)),
            ("dimensionBoosts", json!(2)),
            ("antimatter", json!("1e100")),
        ]);
        let result = StageTable::standard().expect("standard table").classify(&save).expect("classify");

        assert_eq!(result.stage, StageId::PreInfinity);
        assert!((result.sub_progress - 1.696).abs() < 1e-3, "{}", result.sub_progress);
        assert!(result.sub_progress > 1.0);
        assert_eq!(result.display_progress(), 1.0);
    }

    /// T2.3: String-valued infinities reach at least the Infinity stage.
    #[test]
    fn string_infinities_example() {
        let save = save_with(&[
            ("infinities", json!("600")),
            ("auto.bigCrunch.interval", json!(100)),
        ]);
        let result = StageTable::standard().expect("standard table").classify(&save).expect("classify");

        assert!(result.stage >= StageId::EarlyInfinity);
        // An interval of 100ms also means Infinity is broken.
        assert_eq!(result.stage, StageId::BreakInfinity);
    }

    /// T2.4: Each celestial gate lands on its own stage.
    #[test]
    fn celestial_gates() {
        let cases = [
            ("celestials.teresa.quotes", json!(1), StageId::Teresa),
            ("celestials.effarig.quotes", json!(1), StageId::Effarig),
            ("celestials.enslaved.quotes", json!(1), StageId::Enslaved),
            ("celestials.v.quotes", json!(1), StageId::V),
            ("celestials.ra.quotes", json!(1), StageId::Ra),
            ("reality.iMCap", json!(1000), StageId::ImaginaryMachines),
            ("celestials.laitela.quotes", json!(1), StageId::Laitela),
            ("celestials.pelle.doomed", json!(true), StageId::Pelle),
        ];

        for (path, value, expected) in cases {
            let save = save_with(&[(path, value)]);
            let result = StageTable::standard().expect("standard table").classify(&save).expect("classify");
            assert_eq!(result.stage, expected, "{path}");
            assert_eq!(result.name, expected.name());
            assert_eq!(result.suggested_resource, expected.suggested_resource());
        }
    }

    /// T2.5: A late save reports its stage with a finite sub-progress.
    #[test]
    fn late_game_save() {
        let save = save_with(&[
            ("realities", json!(5000)),
            ("reality.realityMachines", json!("1e1000")),
            ("celestials.laitela.quotes", json!(4)),
            ("celestials.laitela.darkMatter", json!("1e200")),
        ]);
        let result = StageTable::standard().expect("standard table").classify(&save).expect("classify");

        assert_eq!(result.stage, StageId::Laitela);
        assert!((result.sub_progress - 200.0 / 308.25).abs() < 1e-9);
    }
}

// =============================================================================
// TIER T3: COMPARISON AND CATCH-UP
// =============================================================================

mod t3_comparison {
    use super::*;

    /// T3.1: A malformed cloud save is reported, not fatal.
    #[test]
    fn malformed_cloud_save_unavailable() {
        let table = StageTable::standard().expect("standard table");
        let cloud = SaveSnapshot::from_json_str(r#"{"antimatter":"1e50"}"#).expect("parse");
        let result = compare_saves(&table, &SaveSnapshot::zeroed(), &cloud);

        assert!(matches!(result.outcome, ComparisonOutcome::Unavailable { .. }));
    }

    /// T3.2: Identical saves are equivalent.
    #[test]
    fn identical_saves_equivalent() {
        let table = StageTable::standard().expect("standard table");
        let save = save_with(&[("eternities", json!(1)), ("eternityPoints", json!("1e9"))]);
        let result = compare_saves(&table, &save, &save.clone());

        assert_eq!(result.outcome, ComparisonOutcome::Equivalent);
    }

    /// T3.3: Catch-up milestones end at the current stage.
    #[test]
    fn catch_up_ends_at_current_stage() {
        let save = save_with(&[("dilation.dilatedTime", json!("1e20"))]);
        let summary = StageTable::standard().expect("standard table").catch_up(&save).expect("catch up");

        assert_eq!(summary.current.stage, StageId::LateEternity);
        assert_eq!(summary.milestones.len(), 8);
        assert_eq!(
            summary.milestones.last().map(|m| m.id),
            Some(StageId::LateEternity)
        );
    }
}
