//! # Save Comparison
//!
//! Decide which of two saves (typically local and cloud) is further along.
//!
//! A save that cannot be classified makes the comparison unavailable instead
//! of failing: the caller shows "cannot compare" and keeps running.

use crate::primitives::PROGRESS_TOLERANCE;
use crate::{Classification, SaveSnapshot, StageTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of comparing two saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    LocalAhead,
    CloudAhead,
    Equivalent,
    Unavailable { reason: String },
}

/// Both classifications (when available) and the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveComparison {
    pub local: Option<Classification>,
    pub cloud: Option<Classification>,
    pub outcome: ComparisonOutcome,
}

/// Order two classifications: stage first, then clamped sub-progress.
#[must_use]
pub fn order_classifications(a: &Classification, b: &Classification) -> Ordering {
    a.stage.cmp(&b.stage).then_with(|| {
        let diff = a.display_progress() - b.display_progress();
        if diff.abs() <= PROGRESS_TOLERANCE {
            Ordering::Equal
        } else if diff > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    })
}

/// Compare a local save against a cloud save.
pub fn compare_saves(table: &StageTable, local: &SaveSnapshot, cloud: &SaveSnapshot) -> SaveComparison {
    let local_result = table.classify(local);
    let cloud_result = table.classify(cloud);

    let outcome = match (&local_result, &cloud_result) {
        (Ok(l), Ok(c)) => match order_classifications(l, c) {
            Ordering::Greater => ComparisonOutcome::LocalAhead,
            Ordering::Less => ComparisonOutcome::CloudAhead,
            Ordering::Equal => ComparisonOutcome::Equivalent,
        },
        (Err(e), _) => {
            tracing::warn!(error = %e, "local save cannot be classified");
            ComparisonOutcome::Unavailable {
                reason: format!("local save: {}", e),
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "cloud save cannot be classified");
            ComparisonOutcome::Unavailable {
                reason: format!("cloud save: {}", e),
            }
        }
    };

    SaveComparison {
        local: local_result.ok(),
        cloud: cloud_result.ok(),
        outcome,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageId;
    use serde_json::json;

    fn save(fields: &[(&str, serde_json::Value)]) -> SaveSnapshot {
        fields
            .iter()
            .fold(SaveSnapshot::zeroed(), |s, (path, value)| {
                s.with(path, value.clone()).expect("set")
            })
    }

    #[test]
    fn higher_stage_wins() {
        let table = StageTable::standard().expect("standard table");
        let local = save(&[("eternities", json!("4"))]);
        let cloud = save(&[("infinities", json!("1e6")), ("galaxies", json!(40))]);

        let result = compare_saves(&table, &local, &cloud);
        assert_eq!(result.outcome, ComparisonOutcome::LocalAhead);
        assert!(result.local.is_some() && result.cloud.is_some());

        let swapped = compare_saves(&table, &cloud, &local);
        assert_eq!(swapped.outcome, ComparisonOutcome::CloudAhead);
    }

    #[test]
    fn same_stage_breaks_tie_on_progress() {
        let table = StageTable::standard().expect("standard table");
        let local = save(&[("galaxies", json!(1))]);
        let cloud = save(&[("galaxies", json!(2))]);

        let result = compare_saves(&table, &local, &cloud);
        assert_eq!(result.outcome, ComparisonOutcome::CloudAhead);
    }

    #[test]
    fn overshoot_is_clamped_before_comparing() {
        let table = StageTable::standard().expect("standard table");
        // Both exceed 1.0 raw, so both display as full.
        let local = save(&[("galaxies", json!(5))]);
        let cloud = save(&[("galaxies", json!(9))]);

        let result = compare_saves(&table, &local, &cloud);
        assert_eq!(result.outcome, ComparisonOutcome::Equivalent);
    }

    #[test]
    fn malformed_save_makes_comparison_unavailable() {
        let table = StageTable::standard().expect("standard table");
        let local = SaveSnapshot::zeroed();
        let cloud = SaveSnapshot::from_value(json!({ "antimatter": "1e10" })).expect("object");

        let result = compare_saves(&table, &local, &cloud);
        match &result.outcome {
            ComparisonOutcome::Unavailable { reason } => {
                assert!(reason.starts_with("cloud save"), "{reason}");
                assert!(reason.contains("celestials.pelle.doomed"), "{reason}");
            }
            other => unreachable!("expected unavailable, got {other:?}"),
        }
        assert!(result.local.is_some());
        assert!(result.cloud.is_none());
    }

    #[test]
    fn comparison_carries_integer_stage_ids() {
        let table = StageTable::standard().expect("standard table");
        let local = save(&[("realities", json!(12))]);
        let result = compare_saves(&table, &local, &SaveSnapshot::zeroed());

        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["local"]["stage_id"], json!(StageId::EarlyReality.index()));
        assert_eq!(value["cloud"]["stage_id"], json!(0));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_string(&ComparisonOutcome::Unavailable {
            reason: "x".to_string(),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"outcome":"unavailable","reason":"x"}"#);
    }
}
