//! # Stage Table
//!
//! The ordered list of stages and the classifier that walks it.
//!
//! ## Invariants
//!
//! - The table is non-empty.
//! - The first entry is the only catch-all ([`Reached::Always`]).
//! - Ids are strictly increasing, so table order is unlock order.
//!
//! A table that breaks any of these is rejected with
//! [`ProgressError::Configuration`] when it is built, whether in code or from
//! a transported form.
//!
//! ## Classification
//!
//! Stages are checked from the last entry backwards and the first one whose
//! predicate holds wins. Later predicates therefore see saves that have not
//! reached them, which is why every predicate must be total over any
//! well-formed save.

use super::stage::{Reached, StageDefinition, StageId};
use crate::snapshot::SaveSnapshot;
use crate::types::ProgressError;
use serde::{Deserialize, Serialize};

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Highest stage a save has reached, plus progress within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "stage_id")]
    pub stage: StageId,
    pub name: String,
    pub suggested_resource: String,
    /// Raw formula output. Not guaranteed to lie in `[0, 1]` and may be NaN.
    pub sub_progress: f64,
}

impl Classification {
    fn new(stage: &StageDefinition, sub_progress: f64) -> Self {
        Self {
            stage: stage.id,
            name: stage.name.to_string(),
            suggested_resource: stage.suggested_resource.to_string(),
            sub_progress,
        }
    }

    /// Integer id of the stage.
    #[must_use]
    pub fn stage_id(&self) -> u8 {
        self.stage.index()
    }

    /// Sub-progress clamped to `[0, 1]` for display. NaN reads as 0.
    #[must_use]
    pub fn display_progress(&self) -> f64 {
        if self.sub_progress.is_nan() {
            0.0
        } else {
            self.sub_progress.clamp(0.0, 1.0)
        }
    }
}

// =============================================================================
// CATCH-UP SUMMARY
// =============================================================================

/// Display strings for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub id: StageId,
    pub name: String,
    pub suggested_resource: String,
}

impl From<&StageDefinition> for StageSummary {
    fn from(stage: &StageDefinition) -> Self {
        Self {
            id: stage.id,
            name: stage.name.to_string(),
            suggested_resource: stage.suggested_resource.to_string(),
        }
    }
}

/// What the catch-up modal shows: where the save is and how it got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchUpSummary {
    pub current: Classification,
    /// Every stage up to and including `current`, earliest first.
    pub milestones: Vec<StageSummary>,
}

// =============================================================================
// TRANSPORT FORM
// =============================================================================

/// Serializable description of one table row.
///
/// Function pointers cannot cross a wire, so a transported table carries ids
/// and display strings; predicates are re-attached from the built-in
/// definitions on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub id: u8,
    pub name: String,
    pub suggested_resource: String,
    pub catch_all: bool,
}

impl From<&StageDefinition> for StageDescriptor {
    fn from(stage: &StageDefinition) -> Self {
        Self {
            id: stage.id.index(),
            name: stage.name.to_string(),
            suggested_resource: stage.suggested_resource.to_string(),
            catch_all: stage.reached.is_catch_all(),
        }
    }
}

impl TryFrom<&StageDescriptor> for StageDefinition {
    type Error = ProgressError;

    fn try_from(descriptor: &StageDescriptor) -> Result<Self, Self::Error> {
        let definition = StageId::try_from(descriptor.id)?.definition();

        if definition.name != descriptor.name {
            return Err(ProgressError::Configuration(format!(
                "Stage {} is named {:?}, expected {:?}",
                descriptor.id, descriptor.name, definition.name
            )));
        }
        if definition.reached.is_catch_all() != descriptor.catch_all {
            return Err(ProgressError::Configuration(format!(
                "Stage {} catch-all flag is {}, expected {}",
                descriptor.id,
                descriptor.catch_all,
                definition.reached.is_catch_all()
            )));
        }

        Ok(definition)
    }
}

// =============================================================================
// STAGE TABLE
// =============================================================================

/// Validated, immutable stage table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "Vec<StageDescriptor>", try_from = "Vec<StageDescriptor>")]
pub struct StageTable {
    stages: Vec<StageDefinition>,
}

impl StageTable {
    /// Build a table, checking every invariant.
    pub fn new(stages: Vec<StageDefinition>) -> Result<Self, ProgressError> {
        let first = stages
            .first()
            .ok_or_else(|| ProgressError::Configuration("Stage table is empty".to_string()))?;

        if !first.reached.is_catch_all() {
            return Err(ProgressError::Configuration(format!(
                "First stage ({}) must be a catch-all",
                first.id
            )));
        }

        for pair in stages.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            if later.id <= earlier.id {
                return Err(ProgressError::Configuration(format!(
                    "Stage ids must increase: {} follows {}",
                    later.id, earlier.id
                )));
            }
            if later.reached.is_catch_all() {
                return Err(ProgressError::Configuration(format!(
                    "Only the first stage may be a catch-all, found {}",
                    later.id
                )));
            }
        }

        Ok(Self { stages })
    }

    /// The full built-in table, one row per [`StageId`].
    ///
    /// Goes through [`StageTable::new`] like any other table, so a broken
    /// built-in definition surfaces as a configuration error.
    pub fn standard() -> Result<Self, ProgressError> {
        Self::new(StageId::ALL.iter().map(|id| id.definition()).collect())
    }

    /// Rows in unlock order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: StageId) -> Option<&StageDefinition> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    /// Transport form of every row.
    #[must_use]
    pub fn descriptors(&self) -> Vec<StageDescriptor> {
        self.stages.iter().map(StageDescriptor::from).collect()
    }

    /// Find the highest stage reached and its sub-progress.
    ///
    /// Returns `MalformedSave` if a predicate or the winning formula needs a
    /// field the save does not have.
    pub fn classify(&self, save: &SaveSnapshot) -> Result<Classification, ProgressError> {
        for stage in self.stages.iter().rev() {
            if stage.is_reached(save)? {
                let sub_progress = stage.sub_progress_value(save)?;
                tracing::debug!(stage = %stage.id, sub_progress, "classified save");
                return Ok(Classification::new(stage, sub_progress));
            }
        }

        Err(ProgressError::Configuration(
            "No stage matched the save; the table has no catch-all".to_string(),
        ))
    }

    /// Classification plus every milestone passed on the way.
    pub fn catch_up(&self, save: &SaveSnapshot) -> Result<CatchUpSummary, ProgressError> {
        let current = self.classify(save)?;
        let milestones = self
            .stages
            .iter()
            .take_while(|stage| stage.id <= current.stage)
            .map(StageSummary::from)
            .collect();

        Ok(CatchUpSummary {
            current,
            milestones,
        })
    }
}

impl From<StageTable> for Vec<StageDescriptor> {
    fn from(table: StageTable) -> Self {
        table.descriptors()
    }
}

impl TryFrom<Vec<StageDescriptor>> for StageTable {
    type Error = ProgressError;

    fn try_from(descriptors: Vec<StageDescriptor>) -> Result<Self, Self::Error> {
        let stages = descriptors
            .iter()
            .map(StageDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn never(_: &SaveSnapshot) -> Result<bool, ProgressError> {
        Ok(false)
    }

    fn zero(_: &SaveSnapshot) -> Result<f64, ProgressError> {
        Ok(0.0)
    }

    #[test]
    fn standard_table_is_valid() {
        let table = StageTable::standard().expect("standard table");
        assert_eq!(table.len(), StageId::ALL.len());
        assert!(StageTable::new(table.stages().to_vec()).is_ok());
    }

    #[test]
    fn standard_table_matches_checked_rebuild() {
        let table = StageTable::standard().expect("standard table");
        let rebuilt = StageTable::try_from(table.descriptors()).expect("rebuild");
        assert_eq!(rebuilt.descriptors(), table.descriptors());
        let ids: Vec<StageId> = table.stages().iter().map(|s| s.id).collect();
        assert_eq!(ids, StageId::ALL.to_vec());
    }

    #[test]
    fn empty_table_rejected() {
        let err = StageTable::new(Vec::new()).expect_err("empty");
        assert!(matches!(err, ProgressError::Configuration(_)));
    }

    #[test]
    fn missing_catch_all_rejected() {
        let stages = vec![StageId::EarlyInfinity.definition(), StageId::Pelle.definition()];
        assert!(StageTable::new(stages).is_err());
    }

    #[test]
    fn second_catch_all_rejected() {
        let stages = vec![
            StageId::PreInfinity.definition(),
            StageDefinition::new(StageId::Ra, Reached::Always, zero),
        ];
        assert!(StageTable::new(stages).is_err());
    }

    #[test]
    fn non_monotonic_ids_rejected() {
        let stages = vec![
            StageId::PreInfinity.definition(),
            StageId::Teresa.definition(),
            StageId::Replicanti.definition(),
        ];
        let err = StageTable::new(stages).expect_err("out of order");
        assert!(err.to_string().contains("must increase"));

        let duplicated = vec![
            StageId::PreInfinity.definition(),
            StageId::V.definition(),
            StageId::V.definition(),
        ];
        assert!(StageTable::new(duplicated).is_err());
    }

    #[test]
    fn sparse_table_is_valid() {
        let stages = vec![
            StageId::PreInfinity.definition(),
            StageId::Replicanti.definition(),
            StageId::Pelle.definition(),
        ];
        let table = StageTable::new(stages).expect("valid");
        assert!(table.get(StageId::Replicanti).is_some());
        assert!(table.get(StageId::Teresa).is_none());
    }

    #[test]
    fn zeroed_save_is_pre_infinity() {
        let result = StageTable::standard().expect("standard table")
            .classify(&SaveSnapshot::zeroed())
            .expect("classify");
        assert_eq!(result.stage, StageId::PreInfinity);
        assert_eq!(result.stage_id(), 0);
        assert_eq!(result.name, "Before Infinity");
        assert_eq!(result.suggested_resource, "Antimatter");
    }

    #[test]
    fn predicates_never_true_fall_back_to_catch_all() {
        let stages = vec![
            StageId::PreInfinity.definition(),
            StageDefinition::new(StageId::Pelle, Reached::When(never), zero),
        ];
        let table = StageTable::new(stages).expect("valid");
        let result = table.classify(&SaveSnapshot::zeroed()).expect("classify");
        assert_eq!(result.stage, StageId::PreInfinity);
    }

    #[test]
    fn missing_field_in_later_predicate_fails_fast() {
        let save = SaveSnapshot::from_value(json!({
            "antimatter": "1e100",
            "galaxies": 5,
            "dimensionBoosts": 2
        }))
        .expect("object");
        let err = StageTable::standard().expect("standard table").classify(&save).expect_err("missing");
        assert_eq!(err.path(), Some("celestials.pelle.doomed"));
    }

    #[test]
    fn display_progress_clamps() {
        let mut result = StageTable::standard().expect("standard table")
            .classify(&SaveSnapshot::zeroed())
            .expect("classify");

        result.sub_progress = 1.7;
        assert_eq!(result.display_progress(), 1.0);
        result.sub_progress = -0.2;
        assert_eq!(result.display_progress(), 0.0);
        result.sub_progress = f64::NAN;
        assert_eq!(result.display_progress(), 0.0);
        result.sub_progress = 0.4;
        assert_eq!(result.display_progress(), 0.4);
    }

    #[test]
    fn catch_up_lists_passed_milestones() {
        let save = SaveSnapshot::zeroed()
            .with("infinities", json!(3))
            .expect("set")
            .with("replicanti.unl", json!(true))
            .expect("set");
        let summary = StageTable::standard().expect("standard table").catch_up(&save).expect("catch up");

        assert_eq!(summary.current.stage, StageId::Replicanti);
        let ids: Vec<_> = summary.milestones.iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                StageId::PreInfinity,
                StageId::EarlyInfinity,
                StageId::BreakInfinity,
                StageId::Replicanti
            ]
        );
    }

    #[test]
    fn classification_serializes_integer_stage_id() {
        let save = SaveSnapshot::zeroed()
            .with("eternities", json!("12"))
            .expect("set");
        let result = StageTable::standard()
            .expect("standard table")
            .classify(&save)
            .expect("classify");

        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["stage_id"], json!(StageId::EarlyEternity.index()));
        assert!(value.get("stage").is_none());

        let restored: Classification = serde_json::from_value(value).expect("deserialize");
        assert_eq!(restored, result);
    }

    #[test]
    fn catch_up_serializes_integer_ids() {
        let save = SaveSnapshot::zeroed()
            .with("infinities", json!(3))
            .expect("set");
        let summary = StageTable::standard()
            .expect("standard table")
            .catch_up(&save)
            .expect("catch up");

        let value = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(value["current"]["stage_id"], json!(1));
        assert_eq!(value["milestones"][0]["id"], json!(0));
        assert_eq!(value["milestones"][1]["id"], json!(1));
    }

    #[test]
    fn descriptor_with_wrong_name_rejected() {
        let mut descriptors = StageTable::standard().expect("standard table").descriptors();
        descriptors[3].name = "Replicator".to_string();
        assert!(StageTable::try_from(descriptors).is_err());
    }

    #[test]
    fn descriptor_with_unknown_id_rejected() {
        let mut descriptors = StageTable::standard().expect("standard table").descriptors();
        descriptors.push(StageDescriptor {
            id: 42,
            name: "Beyond".to_string(),
            suggested_resource: "Nothing".to_string(),
            catch_all: false,
        });
        let err = StageTable::try_from(descriptors).expect_err("unknown id");
        assert!(err.to_string().contains("Unknown stage id: 42"));
    }

    #[test]
    fn descriptor_dropping_catch_all_rejected() {
        let mut descriptors = StageTable::standard().expect("standard table").descriptors();
        descriptors[0].catch_all = false;
        assert!(StageTable::try_from(descriptors).is_err());
    }
}
