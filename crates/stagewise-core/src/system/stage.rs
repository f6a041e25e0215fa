//! # Progress Stages
//!
//! The seventeen milestones a save moves through, earliest first.
//!
//! Each stage is a small tagged record ([`StageDefinition`]): an id, display
//! strings, a "reached" predicate and a sub-progress formula. Predicates and
//! formulas are plain function pointers over a [`SaveSnapshot`]; they never
//! read global state.
//!
//! ## Stage Definitions
//!
//! | Id | Stage | Reached when |
//! |----|-------|--------------|
//! | 0 | Before Infinity | always (catch-all) |
//! | 1 | Infinity | `infinities > 0` |
//! | 2 | Broken Infinity | crunch interval ≤ 100 ms |
//! | 3 | Replicanti | Replicanti unlocked |
//! | 4 | Eternity | `eternities > 0` |
//! | 5 | Eternity Challenges | EC1 completed at least once |
//! | 6 | Time Dilation | dilated time > 0 |
//! | 7 | Late Eternity | dilated time > 1e15 |
//! | 8 | Reality | `realities > 0` |
//! | 9-13 | Teresa, Effarig, Enslaved, V, Ra | celestial quotes seen |
//! | 14 | Imaginary Machines | iM cap > 0 |
//! | 15 | Lai'tela | celestial quotes seen |
//! | 16 | Pelle | doomed |
//!
//! ## Sub-Progress Range
//!
//! Sub-progress values are meant to land in `[0, 1]`: near 0 just after the
//! previous stage, near 1 just before the next. The formulas are not bounded,
//! though. A Before-Infinity save with five galaxies scores about 1.7, and a
//! freshly reached Replicanti save takes the square root of a negative number
//! (NaN). Values are returned as computed; display code clamps them with
//! [`Classification::display_progress`](super::Classification::display_progress).

use break_infinity::Decimal;
use crate::primitives::{BREAK_INFINITY_INTERVAL_MS, CRUNCH_INTERVAL_START_MS};
use crate::snapshot::SaveSnapshot;
use crate::types::ProgressError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SAVE PATHS
// =============================================================================

const ANTIMATTER: &str = "antimatter";
const GALAXIES: &str = "galaxies";
const DIMENSION_BOOSTS: &str = "dimensionBoosts";
const INFINITIES: &str = "infinities";
const INFINITY_POINTS: &str = "infinityPoints";
const CRUNCH_INTERVAL: &str = "auto.bigCrunch.interval";
const REPLICANTI_UNLOCKED: &str = "replicanti.unl";
const ETERNITIES: &str = "eternities";
const ETERNITY_POINTS: &str = "eternityPoints";
const ETERNITY_CHALLENGES: &str = "eternityChalls";
const DILATED_TIME: &str = "dilation.dilatedTime";
const REALITIES: &str = "realities";
const REALITY_MACHINES: &str = "reality.realityMachines";
const IMAGINARY_MACHINE_CAP: &str = "reality.iMCap";
const TERESA_QUOTES: &str = "celestials.teresa.quotes";
const TERESA_POURED: &str = "celestials.teresa.pouredAmount";
const EFFARIG_QUOTES: &str = "celestials.effarig.quotes";
const EFFARIG_RELIC_SHARDS: &str = "celestials.effarig.relicShards";
const ENSLAVED_QUOTES: &str = "celestials.enslaved.quotes";
const V_QUOTES: &str = "celestials.v.quotes";
const V_RUN_UNLOCKS: &str = "celestials.v.runUnlocks";
const RA_QUOTES: &str = "celestials.ra.quotes";
const RA_PETS: &str = "celestials.ra.pets";
const LAITELA_QUOTES: &str = "celestials.laitela.quotes";
const LAITELA_DARK_MATTER: &str = "celestials.laitela.darkMatter";
const PELLE_DOOMED: &str = "celestials.pelle.doomed";
const PELLE_REMNANTS: &str = "celestials.pelle.remnants";

/// Dilated time past which Eternity is considered "late".
const LATE_ETERNITY_DILATED_TIME: f64 = 1e15;

/// Infinities past this count add nothing to Infinity sub-progress.
const EARLY_INFINITY_COUNT_CAP: f64 = 500.0;

// =============================================================================
// STAGE ID
// =============================================================================

/// Progress stages in unlock order.
///
/// Serialized as the integer id, never the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum StageId {
    PreInfinity = 0,
    EarlyInfinity = 1,
    BreakInfinity = 2,
    Replicanti = 3,
    EarlyEternity = 4,
    EternityChallenges = 5,
    EarlyDilation = 6,
    LateEternity = 7,
    EarlyReality = 8,
    Teresa = 9,
    Effarig = 10,
    Enslaved = 11,
    V = 12,
    Ra = 13,
    ImaginaryMachines = 14,
    Laitela = 15,
    Pelle = 16,
}

impl StageId {
    /// Every stage, earliest first.
    pub const ALL: [StageId; 17] = [
        StageId::PreInfinity,
        StageId::EarlyInfinity,
        StageId::BreakInfinity,
        StageId::Replicanti,
        StageId::EarlyEternity,
        StageId::EternityChallenges,
        StageId::EarlyDilation,
        StageId::LateEternity,
        StageId::EarlyReality,
        StageId::Teresa,
        StageId::Effarig,
        StageId::Enslaved,
        StageId::V,
        StageId::Ra,
        StageId::ImaginaryMachines,
        StageId::Laitela,
        StageId::Pelle,
    ];

    /// Numeric id, as stored in saves and transported tables.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StageId::PreInfinity => "Before Infinity",
            StageId::EarlyInfinity => "Infinity",
            StageId::BreakInfinity => "Broken Infinity",
            StageId::Replicanti => "Replicanti",
            StageId::EarlyEternity => "Eternity",
            StageId::EternityChallenges => "Eternity Challenges",
            StageId::EarlyDilation => "Time Dilation",
            StageId::LateEternity => "Late Eternity",
            StageId::EarlyReality => "Reality",
            StageId::Teresa => "Teresa (1st Celestial)",
            StageId::Effarig => "Effarig (2nd Celestial)",
            StageId::Enslaved => "The Enslaved Ones (3rd Celestial)",
            StageId::V => "V (4th Celestial)",
            StageId::Ra => "Ra (5th Celestial)",
            StageId::ImaginaryMachines => "Imaginary Machines",
            StageId::Laitela => "Lai'tela (6th Celestial)",
            StageId::Pelle => "Pelle (7th Celestial)",
        }
    }

    /// Resource(s) worth aiming for at this stage.
    #[must_use]
    pub fn suggested_resource(&self) -> &'static str {
        match self {
            StageId::PreInfinity => "Antimatter",
            StageId::EarlyInfinity | StageId::BreakInfinity | StageId::Replicanti => {
                "Infinity Points"
            }
            StageId::EarlyEternity => "Eternity Points",
            StageId::EternityChallenges => "Eternity Challenge Completions and Eternity Points",
            StageId::EarlyDilation => "Dilated Time",
            StageId::LateEternity => "Eternity Points and Dilated Time",
            StageId::EarlyReality | StageId::Teresa => "Reality Machines",
            StageId::Effarig => "Reality Machines and Relic Shards",
            StageId::Enslaved => "Reality Machines and Glyph Level",
            StageId::V => "Number of V-Achievements",
            StageId::Ra => "Celestial Memories",
            StageId::ImaginaryMachines => "Imaginary Machines",
            StageId::Laitela => "Dark Matter and Singularities",
            StageId::Pelle => "Remnants",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<StageId> {
        StageId::try_from(self.index().saturating_add(1)).ok()
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<StageId> {
        self.index()
            .checked_sub(1)
            .and_then(|i| StageId::try_from(i).ok())
    }

    /// Check if this stage is terminal (Pelle).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageId::Pelle)
    }

    /// The built-in record for this stage.
    #[must_use]
    pub fn definition(self) -> StageDefinition {
        StageDefinition::new(self, self.reached(), self.sub_progress_fn())
    }

    fn reached(self) -> Reached {
        let predicate: PredicateFn = match self {
            StageId::PreInfinity => return Reached::Always,
            StageId::EarlyInfinity => has_infinities,
            StageId::BreakInfinity => has_broken_infinity,
            StageId::Replicanti => has_replicanti,
            StageId::EarlyEternity => has_eternities,
            StageId::EternityChallenges => has_eternity_challenges,
            StageId::EarlyDilation => has_dilated_time,
            StageId::LateEternity => has_late_eternity,
            StageId::EarlyReality => has_realities,
            StageId::Teresa => met_teresa,
            StageId::Effarig => met_effarig,
            StageId::Enslaved => met_enslaved,
            StageId::V => met_v,
            StageId::Ra => met_ra,
            StageId::ImaginaryMachines => has_imaginary_machines,
            StageId::Laitela => met_laitela,
            StageId::Pelle => is_doomed,
        };
        Reached::When(predicate)
    }

    fn sub_progress_fn(self) -> SubProgressFn {
        match self {
            StageId::PreInfinity => pre_infinity_progress,
            StageId::EarlyInfinity => early_infinity_progress,
            StageId::BreakInfinity => break_infinity_progress,
            StageId::Replicanti => replicanti_progress,
            StageId::EarlyEternity => early_eternity_progress,
            StageId::EternityChallenges => eternity_challenges_progress,
            StageId::EarlyDilation => early_dilation_progress,
            StageId::LateEternity => late_eternity_progress,
            StageId::EarlyReality => early_reality_progress,
            StageId::Teresa => teresa_progress,
            StageId::Effarig => effarig_progress,
            StageId::Enslaved => enslaved_progress,
            StageId::V => v_progress,
            StageId::Ra => ra_progress,
            StageId::ImaginaryMachines => imaginary_machines_progress,
            StageId::Laitela => laitela_progress,
            StageId::Pelle => pelle_progress,
        }
    }
}

impl From<StageId> for u8 {
    fn from(id: StageId) -> Self {
        id.index()
    }
}

impl TryFrom<u8> for StageId {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StageId::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| ProgressError::Configuration(format!("Unknown stage id: {}", value)))
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index(), self.name())
    }
}

// =============================================================================
// STAGE DEFINITION
// =============================================================================

/// Pure predicate over a save.
pub type PredicateFn = fn(&SaveSnapshot) -> Result<bool, ProgressError>;

/// Pure sub-progress formula over a save.
pub type SubProgressFn = fn(&SaveSnapshot) -> Result<f64, ProgressError>;

/// When a stage counts as reached.
#[derive(Clone, Copy)]
pub enum Reached {
    /// Catch-all: every save has reached this stage.
    Always,
    /// Reached when the predicate holds.
    When(PredicateFn),
}

impl Reached {
    pub fn evaluate(&self, save: &SaveSnapshot) -> Result<bool, ProgressError> {
        match self {
            Reached::Always => Ok(true),
            Reached::When(predicate) => predicate(save),
        }
    }

    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Reached::Always)
    }
}

impl fmt::Debug for Reached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reached::Always => f.write_str("Always"),
            Reached::When(_) => f.write_str("When(..)"),
        }
    }
}

/// One row of the stage table.
#[derive(Clone, Copy)]
pub struct StageDefinition {
    pub id: StageId,
    pub name: &'static str,
    pub suggested_resource: &'static str,
    pub reached: Reached,
    pub sub_progress: SubProgressFn,
}

impl StageDefinition {
    /// A record carrying the stage's built-in name and resource.
    #[must_use]
    pub fn new(id: StageId, reached: Reached, sub_progress: SubProgressFn) -> Self {
        Self {
            id,
            name: id.name(),
            suggested_resource: id.suggested_resource(),
            reached,
            sub_progress,
        }
    }

    pub fn is_reached(&self, save: &SaveSnapshot) -> Result<bool, ProgressError> {
        self.reached.evaluate(save)
    }

    pub fn sub_progress_value(&self, save: &SaveSnapshot) -> Result<f64, ProgressError> {
        (self.sub_progress)(save)
    }
}

impl fmt::Debug for StageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("suggested_resource", &self.suggested_resource)
            .field("reached", &self.reached)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

fn positive(save: &SaveSnapshot, path: &str) -> Result<bool, ProgressError> {
    Ok(save.decimal(path)?.gt(&Decimal::ZERO))
}

fn has_infinities(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, INFINITIES)
}

fn has_broken_infinity(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    Ok(save
        .decimal(CRUNCH_INTERVAL)?
        .le(&Decimal::from(BREAK_INFINITY_INTERVAL_MS)))
}

fn has_replicanti(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    save.flag(REPLICANTI_UNLOCKED)
}

fn has_eternities(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, ETERNITIES)
}

fn has_eternity_challenges(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    Ok(save
        .entry(ETERNITY_CHALLENGES, "eterc1")?
        .gt(&Decimal::ZERO))
}

fn has_dilated_time(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, DILATED_TIME)
}

fn has_late_eternity(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    Ok(save
        .decimal(DILATED_TIME)?
        .gt(&Decimal::new(LATE_ETERNITY_DILATED_TIME)))
}

fn has_realities(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, REALITIES)
}

fn met_teresa(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, TERESA_QUOTES)
}

fn met_effarig(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, EFFARIG_QUOTES)
}

fn met_enslaved(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, ENSLAVED_QUOTES)
}

fn met_v(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, V_QUOTES)
}

fn met_ra(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, RA_QUOTES)
}

fn has_imaginary_machines(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, IMAGINARY_MACHINE_CAP)
}

fn met_laitela(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    positive(save, LAITELA_QUOTES)
}

fn is_doomed(save: &SaveSnapshot) -> Result<bool, ProgressError> {
    save.flag(PELLE_DOOMED)
}

// =============================================================================
// SUB-PROGRESS FORMULAS
// =============================================================================

/// `log10(1 + x)` for quantities that fit in `f64`.
fn log1p10(save: &SaveSnapshot, path: &str) -> Result<f64, ProgressError> {
    Ok((1.0 + save.number(path)?).log10())
}

// Galaxies are worth a third each, boosts break ties within galaxies and
// antimatter breaks ties within boosts.
fn pre_infinity_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(0.33 * save.number(GALAXIES)?
        + 0.02 * save.number(DIMENSION_BOOSTS)?
        + save.decimal(ANTIMATTER)?.log10() / 16000.0)
}

// Half from the infinity count, half from the crunch autobuyer interval.
fn early_infinity_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    let infinities = save
        .decimal(INFINITIES)?
        .min(&Decimal::new(EARLY_INFINITY_COUNT_CAP))
        .to_number();
    let interval = save.number(CRUNCH_INTERVAL)?;
    Ok(infinities / 1000.0 + (CRUNCH_INTERVAL_START_MS / interval).log10() / 6.35)
}

fn break_infinity_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok((save.decimal(INFINITY_POINTS)?.log10() / 145.0).sqrt())
}

fn replicanti_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(((save.decimal(INFINITY_POINTS)?.log10() - 140.0) / 170.0).sqrt())
}

fn early_eternity_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok((save.decimal(ETERNITY_POINTS)?.p_log10() / 18.0).sqrt())
}

// Half from challenge completions, half from EP (up to e1300).
fn eternity_challenges_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(0.008 * save.sum(ETERNITY_CHALLENGES)? + save.decimal(ETERNITY_POINTS)?.log10() / 2500.0)
}

fn early_dilation_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(save.decimal(DILATED_TIME)?.log10() / 15.0)
}

// Tracks EP up to e8000 so saves stay distinguishable right up to the first
// reality.
fn late_eternity_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(((save.decimal(ETERNITY_POINTS)?.log10() - 1300.0) / 6700.0).sqrt())
}

fn early_reality_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok((save.decimal(REALITY_MACHINES)?.p_log10() / 6.0).sqrt())
}

fn teresa_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(log1p10(save, TERESA_POURED)? / 21.0)
}

fn effarig_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(log1p10(save, EFFARIG_RELIC_SHARDS)? / 14.0)
}

fn enslaved_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(((save.decimal(REALITY_MACHINES)?.log10() - 30.0) / 30.0).sqrt())
}

fn v_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(0.0277 * save.sum(V_RUN_UNLOCKS)?)
}

fn ra_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(save.sum_field(RA_PETS, "level")? / 100.0)
}

fn imaginary_machines_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(log1p10(save, IMAGINARY_MACHINE_CAP)? / 9.0)
}

fn laitela_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(save.decimal(LAITELA_DARK_MATTER)?.log10() / 308.25)
}

fn pelle_progress(save: &SaveSnapshot) -> Result<f64, ProgressError> {
    Ok(log1p10(save, PELLE_REMNANTS)? / 9.0)
}

// =============================================================================
// TESTS
// =============================================================================
