//! # stagewise-core
//!
//! The progress classifier for Stagewise - THE LOGIC.
//!
//! Given a save snapshot, this crate finds the highest progress stage the save
//! has reached and a continuous sub-progress value inside that stage. The
//! result drives the catch-up modal and local/cloud save comparison.
//!
//! ## Architectural Constraints
//!
//! - Pure: no I/O, no global state; the save is always an explicit argument
//! - Static: the stage table is built once and never mutated
//! - Large quantities go through [`Decimal`] (`break_infinity`), never raw `f64`
//! - No panics; every failure is a [`ProgressError`]
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use stagewise_core::{SaveSnapshot, StageId, StageTable};
//!
//! let save = SaveSnapshot::zeroed()
//!     .with("infinities", json!("600"))?
//!     .with("auto.bigCrunch.interval", json!(100))?;
//!
//! let result = StageTable::standard()?.classify(&save)?;
//! assert!(result.stage >= StageId::EarlyInfinity);
//! # Ok::<(), stagewise_core::ProgressError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod compare;
pub mod formats;
pub mod primitives;
pub mod snapshot;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use break_infinity::Decimal;
pub use snapshot::{SaveSnapshot, parse_decimal};
pub use types::ProgressError;

// =============================================================================
// RE-EXPORTS: Classification
// =============================================================================

pub use compare::{ComparisonOutcome, SaveComparison, compare_saves};
pub use system::{
    CatchUpSummary, Classification, PredicateFn, Reached, StageDefinition, StageDescriptor,
    StageId, StageSummary, StageTable, SubProgressFn,
};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{
    TableHeader, is_binary_table, table_from_bytes, table_from_json, table_to_bytes,
    table_to_json,
};
