//! # System Module
//!
//! Progress stages and the table that classifies saves against them.
//!
//! - `stage`: the stage ids, their records, predicates and formulas
//! - `table`: the validated table, the classifier, catch-up summaries and the
//!   transport form of a table

mod stage;
mod table;

pub use stage::*;
pub use table::*;
