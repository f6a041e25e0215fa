//! # Formats
//!
//! Transport formats for stage tables. Pure transformations, no file I/O.

mod persistence;

pub use persistence::*;
