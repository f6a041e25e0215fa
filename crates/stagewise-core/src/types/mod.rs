//! # Core Type Definitions
//!
//! Error types shared by every Stagewise module.
//!
//! ## Error Kinds
//!
//! - `Configuration`: the stage table itself is broken (no catch-all,
//!   non-monotonic ids, unknown ids in a transported table). Fatal at startup.
//! - `MalformedSave`: a save snapshot lacks a field, or holds the wrong kind of
//!   value, at a path a predicate or sub-progress formula needs. Recoverable:
//!   callers report the classification as unavailable.
//! - `Serialization` / `Deserialization` / `Io`: transport and app-layer
//!   failures.

use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Stagewise system.
///
/// - No silent failures: a missing save field is never coerced to zero
/// - Use `Result<T, ProgressError>` for fallible operations
/// - The CORE never panics; all errors are returned to the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    /// The stage table is malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The save snapshot is missing a field, or the field has the wrong shape.
    #[error("Malformed save at `{path}`: {reason}")]
    MalformedSave { path: String, reason: String },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ProgressError {
    /// A required path is absent from the snapshot.
    #[must_use]
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MalformedSave {
            path: path.into(),
            reason: "missing field".to_string(),
        }
    }

    /// A path is present but its value cannot be used.
    #[must_use]
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from the save rather than the table or I/O.
    #[must_use]
    pub fn is_malformed_save(&self) -> bool {
        matches!(self, Self::MalformedSave { .. })
    }

    /// The offending path for `MalformedSave`, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MalformedSave { path, .. } => Some(path),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
