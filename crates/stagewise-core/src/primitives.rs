//! # Primitives
//!
//! Hardcoded constants for the Stagewise CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Magic bytes for the binary stage-table format header.
///
/// - File Header = Magic Bytes ("STGW") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"STGW";

/// Current stage-table format version.
///
/// Increment this when making breaking changes to `StageDescriptor`.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed payload size for a transported stage table (1 MB).
///
/// A real table is a few hundred bytes; anything larger is rejected before
/// deserialization.
pub const MAX_TABLE_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Big Crunch autobuyer interval of a fresh save, in milliseconds.
///
/// Also the reference point of the Infinity sub-progress formula.
pub const CRUNCH_INTERVAL_START_MS: f64 = 150_000.0;

/// Crunch interval at or below which Infinity counts as broken.
pub const BREAK_INFINITY_INTERVAL_MS: u32 = 100;

/// Two sub-progress values closer than this compare as equal.
pub const PROGRESS_TOLERANCE: f64 = 1e-9;
