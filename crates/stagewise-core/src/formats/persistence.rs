//! # Stage-Table Persistence Format
//!
//! Binary and JSON serialization for stage tables.
//!
//! File I/O operations are in the app layer.
//!
//! Binary format: Header (5 bytes) + postcard-serialized `Vec<StageDescriptor>`.
//! - 4 bytes: Magic ("STGW")
//! - 1 byte: Version
//!
//! ## Validation
//!
//! - Maximum payload size (`MAX_TABLE_PAYLOAD_SIZE`) is checked first
//! - Header is checked before the payload is parsed
//! - The decoded descriptors go through the same checks as
//!   [`StageTable::new`], so a transported table keeps its catch-all and its
//!   ordering or is rejected

use crate::{ProgressError, StageDescriptor, StageTable, primitives};

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes binary table data.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl TableHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), ProgressError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(ProgressError::Deserialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(ProgressError::Deserialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProgressError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(ProgressError::Deserialization(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for TableHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `bytes` start with the binary table magic.
#[must_use]
pub fn is_binary_table(bytes: &[u8]) -> bool {
    bytes.starts_with(primitives::MAGIC_BYTES)
}

// =============================================================================
// BINARY
// =============================================================================

/// Serialize a table to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn table_to_bytes(table: &StageTable) -> Result<Vec<u8>, ProgressError> {
    let header = TableHeader::new();
    let payload = postcard::to_stdvec(&table.descriptors())
        .map_err(|e| ProgressError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a table from bytes.
///
/// This is a pure transformation - no file I/O. As with JSON, a payload that
/// decodes but breaks table rules is a configuration error.
pub fn table_from_bytes(bytes: &[u8]) -> Result<StageTable, ProgressError> {
    if bytes.len() > primitives::MAX_TABLE_PAYLOAD_SIZE {
        return Err(ProgressError::Deserialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_TABLE_PAYLOAD_SIZE
        )));
    }

    let header = TableHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_FILE_SIZE..];
    let descriptors = postcard::from_bytes::<Vec<StageDescriptor>>(payload).map_err(|e| {
        ProgressError::Deserialization(format!("Failed to deserialize stage table: {}", e))
    })?;
    StageTable::try_from(descriptors)
}

// =============================================================================
// JSON
// =============================================================================

/// Serialize a table to pretty-printed JSON.
pub fn table_to_json(table: &StageTable) -> Result<String, ProgressError> {
    serde_json::to_string_pretty(table).map_err(|e| ProgressError::Serialization(e.to_string()))
}

/// Deserialize a table from JSON.
///
/// Malformed JSON is a deserialization error. Well-formed descriptors that
/// break table rules (unknown id, lost catch-all, bad ordering) are a
/// configuration error.
pub fn table_from_json(json: &str) -> Result<StageTable, ProgressError> {
    if json.len() > primitives::MAX_TABLE_PAYLOAD_SIZE {
        return Err(ProgressError::Deserialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            json.len(),
            primitives::MAX_TABLE_PAYLOAD_SIZE
        )));
    }

    let descriptors: Vec<StageDescriptor> = serde_json::from_str(json)
        .map_err(|e| ProgressError::Deserialization(format!("Invalid stage table: {}", e)))?;
    StageTable::try_from(descriptors)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageId;

    #[test]
    fn header_roundtrip() {
        let header = TableHeader::new();
        let bytes = header.to_bytes();
        let restored = TableHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let table = StageTable::standard().expect("standard table");

        let bytes1 = table_to_bytes(&table).expect("first serialize");
        let restored = table_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = table_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
        assert!(is_binary_table(&bytes1));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");

        assert!(table_from_bytes(&bytes).is_err());
        assert!(!is_binary_table(&bytes));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = table_to_bytes(&StageTable::standard().expect("standard table")).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        let err = table_from_bytes(&bytes).expect_err("version");
        assert!(err.to_string().contains("Unsupported version"));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = table_to_bytes(&StageTable::standard().expect("standard table")).expect("serialize");
        assert!(table_from_bytes(&bytes[..bytes.len() / 2]).is_err());
        assert!(table_from_bytes(&bytes[..3]).is_err());
    }

    /// The standard descriptors with stage 0 no longer marked catch-all.
    fn without_catch_all() -> Vec<StageDescriptor> {
        let mut descriptors = StageTable::standard().expect("standard table").descriptors();
        descriptors[0].catch_all = false;
        descriptors
    }

    #[test]
    fn json_keeps_configuration_message() {
        let json = r#"[{"id":3,"name":"Replicanti","suggested_resource":"Infinity Points","catch_all":false}]"#;
        let err = table_from_json(json).expect_err("no catch-all");
        assert!(matches!(err, ProgressError::Configuration(_)), "{err:?}");
        assert!(err.to_string().contains("catch-all"), "{err}");
    }

    #[test]
    fn json_rule_violation_is_configuration_error() {
        let json = serde_json::to_string(&without_catch_all()).expect("serialize");
        let err = table_from_json(&json).expect_err("no catch-all");
        assert!(matches!(err, ProgressError::Configuration(_)), "{err:?}");
    }

    #[test]
    fn bytes_rule_violation_is_configuration_error() {
        let mut bytes = TableHeader::new().to_bytes().to_vec();
        bytes.extend(postcard::to_stdvec(&without_catch_all()).expect("serialize"));

        let err = table_from_bytes(&bytes).expect_err("no catch-all");
        assert!(matches!(err, ProgressError::Configuration(_)), "{err:?}");
        assert!(err.to_string().contains("catch-all"), "{err}");
    }

    #[test]
    fn malformed_json_is_deserialization_error() {
        let err = table_from_json("[{\"id\":").expect_err("truncated");
        assert!(matches!(err, ProgressError::Deserialization(_)), "{err:?}");
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let json = table_to_json(&StageTable::standard().expect("standard table")).expect("serialize");
        let restored = table_from_json(&json).expect("deserialize");
        let ids: Vec<StageId> = restored.stages().iter().map(|s| s.id).collect();
        assert_eq!(ids, StageId::ALL.to_vec());
    }
}
