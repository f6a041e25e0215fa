//! # Save Snapshot
//!
//! Read-only view over a deserialized save.
//!
//! A snapshot is not the live game-state object. It is usually a plain record
//! parsed from JSON (for example a cloud save being compared against a local
//! one), so quantities that the game keeps as decimals arrive as strings such
//! as `"1e308"`. Every numeric accessor normalizes through [`Decimal`] first.
//!
//! ## Lookup Rules
//!
//! - Paths are dotted (`celestials.ra.pets`); array elements are addressed by
//!   index (`celestials.v.runUnlocks.3`).
//! - A missing path is a [`ProgressError::MalformedSave`] naming the path.
//!   Nothing is coerced to zero.
//! - Inside a collection, a missing or `null` entry counts as zero. Sparse
//!   maps such as `eternityChalls` only hold keys for started challenges.

use break_infinity::Decimal;
use crate::primitives::CRUNCH_INTERVAL_START_MS;
use crate::types::ProgressError;
use serde_json::{Map, Value, json};

/// Path used in errors that concern the whole document.
const ROOT_PATH: &str = "<root>";

/// A read-only save snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    root: Value,
}

/// Parse a numeric string such as `"1e308"`, `"-3.2E5"` or `" 600 "`.
///
/// NaN, infinities, nested exponents (`"1e1e10"`) and magnitudes past
/// `Decimal::MAX_VALUE` are rejected.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    // The parser only splits on a lowercase `e`.
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty()
        || text.contains("inf")
        || text.contains("nan")
        || text.matches('e').count() > 1
    {
        return None;
    }

    let decimal: Decimal = text.parse().ok()?;
    // NaN is unordered.
    let ordered = decimal.partial_cmp(&Decimal::ZERO).is_some();
    (ordered && decimal.abs() < Decimal::MAX_VALUE).then_some(decimal)
}

/// Normalize a numeric-looking JSON value.
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.as_f64().map(Decimal::new),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn join(collection: &str, key: &str) -> String {
    format!("{}.{}", collection, key)
}

impl SaveSnapshot {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Wrap a JSON value. The root must be an object.
    pub fn from_value(root: Value) -> Result<Self, ProgressError> {
        if !root.is_object() {
            return Err(ProgressError::malformed(ROOT_PATH, "expected an object"));
        }
        Ok(Self { root })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ProgressError> {
        let root = serde_json::from_str(json)
            .map_err(|e| ProgressError::Deserialization(format!("Invalid save JSON: {}", e)))?;
        Self::from_value(root)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProgressError> {
        let root = serde_json::from_slice(bytes)
            .map_err(|e| ProgressError::Deserialization(format!("Invalid save JSON: {}", e)))?;
        Self::from_value(root)
    }

    /// The default snapshot: a save that has just been created.
    ///
    /// Every progress counter is zero and every unlock flag is false. Antimatter
    /// starts at 10 and the crunch autobuyer at its initial interval, as in a
    /// new game.
    #[must_use]
    pub fn zeroed() -> Self {
        let root = json!({
            "antimatter": "10",
            "galaxies": 0,
            "dimensionBoosts": 0,
            "infinities": "0",
            "infinityPoints": "0",
            "eternities": "0",
            "eternityPoints": "0",
            "realities": 0,
            "auto": { "bigCrunch": { "interval": CRUNCH_INTERVAL_START_MS } },
            "replicanti": { "unl": false },
            "eternityChalls": {},
            "dilation": { "dilatedTime": "0" },
            "reality": { "realityMachines": "0", "iMCap": 0 },
            "celestials": {
                "teresa": { "quotes": 0, "pouredAmount": 0 },
                "effarig": { "quotes": 0, "relicShards": 0 },
                "enslaved": { "quotes": 0 },
                "v": { "quotes": 0, "runUnlocks": [0, 0, 0, 0, 0, 0, 0, 0, 0] },
                "ra": {
                    "quotes": 0,
                    "pets": {
                        "teresa": { "level": 0 },
                        "effarig": { "level": 0 },
                        "enslaved": { "level": 0 },
                        "v": { "level": 0 }
                    }
                },
                "laitela": { "quotes": 0, "darkMatter": "0" },
                "pelle": { "doomed": false, "remnants": 0 }
            }
        });
        Self { root }
    }

    /// Set a dotted path, creating intermediate objects.
    ///
    /// Intended for building synthetic snapshots.
    pub fn with(mut self, path: &str, value: Value) -> Result<Self, ProgressError> {
        let mut segments = path.split('.').peekable();
        let mut current = &mut self.root;

        while let Some(segment) = segments.next() {
            let map = current
                .as_object_mut()
                .ok_or_else(|| ProgressError::malformed(path, "parent is not an object"))?;

            if segments.peek().is_none() {
                map.insert(segment.to_string(), value);
                return Ok(self);
            }

            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        Err(ProgressError::malformed(path, "empty path"))
    }

    /// The underlying JSON document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    // =========================================================================
    // FIELD ACCESS
    // =========================================================================

    /// Resolve a dotted path.
    pub fn value(&self, path: &str) -> Result<&Value, ProgressError> {
        let mut current = &self.root;
        for segment in path.split('.') {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| ProgressError::missing(path))?;
        }
        Ok(current)
    }

    /// Read a number or numeric string as a [`Decimal`].
    pub fn decimal(&self, path: &str) -> Result<Decimal, ProgressError> {
        to_decimal(self.value(path)?)
            .ok_or_else(|| ProgressError::malformed(path, "expected a number"))
    }

    /// Read a quantity known to fit in `f64` (counts, levels, intervals).
    pub fn number(&self, path: &str) -> Result<f64, ProgressError> {
        Ok(self.decimal(path)?.to_number())
    }

    /// Read a boolean flag.
    pub fn flag(&self, path: &str) -> Result<bool, ProgressError> {
        self.value(path)?
            .as_bool()
            .ok_or_else(|| ProgressError::malformed(path, "expected a boolean"))
    }

    // =========================================================================
    // COLLECTIONS
    // =========================================================================

    fn entries(&self, collection: &str) -> Result<Vec<(String, &Value)>, ProgressError> {
        match self.value(collection)? {
            Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
            Value::Array(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect()),
            _ => Err(ProgressError::malformed(
                collection,
                "expected an object or array",
            )),
        }
    }

    /// Read one entry of a collection. A missing or `null` entry is zero.
    pub fn entry(&self, collection: &str, key: &str) -> Result<Decimal, ProgressError> {
        let found = match self.value(collection)? {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => {
                return Err(ProgressError::malformed(
                    collection,
                    "expected an object or array",
                ));
            }
        };

        match found {
            None | Some(Value::Null) => Ok(Decimal::ZERO),
            Some(value) => to_decimal(value)
                .ok_or_else(|| ProgressError::malformed(join(collection, key), "expected a number")),
        }
    }

    /// Sum the numeric entries of a collection. `null` entries count as zero.
    pub fn sum(&self, collection: &str) -> Result<f64, ProgressError> {
        self.entries(collection)?
            .into_iter()
            .try_fold(0.0, |total, (key, value)| match value {
                Value::Null => Ok(total),
                other => to_decimal(other)
                    .map(|d| total + d.to_number())
                    .ok_or_else(|| {
                        ProgressError::malformed(join(collection, &key), "expected a number")
                    }),
            })
    }

    /// Sum `entry.field` over a collection of records.
    ///
    /// A `null` entry, or an entry without `field`, counts as zero.
    pub fn sum_field(&self, collection: &str, field: &str) -> Result<f64, ProgressError> {
        self.entries(collection)?
            .into_iter()
            .try_fold(0.0, |total, (key, value)| {
                let record = match value {
                    Value::Null => return Ok(total),
                    Value::Object(record) => record,
                    _ => {
                        return Err(ProgressError::malformed(
                            join(collection, &key),
                            "expected an object",
                        ));
                    }
                };

                match record.get(field) {
                    None | Some(Value::Null) => Ok(total),
                    Some(inner) => to_decimal(inner).map(|d| total + d.to_number()).ok_or_else(|| {
                        ProgressError::malformed(
                            format!("{}.{}.{}", collection, key, field),
                            "expected a number",
                        )
                    }),
                }
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================
