//! Published records.
//!
//! Key: `[artifact_type, region, value]` joined by `/`. Only an empty type
//! segment is dropped, so distinct units keep distinct keys.
//! Value: the resolved metadata as a JSON object with sorted keys.
//! Both are pure functions of their inputs, so publishing the same artifact
//! again overwrites its records instead of adding new ones.

use crate::identifier::RegionUnit;
use crate::metadata::Metadata;

/// One key/value pair bound for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub key: String,
    pub value: Vec<u8>,
}

impl PublishedRecord {
    pub fn new(
        artifact_type: &str,
        unit: &RegionUnit,
        metadata: &Metadata,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            key: record_key(artifact_type, unit),
            value: serde_json::to_vec(metadata)?,
        })
    }
}

/// Store key for one identifier unit.
pub fn record_key(artifact_type: &str, unit: &RegionUnit) -> String {
    if artifact_type.is_empty() {
        format!("{}/{}", unit.region, unit.value)
    } else {
        format!("{artifact_type}/{}/{}", unit.region, unit.value)
    }
}

/// Why `key` cannot be stored as-is, if it cannot.
///
/// Empty, `.` and `..` segments are either rejected or normalized away by
/// the store, so the bytes would not land at `key`.
pub fn unaddressable_segment(key: &str) -> Option<&str> {
    key.split('/')
        .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
}
