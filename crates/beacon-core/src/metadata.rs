//! # Metadata and Type Resolution
//!
//! Builders may embed a type tag and a metadata map in artifact state.
//! Those values are a contract with the builder: they are decoded into typed
//! shapes in one explicit step ([`EmbeddedState::decode`]) and a shape
//! mismatch is a [`StateDecodeError`], which callers must treat as fatal.
//!
//! Resolution itself never fails:
//!
//! - metadata = embedded map, overwritten key by key with configured values;
//! - type = embedded type unless `artifact_type_override`, else configured.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::artifact::{Artifact, ARTIFACT_STATE_METADATA, ARTIFACT_STATE_TYPE};
use crate::config::PublisherConfig;

/// Published metadata. Ordered so serialization is deterministic.
pub type Metadata = BTreeMap<String, String>;

/// Embedded artifact state did not have the agreed shape.
#[derive(Debug, thiserror::Error)]
#[error("artifact state {key} is not {expected}: {source}")]
pub struct StateDecodeError {
    pub key: &'static str,
    pub expected: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Typed view of the reserved artifact state keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedState {
    pub artifact_type: Option<String>,
    pub metadata: Option<Metadata>,
}

impl EmbeddedState {
    /// Read and decode both reserved keys. `null` counts as absent.
    pub fn decode<A: Artifact + ?Sized>(artifact: &A) -> Result<Self, StateDecodeError> {
        Ok(Self {
            artifact_type: decode_key(artifact, ARTIFACT_STATE_TYPE, "a string")?,
            metadata: decode_key(artifact, ARTIFACT_STATE_METADATA, "a string map")?,
        })
    }
}

fn decode_key<A, T>(
    artifact: &A,
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, StateDecodeError>
where
    A: Artifact + ?Sized,
    T: serde::de::DeserializeOwned,
{
    match artifact.state(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StateDecodeError {
                key,
                expected,
                source,
            }),
    }
}

/// Merge embedded metadata with configured metadata; configured values win.
pub fn resolve_metadata(embedded: Option<&Metadata>, config: &PublisherConfig) -> Metadata {
    let mut metadata = embedded.cloned().unwrap_or_default();
    metadata.extend(
        config
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    metadata
}

/// Pick the published type tag. Empty when neither source provides one.
pub fn resolve_type(embedded: Option<&str>, config: &PublisherConfig) -> String {
    match embedded {
        Some(artifact_type) if !config.artifact_type_override => artifact_type.to_string(),
        _ => config.artifact_type.clone(),
    }
}
