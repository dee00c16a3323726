//! # Build Artifacts
//!
//! The read-only view of a build output that the post-processor consumes.
//! Builders attach opaque, key-addressed state to their artifacts; two keys
//! are reserved for this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Artifacts can return a string for this state key and it becomes the
/// published type tag, unless the operator sets `artifact_type_override`.
pub const ARTIFACT_STATE_TYPE: &str = "consul.artifact.type";

/// Artifacts can return a string-to-string object for this state key and it
/// is merged into the metadata of every record published for the artifact.
pub const ARTIFACT_STATE_METADATA: &str = "consul.artifact.metadata";

/// A build output handed to the post-processor by the pipeline runner.
pub trait Artifact {
    /// Identity of the builder that produced this artifact
    /// (e.g. `mitchellh.amazonebs`).
    fn producer_id(&self) -> &str;

    /// Compound identifier, e.g. `us-east-1:ami-111,us-west-2:ami-222`.
    fn id(&self) -> &str;

    /// Builder-specific state. `None` when the key is not set.
    fn state(&self, key: &str) -> Option<Value>;
}

/// An artifact described by a serialized manifest.
///
/// This is how a host that is not itself a builder (the `beacon` CLI, tests)
/// hands an artifact to the post-processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(alias = "builder_id")]
    pub producer_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state: BTreeMap<String, Value>,
}

impl ArtifactManifest {
    pub fn new(producer_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            producer_id: producer_id.into(),
            id: id.into(),
            state: BTreeMap::new(),
        }
    }

    /// Attach a state value, replacing any previous value under `key`.
    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }
}

impl Artifact for ArtifactManifest {
    fn producer_id(&self) -> &str {
        &self.producer_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self, key: &str) -> Option<Value> {
        self.state.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manifest_accepts_builder_id_alias() {
        let manifest: ArtifactManifest = serde_json::from_value(json!({
            "builder_id": "mitchellh.amazonebs",
            "id": "us-east-1:ami-0001"
        }))
        .unwrap();
        assert_eq!(manifest.producer_id(), "mitchellh.amazonebs");
        assert_eq!(manifest.id(), "us-east-1:ami-0001");
        assert!(manifest.state(ARTIFACT_STATE_TYPE).is_none());
    }

    #[test]
    fn manifest_exposes_state_values() {
        let manifest = ArtifactManifest::new("mitchellh.amazonebs", "us-east-1:ami-0001")
            .with_state(ARTIFACT_STATE_TYPE, json!("ami"));
        assert_eq!(manifest.state(ARTIFACT_STATE_TYPE), Some(json!("ami")));
        assert_eq!(manifest.state("other"), None);
    }
}
