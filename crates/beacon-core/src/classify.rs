//! # Artifact Classification
//!
//! Only artifacts from known builders can be published: the identifier format
//! and the meaning of "region" depend on the builder. The table is built once
//! and never mutated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of artifact this crate knows how to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// EBS-backed Amazon machine image.
    AmazonEbs,
    /// Instance-store-backed Amazon machine image.
    AmazonInstance,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmazonEbs => "amazonebs",
            Self::AmazonInstance => "amazoninstance",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder ids accepted out of the box.
pub const BUILTIN_PRODUCERS: &[(&str, ArtifactKind)] = &[
    ("mitchellh.amazonebs", ArtifactKind::AmazonEbs),
    ("mitchellh.amazon.instance", ArtifactKind::AmazonInstance),
];

/// The artifact came from a builder that is not in the classification table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported artifact type: {producer_id}")]
pub struct UnsupportedArtifactType {
    pub producer_id: String,
}

/// Immutable `producer id -> kind` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    table: BTreeMap<String, ArtifactKind>,
}

impl Classifier {
    /// Classifier over [`BUILTIN_PRODUCERS`].
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_PRODUCERS
                .iter()
                .map(|(id, kind)| ((*id).to_string(), *kind)),
        )
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, ArtifactKind)>) -> Self {
        Self {
            table: entries.into_iter().collect(),
        }
    }

    pub fn classify(&self, producer_id: &str) -> Result<ArtifactKind, UnsupportedArtifactType> {
        self.table
            .get(producer_id)
            .copied()
            .ok_or_else(|| UnsupportedArtifactType {
                producer_id: producer_id.to_string(),
            })
    }

    pub fn is_supported(&self, producer_id: &str) -> bool {
        self.table.contains_key(producer_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_classifies_amazon_builders() {
        let classifier = Classifier::builtin();
        assert_eq!(classifier.len(), 2);
        assert_eq!(
            classifier.classify("mitchellh.amazonebs").unwrap(),
            ArtifactKind::AmazonEbs
        );
        assert_eq!(
            classifier.classify("mitchellh.amazon.instance").unwrap(),
            ArtifactKind::AmazonInstance
        );
    }

    #[test]
    fn unknown_producer_is_rejected_with_its_id() {
        let err = Classifier::builtin()
            .classify("mitchellh.virtualbox")
            .unwrap_err();
        assert_eq!(err.producer_id, "mitchellh.virtualbox");
        assert_eq!(
            err.to_string(),
            "unsupported artifact type: mitchellh.virtualbox"
        );
    }

    #[test]
    fn lookup_is_exact() {
        let classifier = Classifier::builtin();
        assert!(!classifier.is_supported("MITCHELLH.AMAZONEBS"));
        assert!(!classifier.is_supported(""));
    }

    #[test]
    fn custom_table_replaces_builtins() {
        let classifier =
            Classifier::from_entries([("acme.ebs".to_string(), ArtifactKind::AmazonEbs)]);
        assert!(classifier.is_supported("acme.ebs"));
        assert!(!classifier.is_supported("mitchellh.amazonebs"));
    }

    #[test]
    fn kind_display_matches_serde() {
        for (_, kind) in BUILTIN_PRODUCERS {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
