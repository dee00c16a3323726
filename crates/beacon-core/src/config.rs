//! # Publisher Configuration
//!
//! Operator settings arrive as one or more raw JSON objects (the pipeline
//! may layer several). They are merged, decoded, template-expanded and
//! validated by [`resolve`]. Expansion and validation are best-effort: every
//! problem found is collected into one [`ValidationErrors`] so the operator
//! sees them all before any run starts.
//!
//! Resolving does not touch the store. Connecting is a separate step so a
//! construction failure is never confused with invalid settings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template::{expand, TemplateContext, TemplateError};

/// Variables supplied by the pipeline for template expansion.
pub type UserVariables = BTreeMap<String, String>;

/// Resolved operator configuration. Immutable once [`resolve`] returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    /// Reserved. Accepted and carried, never interpreted.
    #[serde(default)]
    pub artifact: String,

    /// Type tag published when the artifact does not supply one, or always
    /// when `artifact_type_override` is set.
    #[serde(default)]
    pub artifact_type: String,

    #[serde(default)]
    pub artifact_type_override: bool,

    /// Merged into every published record. Configured keys win.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Store endpoint. Templated; required after expansion.
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub scheme: String,

    #[serde(default)]
    pub datacenter: String,

    #[serde(default)]
    pub token: String,
}

/// A single problem found while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigIssue {
    #[error("error processing {field}: {source}")]
    Template {
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("{field} must be set")]
    MissingRequired { field: &'static str },
}

impl ConfigIssue {
    /// Name of the configuration field the issue is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Template { field, .. } | Self::MissingRequired { field } => field,
        }
    }
}

/// Every issue found during one resolve, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ConfigIssue>,
}

impl ValidationErrors {
    pub fn push(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// `true` if any issue concerns `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field() == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred:", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n* {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors from [`resolve`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A raw layer was neither an object nor null.
    #[error("configuration layer {index} is not an object")]
    NotAnObject { index: usize },

    /// Unknown key or wrongly typed value.
    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(ValidationErrors),
}

/// Decode, expand and validate raw configuration layers.
///
/// Layers are shallow-merged in order (later layers win per top-level key);
/// `null` layers are skipped.
pub fn resolve(raws: &[Value], user_vars: &UserVariables) -> Result<PublisherConfig, ConfigError> {
    let mut merged = Map::new();
    for (index, raw) in raws.iter().enumerate() {
        match raw {
            Value::Object(layer) => merged.extend(layer.clone()),
            Value::Null => {}
            _ => return Err(ConfigError::NotAnObject { index }),
        }
    }
    let mut config: PublisherConfig = serde_json::from_value(Value::Object(merged))?;

    let ctx = TemplateContext::new(user_vars);
    let mut errors = ValidationErrors::default();

    for (field, slot) in config.templated_fields_mut() {
        match expand(slot, &ctx) {
            Ok(expanded) => *slot = expanded,
            Err(source) => {
                slot.clear();
                errors.push(ConfigIssue::Template { field, source });
            }
        }
    }

    if config.address.is_empty() {
        errors.push(ConfigIssue::MissingRequired { field: "address" });
    }

    if !errors.is_empty() {
        tracing::debug!(issues = errors.len(), "configuration rejected");
        return Err(ConfigError::Invalid(errors));
    }

    tracing::debug!(
        address = %config.address,
        datacenter = %config.datacenter,
        metadata_keys = config.metadata.len(),
        "configuration resolved"
    );
    Ok(config)
}

impl PublisherConfig {
    /// Fields that accept templates, in reporting order.
    fn templated_fields_mut(&mut self) -> [(&'static str, &mut String); 4] {
        [
            ("address", &mut self.address),
            ("scheme", &mut self.scheme),
            ("datacenter", &mut self.datacenter),
            ("token", &mut self.token),
        ]
    }
}
