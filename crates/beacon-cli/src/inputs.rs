//! # Input Loading
//!
//! Configuration files, user variables and artifact manifests. Every file
//! may be YAML or JSON; both are read through `serde_yaml`.
//!
//! A configuration file holds either one mapping or a sequence of mappings.
//! A sequence is treated as ordered configuration layers, later layers
//! winning per top-level key.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use beacon_core::{ArtifactManifest, UserVariables};

/// Configuration and variable flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Publisher configuration file (YAML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// User variable referenced by `user` template actions. Repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// File holding a mapping of user variables. `--var` wins over it.
    #[arg(long, value_name = "FILE")]
    pub var_file: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn layers(&self) -> Result<Vec<Value>> {
        load_config_layers(&self.config)
    }

    pub fn user_variables(&self) -> Result<UserVariables> {
        let mut vars = match &self.var_file {
            Some(path) => load_var_file(path)?,
            None => UserVariables::new(),
        };
        vars.extend(self.vars.iter().cloned());
        Ok(vars)
    }
}

/// Parse one `--var KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.trim().is_empty() => {
            Err(format!("variable name is empty in '{raw}'"))
        }
        Some((key, value)) => Ok((key.trim().to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Read a YAML or JSON document into a JSON value.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Read configuration layers from `path`.
pub fn load_config_layers(path: &Path) -> Result<Vec<Value>> {
    let layers = match load_document(path)? {
        Value::Array(layers) => layers,
        single => vec![single],
    };
    tracing::debug!(path = %path.display(), layers = layers.len(), "loaded configuration");
    Ok(layers)
}

/// Read a user-variable mapping. Scalar values are taken as their text form.
pub fn load_var_file(path: &Path) -> Result<UserVariables> {
    let Value::Object(map) = load_document(path)? else {
        bail!("{}: variable file must be a mapping", path.display());
    };
    map.into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    bail!("{}: variable '{name}' must be a scalar", path.display())
                }
            };
            Ok((name, text))
        })
        .collect()
}

/// Read an artifact manifest.
pub fn load_artifact(path: &Path) -> Result<ArtifactManifest> {
    let document = load_document(path)?;
    serde_json::from_value(document)
        .with_context(|| format!("{}: not a valid artifact manifest", path.display()))
}
