//! # Validate Subcommand
//!
//! Resolves the configuration exactly as `publish` would, without building
//! a store client. Every configuration error is reported at once.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use beacon_core::{resolve, ConfigError};

use crate::inputs::ConfigArgs;

/// Arguments for the `beacon validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the configuration resolves, 1 otherwise.
/// Unreadable input files are returned as errors.
pub fn run_validate(args: &ValidateArgs, out: &mut dyn Write) -> Result<u8> {
    let layers = args.config.layers()?;
    let user_vars = args.config.user_variables()?;

    match resolve(&layers, &user_vars) {
        Ok(config) => {
            writeln!(out, "Configuration valid: {}", args.config.config.display())?;
            writeln!(out, "  address:    {}", config.address)?;
            if !config.datacenter.is_empty() {
                writeln!(out, "  datacenter: {}", config.datacenter)?;
            }
            if !config.artifact_type.is_empty() {
                writeln!(
                    out,
                    "  type:       {}{}",
                    config.artifact_type,
                    if config.artifact_type_override {
                        " (override)"
                    } else {
                        ""
                    }
                )?;
            }
            writeln!(out, "  metadata:   {} key(s)", config.metadata.len())?;
            Ok(0)
        }
        Err(ConfigError::Invalid(errors)) => {
            writeln!(out, "Configuration invalid: {}", args.config.config.display())?;
            writeln!(out, "{errors}")?;
            Ok(1)
        }
        Err(e) => {
            writeln!(out, "Configuration invalid: {}", args.config.config.display())?;
            writeln!(out, "{e}")?;
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_for(content: &str, vars: &[(&str, &str)]) -> (tempfile::TempDir, ValidateArgs) {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("consul.yaml");
        std::fs::write(&path, content).unwrap();
        let args = ValidateArgs {
            config: ConfigArgs {
                config: path,
                vars: vars
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                var_file: None,
            },
        };
        (dir, args)
    }

    fn run(args: &ValidateArgs) -> (u8, String) {
        let mut out = Vec::new();
        let code = run_validate(args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn valid_configuration_exits_zero() {
        let (_dir, args) = args_for(
            "address: \"{{user `consul`}}\"\nartifact_type: ami\nmetadata:\n  build: \"42\"\n",
            &[("consul", "10.0.0.5:8500")],
        );
        let (code, out) = run(&args);
        assert_eq!(code, 0);
        assert!(out.contains("address:    10.0.0.5:8500"));
        assert!(out.contains("type:       ami"));
        assert!(out.contains("metadata:   1 key(s)"));
    }

    #[test]
    fn every_error_is_reported() {
        let (_dir, args) = args_for("token: \"{{user `missing`}}\"\n", &[]);
        let (code, out) = run(&args);
        assert_eq!(code, 1);
        assert!(out.contains("2 error(s) occurred:"), "{out}");
        assert!(out.contains("address must be set"), "{out}");
        assert!(out.contains("missing"), "{out}");
    }

    #[test]
    fn unknown_key_is_invalid() {
        let (_dir, args) = args_for("address: consul:8500\nadress: typo\n", &[]);
        let (code, out) = run(&args);
        assert_eq!(code, 1);
        assert!(out.contains("adress"), "{out}");
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let (dir, args) = args_for("address: consul:8500\n", &[]);
        drop(dir);
        assert!(run_validate(&args, &mut Vec::new()).is_err());
    }
}
