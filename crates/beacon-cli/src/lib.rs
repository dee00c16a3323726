//! # beacon-cli -- command-line host for the metadata publisher
//!
//! Provides the `beacon` binary, which plays the pipeline host for a single
//! artifact: it loads the raw configuration and user variables, builds the
//! post-processor and hands it an artifact manifest.
//!
//! ## Subcommands
//!
//! - `beacon validate` -- resolve configuration only and report every error.
//! - `beacon publish` -- publish an artifact's records to Consul KV.
//! - `beacon show` -- print what Consul holds at an artifact's record keys.
//!
//! ```bash
//! beacon validate --config consul.yaml --var consul=10.0.0.5:8500
//! beacon publish --config consul.yaml --artifact artifact.json
//! beacon -vv show --config consul.yaml --artifact artifact.json
//! ```

pub mod console;
pub mod inputs;
pub mod publish;
pub mod show;
pub mod validate;
