//! # Show Subcommand
//!
//! Derives the record keys `publish` would write for an artifact and prints
//! what Consul currently holds at each. Nothing is written.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use beacon_consul::ConsulKvClient;
use beacon_core::{KvStore, PostProcessor};

use crate::inputs::{load_artifact, ConfigArgs};

/// Arguments for the `beacon show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Artifact manifest (YAML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub artifact: PathBuf,
}

/// Execute the show subcommand.
///
/// Returns exit code: 0 when every record is present with the value
/// `publish` would write, 1 when any record is missing or differs.
pub fn run_show(args: &ShowArgs, out: &mut dyn Write) -> Result<u8> {
    let layers = args.config.layers()?;
    let user_vars = args.config.user_variables()?;
    let artifact = load_artifact(&args.artifact)?;

    let post_processor = PostProcessor::configure(&layers, &user_vars, ConsulKvClient::connect)
        .with_context(|| format!("failed to configure from {}", args.config.config.display()))?;
    let records = post_processor.records_for(&artifact)?;
    let store = post_processor.store();

    writeln!(out, "{} record(s) in {}", records.len(), store.store_name())?;

    let mut current = 0usize;
    for record in &records {
        let stored = store
            .get(&record.key)
            .with_context(|| format!("failed to read {}", record.key))?;
        match stored {
            Some(value) if value == record.value => {
                current += 1;
                writeln!(out, "  {}: {}", record.key, String::from_utf8_lossy(&value))?;
            }
            Some(value) => {
                writeln!(
                    out,
                    "  {}: {} (stale, expected {})",
                    record.key,
                    String::from_utf8_lossy(&value),
                    String::from_utf8_lossy(&record.value)
                )?;
            }
            None => writeln!(out, "  {}: <absent>", record.key)?,
        }
    }

    tracing::debug!(records = records.len(), current, "compared published records");
    Ok(if current == records.len() { 0 } else { 1 })
}
