//! # Publish Subcommand
//!
//! Configures the post-processor against Consul and publishes one artifact.
//! Progress goes to the supplied [`Ui`]; failures are returned as errors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use beacon_consul::ConsulKvClient;
use beacon_core::{PostProcessor, Ui};

use crate::inputs::{load_artifact, ConfigArgs};

/// Arguments for the `beacon publish` subcommand.
#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Artifact manifest (YAML or JSON) with `producer_id`, `id` and `state`.
    #[arg(short, long, value_name = "FILE")]
    pub artifact: PathBuf,
}

/// Execute the publish subcommand.
///
/// Must run on a thread inside a multi-threaded tokio runtime context that
/// is not a runtime worker.
pub fn run_publish(args: &PublishArgs, ui: &dyn Ui) -> Result<u8> {
    let layers = args.config.layers()?;
    let user_vars = args.config.user_variables()?;
    let artifact = load_artifact(&args.artifact)?;

    let post_processor = PostProcessor::configure(&layers, &user_vars, ConsulKvClient::connect)
        .with_context(|| format!("failed to configure from {}", args.config.config.display()))?;

    let outcome = post_processor
        .post_process(ui, artifact)
        .context("post-processing failed")?;

    tracing::info!(
        artifact = %outcome.artifact.id,
        keep_original = outcome.keep_original,
        "artifact published"
    );
    Ok(0)
}
