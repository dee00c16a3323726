//! # beacon CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! The store client is synchronous over async HTTP, so handlers run on the
//! main thread inside an entered multi-threaded tokio runtime.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use beacon_cli::console::ConsoleUi;
use beacon_cli::publish::{run_publish, PublishArgs};
use beacon_cli::show::{run_show, ShowArgs};
use beacon_cli::validate::{run_validate, ValidateArgs};

/// Publish build artifact metadata to Consul KV.
///
/// Each region-scoped unit of an artifact's identifier becomes one record,
/// keyed `{type}/{region}/{id}`, holding the artifact's metadata as JSON.
#[derive(Parser, Debug)]
#[command(name = "beacon", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the configuration and report every error.
    Validate(ValidateArgs),

    /// Publish an artifact's metadata records.
    Publish(PublishArgs),

    /// Show what the store holds at an artifact's record keys.
    Show(ShowArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "beacon CLI starting");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };
    let _guard = runtime.enter();

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &mut std::io::stdout().lock()),
        Commands::Publish(args) => run_publish(&args, &ConsoleUi::stdio("consul")),
        Commands::Show(args) => run_show(&args, &mut std::io::stdout().lock()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
