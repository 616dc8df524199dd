//! Storekeeper - Command-line entry point
//!
//! Loads the configuration, restores the stored session and runs one
//! subcommand against the backend.

mod cli;
mod commands;
mod context;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::context::{AppContext, load_config};

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config, args.base_url).await?;
    let context = AppContext::build(config, args.ephemeral).await?;
    let result = commands::run(&context, args.command).await;
    debug!(
        expiries = context.notifier.fired_count(),
        logged_in = context.store.is_logged_in().await,
        "Command finished"
    );
    result
}
