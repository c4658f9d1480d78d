#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod telemetry;

use std::process;

use anyhow::Context;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "mita_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "mita_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "mita_cli::config";
pub const TRACING_TARGET_TRANSFER: &str = "mita_cli::transfer";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    let cause = error.downcast_ref::<mita_core::Error>();
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            kind = cause.map(mita_core::Error::kind_str),
            retryable = cause.is_some_and(mita_core::Error::is_retryable),
            "command terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(&cli.telemetry)?;
    cli.log();
    cli.validate()?;

    let name = cli.command.name();
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        command = name,
        "running command"
    );

    if let Some(output) = command::run(cli).await? {
        let rendered =
            serde_json::to_string_pretty(&output).context("failed to render command output")?;
        println!("{rendered}");
    }

    tracing::debug!(
        target: TRACING_TARGET_SHUTDOWN,
        command = name,
        "command completed"
    );

    Ok(())
}
