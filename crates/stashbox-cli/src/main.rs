//! Stashbox CLI entry point.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod output;

use commands::Cli;
use stashbox_core::config::{AppConfig, LoggingConfig};
use stashbox_core::error::AppError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(config).await {
        log_failure(&e);
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Operational failures are errors; rejected input only warns.
fn failure_level(err: &AppError) -> Level {
    if err.is_operational() {
        Level::ERROR
    } else {
        Level::WARN
    }
}

fn log_failure(err: &AppError) {
    if failure_level(err) == Level::ERROR {
        tracing::error!(kind = %err.kind, operational = true, "Command failed: {err}");
    } else {
        tracing::warn!(kind = %err.kind, "Command rejected: {err}");
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
