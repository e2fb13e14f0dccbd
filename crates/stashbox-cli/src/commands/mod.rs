//! CLI command definitions and dispatch.

pub mod location;
pub mod migrate;
pub mod qr;
pub mod storage_box;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use stashbox_core::config::AppConfig;
use stashbox_core::error::AppError;
use stashbox_database::DatabasePool;
use stashbox_service::{RequestContext, Services};

use crate::output::OutputFormat;

/// Stashbox: locations, boxes, and QR labels
#[derive(Debug, Parser)]
#[command(name = "stashbox", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Location hierarchy management
    Location(location::LocationArgs),
    /// Box management
    #[command(name = "box")]
    Box(storage_box::BoxArgs),
    /// QR code management
    Qr(qr::QrArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Location(args) => location::execute(args, &config, self.format).await,
            Commands::Box(args) => storage_box::execute(args, &config, self.format).await,
            Commands::Qr(args) => qr::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: connect and build the services for one workspace
pub async fn connect(
    config: &AppConfig,
    workspace_id: Uuid,
) -> Result<(Services, RequestContext), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    Ok((Services::new(db, config), RequestContext::system(workspace_id)))
}
