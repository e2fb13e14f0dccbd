//! QR code management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use stashbox_core::config::AppConfig;
use stashbox_core::error::AppError;
use stashbox_core::types::PageRequest;
use stashbox_entity::qr::{QrCode, QrStatus};

use crate::output::{self, OutputFormat, display_option};

/// Arguments for QR code commands
#[derive(Debug, Args)]
pub struct QrArgs {
    /// Workspace to operate on
    #[arg(short, long)]
    pub workspace: Uuid,

    /// QR subcommand
    #[command(subcommand)]
    pub command: QrCommand,
}

/// QR subcommands
#[derive(Debug, Subcommand)]
pub enum QrCommand {
    /// Generate a batch of unassigned codes
    Generate {
        /// How many codes to generate
        #[arg(default_value = "1")]
        count: u32,
    },
    /// Attach a code to a box
    Assign {
        /// QR code ID
        qr: Uuid,
        /// Box ID
        #[arg(short, long = "box")]
        box_id: Uuid,
    },
    /// Detach a code from its box
    Unassign {
        /// QR code ID
        qr: Uuid,
    },
    /// Record that a code's label was printed
    Printed {
        /// QR code ID
        qr: Uuid,
    },
    /// Show one code
    Show {
        /// QR code ID
        qr: Uuid,
    },
    /// List codes
    List {
        /// Only codes in this state (generated, assigned, printed)
        #[arg(short, long)]
        status: Option<QrStatus>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
        /// Items per page
        #[arg(long, default_value = "50")]
        page_size: u64,
    },
    /// Resolve a scanned label to its box and location
    Scan {
        /// Short ID printed on the label
        short_id: String,
    },
}

/// QR code display row
#[derive(Debug, Serialize, Tabled)]
struct QrRow {
    /// QR code ID
    id: Uuid,
    /// Short ID
    short_id: String,
    /// Status
    status: QrStatus,
    /// Bound box
    box_id: String,
    /// Last change
    updated_at: String,
}

impl From<&QrCode> for QrRow {
    fn from(code: &QrCode) -> Self {
        Self {
            id: code.id,
            short_id: code.short_id.clone(),
            status: code.status,
            box_id: display_option(&code.box_id),
            updated_at: code.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute QR code commands
pub async fn execute(args: &QrArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let (services, ctx) = super::connect(config, args.workspace).await?;
    let qr_codes = &services.qr_codes;

    match &args.command {
        QrCommand::Generate { count } => {
            let codes = qr_codes.generate_batch(&ctx, *count).await?;
            let rows: Vec<QrRow> = codes.iter().map(QrRow::from).collect();
            output::print_list(&rows, format);
        }
        QrCommand::Assign { qr, box_id } => {
            let code = qr_codes.assign(&ctx, *qr, *box_id).await?;
            output::print_item(&QrRow::from(&code), format);
        }
        QrCommand::Unassign { qr } => {
            let code = qr_codes.unassign(&ctx, *qr).await?;
            output::print_item(&QrRow::from(&code), format);
        }
        QrCommand::Printed { qr } => {
            let code = qr_codes.mark_printed(&ctx, *qr).await?;
            output::print_item(&QrRow::from(&code), format);
        }
        QrCommand::Show { qr } => {
            let code = qr_codes.get(&ctx, *qr).await?;
            output::print_item(&QrRow::from(&code), format);
        }
        QrCommand::List {
            status,
            page,
            page_size,
        } => {
            let result = qr_codes
                .list(&ctx, *status, PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<QrRow> = result.items.iter().map(QrRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {}/{} ({} code(s))",
                    result.page, result.total_pages, result.total_items
                );
            }
        }
        QrCommand::Scan { short_id } => {
            let scan = qr_codes.resolve_scan(&ctx, short_id).await?;
            match format {
                OutputFormat::Json => output::print_json(&scan),
                OutputFormat::Table => {
                    output::print_kv("Code", &scan.qr_code.short_id);
                    output::print_kv("Status", scan.qr_code.status.as_str());
                    match &scan.storage_box {
                        Some(storage_box) => {
                            output::print_kv(
                                "Box",
                                &format!("{} ({})", storage_box.name, storage_box.short_id),
                            );
                        }
                        None => output::print_kv("Box", "-"),
                    }
                    let trail: Vec<&str> =
                        scan.breadcrumbs.iter().map(|b| b.name.as_str()).collect();
                    let place = if trail.is_empty() {
                        "-".to_string()
                    } else {
                        trail.join(" > ")
                    };
                    output::print_kv("Location", &place);
                }
            }
        }
    }

    Ok(())
}
