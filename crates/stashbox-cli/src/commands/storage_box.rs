//! Box management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use stashbox_core::config::AppConfig;
use stashbox_core::error::AppError;
use stashbox_core::types::PageRequest;
use stashbox_entity::storage_box::StorageBox;
use stashbox_service::{CreateBoxRequest, FieldUpdate, UpdateBoxRequest};

use crate::output::{self, OutputFormat, display_option};

/// Arguments for box commands
#[derive(Debug, Args)]
pub struct BoxArgs {
    /// Workspace to operate on
    #[arg(short, long)]
    pub workspace: Uuid,

    /// Box subcommand
    #[command(subcommand)]
    pub command: BoxCommand,
}

/// Box subcommands
#[derive(Debug, Subcommand)]
pub enum BoxCommand {
    /// Create a box
    Create {
        /// Box name
        name: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Location to place the box at
        #[arg(short, long)]
        location: Option<Uuid>,
        /// QR code to attach
        #[arg(short, long)]
        qr: Option<Uuid>,
    },
    /// Update a box
    Update {
        /// Box ID
        id: Uuid,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        /// Replacement tag (repeatable)
        #[arg(short, long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,
        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
        /// Move to this location
        #[arg(short, long, conflicts_with = "clear_location")]
        location: Option<Uuid>,
        /// Remove the box from its location
        #[arg(long)]
        clear_location: bool,
        /// Attach this QR code, releasing the current one
        #[arg(short, long, conflicts_with = "clear_qr")]
        qr: Option<Uuid>,
        /// Release the current QR code
        #[arg(long)]
        clear_qr: bool,
    },
    /// Show one box
    Show {
        /// Box ID
        id: Uuid,
    },
    /// List boxes, newest first
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
        /// Items per page
        #[arg(long, default_value = "50")]
        page_size: u64,
    },
    /// Delete a box, releasing its QR code
    Delete {
        /// Box ID
        id: Uuid,
    },
}

/// Box display row
#[derive(Debug, Serialize, Tabled)]
pub struct BoxRow {
    /// Box ID
    id: Uuid,
    /// Short ID
    short_id: String,
    /// Name
    name: String,
    /// Tags
    tags: String,
    /// Location
    location_id: String,
    /// QR code
    qr_code_id: String,
}

impl From<&StorageBox> for BoxRow {
    fn from(storage_box: &StorageBox) -> Self {
        Self {
            id: storage_box.id,
            short_id: storage_box.short_id.clone(),
            name: storage_box.name.clone(),
            tags: storage_box.tags.join(", "),
            location_id: display_option(&storage_box.location_id),
            qr_code_id: display_option(&storage_box.qr_code_id),
        }
    }
}

/// Execute box commands
pub async fn execute(args: &BoxArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let (services, ctx) = super::connect(config, args.workspace).await?;
    let boxes = &services.boxes;

    match &args.command {
        BoxCommand::Create {
            name,
            description,
            tags,
            location,
            qr,
        } => {
            let created = boxes
                .create_box(
                    &ctx,
                    CreateBoxRequest {
                        name: name.clone(),
                        description: description.clone(),
                        tags: tags.clone(),
                        location_id: *location,
                        qr_code_id: *qr,
                    },
                )
                .await?;
            output::print_item(&BoxRow::from(&created), format);
        }
        BoxCommand::Update {
            id,
            name,
            description,
            clear_description,
            tags,
            clear_tags,
            location,
            clear_location,
            qr,
            clear_qr,
        } => {
            let tags = if *clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags.clone())
            };
            let updated = boxes
                .update_box(
                    &ctx,
                    *id,
                    UpdateBoxRequest {
                        name: name.clone(),
                        description: field_update(description.clone(), *clear_description),
                        tags,
                        location: field_update(*location, *clear_location),
                        qr_code: field_update(*qr, *clear_qr),
                    },
                )
                .await?;
            output::print_item(&BoxRow::from(&updated), format);
        }
        BoxCommand::Show { id } => {
            let storage_box = boxes.get_box(&ctx, *id).await?;
            match format {
                OutputFormat::Json => output::print_json(&storage_box),
                OutputFormat::Table => {
                    output::print_item(&BoxRow::from(&storage_box), format);
                    if let Some(description) = &storage_box.description {
                        output::print_kv("Description", description);
                    }
                }
            }
        }
        BoxCommand::List { page, page_size } => {
            let result = boxes
                .list_boxes(&ctx, PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<BoxRow> = result.items.iter().map(BoxRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {}/{} ({} box(es))",
                    result.page, result.total_pages, result.total_items
                );
            }
        }
        BoxCommand::Delete { id } => {
            let released = services.box_deletion.delete(&ctx, *id).await?;
            match released {
                Some(qr_code_id) => output::print_success(&format!(
                    "Box {id} deleted, QR code {qr_code_id} released."
                )),
                None => output::print_success(&format!("Box {id} deleted.")),
            }
        }
    }

    Ok(())
}

fn field_update<T>(value: Option<T>, clear: bool) -> FieldUpdate<T> {
    match (value, clear) {
        (_, true) => FieldUpdate::Clear,
        (Some(value), false) => FieldUpdate::Set(value),
        (None, false) => FieldUpdate::Leave,
    }
}
