//! Location management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use stashbox_core::config::AppConfig;
use stashbox_core::error::AppError;
use stashbox_entity::location::{Location, LocationNode};
use stashbox_service::{CreateLocationRequest, RenameLocationRequest};

use super::storage_box::BoxRow;
use crate::output::{self, OutputFormat};

/// Arguments for location commands
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Workspace to operate on
    #[arg(short, long)]
    pub workspace: Uuid,

    /// Location subcommand
    #[command(subcommand)]
    pub command: LocationCommand,
}

/// Location subcommands
#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// Create a location
    Create {
        /// Display name
        name: String,
        /// Parent location (omit for top level)
        #[arg(short, long)]
        parent: Option<Uuid>,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a location or change its description
    Rename {
        /// Location ID
        id: Uuid,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description (empty to clear)
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one location
    Show {
        /// Location ID
        id: Uuid,
    },
    /// List direct children (top-level locations without a parent)
    Children {
        /// Parent location
        #[arg(short, long)]
        parent: Option<Uuid>,
    },
    /// Print the location tree
    Tree {
        /// Start from this location instead of the whole workspace
        #[arg(short, long)]
        root: Option<Uuid>,
    },
    /// Print the trail from the top of the tree to a location
    Breadcrumbs {
        /// Location ID
        id: Uuid,
    },
    /// List boxes placed at a location
    Boxes {
        /// Location ID
        id: Uuid,
    },
    /// Delete a location, detaching its boxes
    Delete {
        /// Location ID
        id: Uuid,
    },
}

/// Location display row
#[derive(Debug, Serialize, Tabled)]
struct LocationRow {
    /// Location ID
    id: Uuid,
    /// Name
    name: String,
    /// Path
    path: String,
    /// Depth
    depth: i32,
    /// Created at
    created_at: String,
}

impl From<&Location> for LocationRow {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            path: location.path.to_string(),
            depth: location.depth,
            created_at: location.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute location commands
pub async fn execute(
    args: &LocationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (services, ctx) = super::connect(config, args.workspace).await?;
    let locations = &services.locations;

    match &args.command {
        LocationCommand::Create {
            name,
            parent,
            description,
        } => {
            let location = locations
                .create_location(
                    &ctx,
                    CreateLocationRequest {
                        name: name.clone(),
                        description: description.clone(),
                        parent_id: *parent,
                    },
                )
                .await?;
            output::print_item(&LocationRow::from(&location), format);
        }
        LocationCommand::Rename {
            id,
            name,
            description,
        } => {
            let location = locations
                .rename_location(
                    &ctx,
                    *id,
                    RenameLocationRequest {
                        name: name.clone(),
                        description: description.clone(),
                    },
                )
                .await?;
            output::print_item(&LocationRow::from(&location), format);
        }
        LocationCommand::Show { id } => {
            let location = locations.get_location(&ctx, *id).await?;
            output::print_item(&LocationRow::from(&location), format);
        }
        LocationCommand::Children { parent } => {
            let children = locations.list_children(&ctx, *parent).await?;
            let rows: Vec<LocationRow> = children.iter().map(LocationRow::from).collect();
            output::print_list(&rows, format);
        }
        LocationCommand::Tree { root } => {
            let tree = services.trees.get_tree(&ctx, *root).await?;
            match format {
                OutputFormat::Json => output::print_json(&tree),
                OutputFormat::Table => {
                    if tree.roots.is_empty() {
                        println!("No locations.");
                    }
                    for node in &tree.roots {
                        print_node(node, 0);
                    }
                    println!("{} location(s)", tree.total_locations);
                }
            }
        }
        LocationCommand::Breadcrumbs { id } => {
            let trail = services.trees.get_breadcrumbs(&ctx, *id).await?;
            match format {
                OutputFormat::Json => output::print_json(&trail),
                OutputFormat::Table => {
                    let names: Vec<&str> = trail.iter().map(|b| b.name.as_str()).collect();
                    println!("{}", names.join(" > "));
                }
            }
        }
        LocationCommand::Boxes { id } => {
            let boxes = locations.list_boxes(&ctx, *id).await?;
            let rows: Vec<BoxRow> = boxes.iter().map(BoxRow::from).collect();
            output::print_list(&rows, format);
        }
        LocationCommand::Delete { id } => {
            let detached = services.location_lifecycle.delete(&ctx, *id).await?;
            output::print_success(&format!(
                "Location {id} deleted, {detached} box(es) detached."
            ));
        }
    }

    Ok(())
}

fn print_node(node: &LocationNode, indent: usize) {
    println!(
        "{}{} ({}) [{} box(es)]",
        "  ".repeat(indent),
        node.name,
        node.path,
        node.box_count
    );
    for child in &node.children {
        print_node(child, indent + 1);
    }
}
