//! Location entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use stashbox_core::path::LocationPath;

/// A node in a workspace's location tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    /// Unique location identifier.
    pub id: Uuid,
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Display name as entered.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Materialized path, e.g. `garage.top_shelf`.
    #[sqlx(try_from = "String")]
    pub path: LocationPath,
    /// Segment count, generated by the database from `path`.
    pub depth: i32,
    /// Soft-delete flag. Deleted rows are kept for history.
    pub is_deleted: bool,
    /// When the location was created.
    pub created_at: DateTime<Utc>,
    /// When the location was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Fully composed path.
    pub path: LocationPath,
}
