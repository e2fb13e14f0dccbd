//! Location CRUD over the workspace path tree.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use stashbox_core::config::EngineConfig;
use stashbox_core::error::AppError;
use stashbox_core::path::LocationPath;
use stashbox_core::result::AppResult;
use stashbox_database::DatabasePool;
use stashbox_database::error::map_db_error;
use stashbox_database::repositories::{BoxRepository, LocationRepository};
use stashbox_entity::location::{CreateLocation, Location};
use stashbox_entity::storage_box::StorageBox;

use crate::context::RequestContext;
use crate::text::non_empty;
use crate::retry::with_retry;

/// Request to create a location.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationRequest {
    /// Display name.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Optional description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Parent location; `None` creates a top-level location.
    pub parent_id: Option<Uuid>,
}

/// Request to rename a location or change its description.
///
/// At least one field must be set. An empty description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RenameLocationRequest {
    /// New display name.
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Manages location creation, renames, and listings.
#[derive(Debug, Clone)]
pub struct LocationService {
    /// Connection pool for transactions.
    db: DatabasePool,
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// Box repository.
    box_repo: Arc<BoxRepository>,
    /// Engine limits.
    engine: EngineConfig,
}

impl LocationService {
    /// Creates a new location service.
    pub fn new(
        db: DatabasePool,
        location_repo: Arc<LocationRepository>,
        box_repo: Arc<BoxRepository>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            db,
            location_repo,
            box_repo,
            engine,
        }
    }

    /// Gets a live location by ID.
    pub async fn get_location(&self, ctx: &RequestContext, location_id: Uuid) -> AppResult<Location> {
        self.location_repo
            .find_by_id(ctx.workspace_id, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Location not found"))
    }

    /// Lists live direct children of `parent_id`, or top-level locations.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Location>> {
        let parent = match parent_id {
            Some(id) => Some(self.get_location(ctx, id).await?),
            None => None,
        };

        let children = self
            .location_repo
            .find_children(ctx.workspace_id, parent.as_ref().map(|p| &p.path))
            .await?;

        debug!(
            workspace_id = %ctx.workspace_id,
            parent_id = ?parent_id,
            count = children.len(),
            "Listed child locations"
        );
        Ok(children)
    }

    /// Lists boxes placed directly at a live location.
    pub async fn list_boxes(&self, ctx: &RequestContext, location_id: Uuid) -> AppResult<Vec<StorageBox>> {
        let location = self.get_location(ctx, location_id).await?;
        self.box_repo
            .list_by_location(ctx.workspace_id, location.id)
            .await
    }

    /// Creates a location under `parent_id`, or at the top level.
    pub async fn create_location(
        &self,
        ctx: &RequestContext,
        req: CreateLocationRequest,
    ) -> AppResult<Location> {
        req.validate()?;
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Location name cannot be blank"));
        }

        let req = &req;
        with_retry("create_location", self.engine.transaction_retries, move || {
            self.create_once(ctx, req)
        })
        .await
    }

    async fn create_once(
        &self,
        ctx: &RequestContext,
        req: &CreateLocationRequest,
    ) -> AppResult<Location> {
        let name = req.name.trim();
        let mut tx = self.db.begin().await?;

        // Share lock so the parent cannot be renamed or deleted under us.
        let parent = match req.parent_id {
            Some(parent_id) => Some(
                self.location_repo
                    .find_for_share_tx(&mut tx, ctx.workspace_id, parent_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Parent location not found"))?,
            ),
            None => None,
        };

        let path = LocationPath::compose(parent.as_ref().map(|p| &p.path), name)?;

        if self
            .location_repo
            .path_exists_tx(&mut tx, ctx.workspace_id, &path)
            .await?
        {
            return Err(AppError::sibling_conflict(format!(
                "A location named '{name}' already exists here"
            )));
        }

        let record = CreateLocation {
            workspace_id: ctx.workspace_id,
            name: name.to_string(),
            description: non_empty(req.description.as_deref()),
            path,
        };
        let location = self.location_repo.insert_tx(&mut tx, &record).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit location"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            location_id = %location.id,
            path = %location.path,
            "Location created"
        );

        Ok(location)
    }

    /// Renames a location, rewriting its own and every live descendant's path.
    pub async fn rename_location(
        &self,
        ctx: &RequestContext,
        location_id: Uuid,
        req: RenameLocationRequest,
    ) -> AppResult<Location> {
        req.validate()?;
        if req.name.is_none() && req.description.is_none() {
            return Err(AppError::validation("Provide a new name or description"));
        }
        if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Location name cannot be blank"));
        }

        let req = &req;
        with_retry("rename_location", self.engine.transaction_retries, move || {
            self.rename_once(ctx, location_id, req)
        })
        .await
    }

    async fn rename_once(
        &self,
        ctx: &RequestContext,
        location_id: Uuid,
        req: &RenameLocationRequest,
    ) -> AppResult<Location> {
        let mut tx = self.db.begin().await?;

        let current = self
            .location_repo
            .lock_tx(&mut tx, ctx.workspace_id, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Location not found"))?;

        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.name);
        let description = match req.description.as_deref() {
            Some(d) => non_empty(Some(d)),
            None => current.description.clone(),
        };
        let new_path = current.path.with_last_segment(name);
        let path_changed = new_path != current.path;

        if path_changed {
            if self
                .location_repo
                .path_exists_tx(&mut tx, ctx.workspace_id, &new_path)
                .await?
            {
                return Err(AppError::sibling_conflict(format!(
                    "A location named '{name}' already exists here"
                )));
            }
        }

        let descendants = if path_changed {
            self.location_repo
                .lock_descendants_tx(&mut tx, ctx.workspace_id, &current.path)
                .await?
        } else {
            Vec::new()
        };

        let location = self
            .location_repo
            .update_node_tx(
                &mut tx,
                ctx.workspace_id,
                location_id,
                name,
                description.as_deref(),
                &new_path,
            )
            .await?;

        if path_changed {
            let rewritten = self
                .location_repo
                .rebase_descendants_tx(&mut tx, ctx.workspace_id, &current.path, &new_path)
                .await?;
            // The subtree is locked, so the rewrite must touch exactly the locked rows.
            if rewritten != descendants.len() as u64 {
                return Err(AppError::internal(format!(
                    "Rewrote {rewritten} descendant paths but locked {}",
                    descendants.len()
                )));
            }
            for old in &descendants {
                if let Some(rebased) = old.rebase(&current.path, &new_path) {
                    debug!(old_path = %old, path = %rebased, "Descendant path rewritten");
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit rename"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            location_id = %location_id,
            old_path = %current.path,
            path = %location.path,
            descendants = descendants.len(),
            "Location renamed"
        );

        Ok(location)
    }
}
