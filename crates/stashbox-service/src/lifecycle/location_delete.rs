//! Soft deletion of a location together with its box placements.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use stashbox_core::config::EngineConfig;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::DatabasePool;
use stashbox_database::error::map_db_error;
use stashbox_database::repositories::{BoxRepository, LocationRepository};

use crate::context::RequestContext;
use crate::retry::with_retry;

/// Deletes locations.
///
/// The row is flagged, never removed, and boxes placed there lose their
/// location. QR codes are not touched. Descendant locations stay live.
#[derive(Debug, Clone)]
pub struct LocationLifecycle {
    db: DatabasePool,
    location_repo: Arc<LocationRepository>,
    box_repo: Arc<BoxRepository>,
    engine: EngineConfig,
}

impl LocationLifecycle {
    /// Creates a new location lifecycle coordinator.
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

    /// Soft-deletes a live location and returns how many boxes were detached.
    pub async fn delete(&self, ctx: &RequestContext, location_id: Uuid) -> AppResult<u64> {
        with_retry("delete_location", self.engine.transaction_retries, move || {
            self.delete_once(ctx, location_id)
        })
        .await
    }

    async fn delete_once(&self, ctx: &RequestContext, location_id: Uuid) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        let location = self
            .location_repo
            .lock_tx(&mut tx, ctx.workspace_id, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Location not found"))?;

        self.location_repo
            .soft_delete_tx(&mut tx, ctx.workspace_id, location_id)
            .await?;

        let detached = self
            .box_repo
            .detach_from_location_tx(&mut tx, ctx.workspace_id, location_id)
            .await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit location delete"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            location_id = %location_id,
            path = %location.path,
            boxes_detached = detached,
            "Location deleted"
        );

        Ok(detached)
    }
}
