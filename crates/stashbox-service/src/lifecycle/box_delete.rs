//! Box deletion with release of its QR code.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use stashbox_core::config::EngineConfig;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::DatabasePool;
use stashbox_database::error::map_db_error;
use stashbox_database::repositories::{BoxRepository, QrCodeRepository};

use crate::context::RequestContext;
use crate::retry::with_retry;

/// Deletes boxes, returning any QR code they carried to `generated`.
#[derive(Debug, Clone)]
pub struct BoxDeletion {
    db: DatabasePool,
    box_repo: Arc<BoxRepository>,
    qr_repo: Arc<QrCodeRepository>,
    engine: EngineConfig,
}

impl BoxDeletion {
    /// Creates a new box deletion coordinator.
    pub fn new(
        db: DatabasePool,
        box_repo: Arc<BoxRepository>,
        qr_repo: Arc<QrCodeRepository>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            db,
            box_repo,
            qr_repo,
            engine,
        }
    }

    /// Deletes a box and returns the ID of the QR code it released, if any.
    pub async fn delete(&self, ctx: &RequestContext, box_id: Uuid) -> AppResult<Option<Uuid>> {
        with_retry("delete_box", self.engine.transaction_retries, move || {
            self.delete_once(ctx, box_id)
        })
        .await
    }

    async fn delete_once(&self, ctx: &RequestContext, box_id: Uuid) -> AppResult<Option<Uuid>> {
        let mut tx = self.db.begin().await?;

        self.box_repo
            .lock_tx(&mut tx, ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::not_found("Box not found"))?;

        // Release first; the foreign key refuses to drop a box still holding a code.
        let released = self
            .qr_repo
            .release_by_box_tx(&mut tx, ctx.workspace_id, box_id)
            .await?;

        self.box_repo
            .delete_tx(&mut tx, ctx.workspace_id, box_id)
            .await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit box delete"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            box_id = %box_id,
            qr_code_id = ?released,
            "Box deleted"
        );

        Ok(released)
    }
}
