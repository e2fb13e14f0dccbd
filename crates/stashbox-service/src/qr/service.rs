//! QR code generation, assignment, and scan resolution.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use stashbox_core::config::{EngineConfig, ShortIdConfig};
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_core::traits::ShortIdGenerator;
use stashbox_core::types::{PageRequest, PageResponse};
use stashbox_database::DatabasePool;
use stashbox_database::error::map_db_error;
use stashbox_database::repositories::{BoxRepository, LocationRepository, QrCodeRepository};
use stashbox_entity::qr::{QrCode, QrStatus, ScanResolution};

use super::assign::assign_in_tx;
use crate::context::RequestContext;
use crate::location::TreeService;
use crate::retry::with_retry;

/// Manages the QR code lifecycle.
#[derive(Debug, Clone)]
pub struct QrCodeService {
    /// Connection pool for transactions.
    db: DatabasePool,
    /// QR code repository.
    qr_repo: Arc<QrCodeRepository>,
    /// Box repository.
    box_repo: Arc<BoxRepository>,
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// Breadcrumbs for scan results.
    tree_service: Arc<TreeService>,
    /// Candidate label codes.
    generator: Arc<dyn ShortIdGenerator>,
    /// Short identifier settings.
    short_ids: ShortIdConfig,
    /// Engine limits.
    engine: EngineConfig,
}

impl QrCodeService {
    /// Creates a new QR code service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: DatabasePool,
        qr_repo: Arc<QrCodeRepository>,
        box_repo: Arc<BoxRepository>,
        location_repo: Arc<LocationRepository>,
        tree_service: Arc<TreeService>,
        generator: Arc<dyn ShortIdGenerator>,
        short_ids: ShortIdConfig,
        engine: EngineConfig,
    ) -> Self {
        Self {
            db,
            qr_repo,
            box_repo,
            location_repo,
            tree_service,
            generator,
            short_ids,
            engine,
        }
    }

    /// Gets a QR code by ID.
    pub async fn get(&self, ctx: &RequestContext, qr_code_id: Uuid) -> AppResult<QrCode> {
        self.qr_repo
            .find_by_id(ctx.workspace_id, qr_code_id)
            .await?
            .ok_or_else(|| AppError::not_found("QR code not found"))
    }

    /// Lists QR codes, optionally only those in `status`.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        status: Option<QrStatus>,
        page: PageRequest,
    ) -> AppResult<PageResponse<QrCode>> {
        self.qr_repo.list(ctx.workspace_id, status, page).await
    }

    /// Generates `quantity` fresh codes in one transaction.
    pub async fn generate_batch(&self, ctx: &RequestContext, quantity: u32) -> AppResult<Vec<QrCode>> {
        if quantity == 0 || quantity > self.engine.max_batch_size {
            return Err(AppError::validation(format!(
                "Quantity must be between 1 and {}",
                self.engine.max_batch_size
            )));
        }

        with_retry("generate_qr_codes", self.engine.transaction_retries, move || {
            self.generate_once(ctx, quantity)
        })
        .await
    }

    async fn generate_once(&self, ctx: &RequestContext, quantity: u32) -> AppResult<Vec<QrCode>> {
        let mut tx = self.db.begin().await?;
        let mut codes = Vec::with_capacity(quantity as usize);

        for _ in 0..quantity {
            let mut inserted = None;
            for _ in 0..self.short_ids.max_attempts {
                let candidate = self.generator.generate();
                inserted = self
                    .qr_repo
                    .try_insert_tx(&mut tx, ctx.workspace_id, &candidate)
                    .await?;
                if inserted.is_some() {
                    break;
                }
                debug!(short_id = %candidate, "QR short ID collision");
            }

            let Some(code) = inserted else {
                error!(
                    workspace_id = %ctx.workspace_id,
                    attempts = self.short_ids.max_attempts,
                    "Could not find a free QR short ID"
                );
                return Err(AppError::short_id_exhausted(format!(
                    "No free QR short ID after {} attempts",
                    self.short_ids.max_attempts
                )));
            };
            codes.push(code);
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit QR codes"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            count = codes.len(),
            "QR codes generated"
        );

        Ok(codes)
    }

    /// Binds a `generated` code to a box.
    ///
    /// Assigning a code to the box that already holds it succeeds without
    /// changes.
    pub async fn assign(&self, ctx: &RequestContext, qr_code_id: Uuid, box_id: Uuid) -> AppResult<QrCode> {
        with_retry("assign_qr_code", self.engine.transaction_retries, move || {
            self.assign_once(ctx, qr_code_id, box_id)
        })
        .await
    }

    async fn assign_once(&self, ctx: &RequestContext, qr_code_id: Uuid, box_id: Uuid) -> AppResult<QrCode> {
        let mut tx = self.db.begin().await?;

        self.box_repo
            .find_for_share_tx(&mut tx, ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::not_found("Box not found"))?;

        let code = assign_in_tx(&self.qr_repo, &mut tx, ctx.workspace_id, qr_code_id, box_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit QR assignment"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            qr_code_id = %qr_code_id,
            box_id = %box_id,
            "QR code assigned"
        );

        Ok(code)
    }

    /// Releases a linked code back to `generated`.
    pub async fn unassign(&self, ctx: &RequestContext, qr_code_id: Uuid) -> AppResult<QrCode> {
        with_retry("unassign_qr_code", self.engine.transaction_retries, move || {
            self.unassign_once(ctx, qr_code_id)
        })
        .await
    }

    async fn unassign_once(&self, ctx: &RequestContext, qr_code_id: Uuid) -> AppResult<QrCode> {
        let mut tx = self.db.begin().await?;

        let Some(code) = self
            .qr_repo
            .release_tx(&mut tx, ctx.workspace_id, qr_code_id)
            .await?
        else {
            let existing = self
                .qr_repo
                .find_by_id_tx(&mut tx, ctx.workspace_id, qr_code_id)
                .await?
                .ok_or_else(|| AppError::not_found("QR code not found"))?;
            return Err(AppError::invalid_state(format!(
                "QR code {} is {}, not assigned",
                existing.short_id, existing.status
            )));
        };

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit QR release"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            qr_code_id = %qr_code_id,
            "QR code unassigned"
        );

        Ok(code)
    }

    /// Records that the label of an `assigned` code has been printed.
    pub async fn mark_printed(&self, ctx: &RequestContext, qr_code_id: Uuid) -> AppResult<QrCode> {
        with_retry("mark_qr_code_printed", self.engine.transaction_retries, move || {
            self.mark_printed_once(ctx, qr_code_id)
        })
        .await
    }

    async fn mark_printed_once(&self, ctx: &RequestContext, qr_code_id: Uuid) -> AppResult<QrCode> {
        let mut tx = self.db.begin().await?;

        let Some(code) = self
            .qr_repo
            .mark_printed_tx(&mut tx, ctx.workspace_id, qr_code_id)
            .await?
        else {
            let existing = self
                .qr_repo
                .find_by_id_tx(&mut tx, ctx.workspace_id, qr_code_id)
                .await?
                .ok_or_else(|| AppError::not_found("QR code not found"))?;
            return Err(AppError::invalid_state(format!(
                "QR code {} is {}, only assigned codes can be printed",
                existing.short_id, existing.status
            )));
        };

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit QR print"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            qr_code_id = %qr_code_id,
            "QR code marked printed"
        );

        Ok(code)
    }

    /// Resolves a scanned label to its code, box, and the box's location.
    pub async fn resolve_scan(&self, ctx: &RequestContext, short_id: &str) -> AppResult<ScanResolution> {
        let short_id = short_id.trim();
        let qr_code = self
            .qr_repo
            .find_by_short_id(ctx.workspace_id, short_id)
            .await?
            .ok_or_else(|| AppError::not_found("QR code not found"))?;

        let storage_box = match qr_code.box_id {
            Some(box_id) => self.box_repo.find_by_id(ctx.workspace_id, box_id).await?,
            None => None,
        };

        let location = match storage_box.as_ref().and_then(|b| b.location_id) {
            Some(location_id) => {
                self.location_repo
                    .find_by_id(ctx.workspace_id, location_id)
                    .await?
            }
            None => None,
        };

        let breadcrumbs = match &location {
            Some(location) => {
                self.tree_service
                    .breadcrumbs_for(ctx.workspace_id, location)
                    .await?
            }
            None => Vec::new(),
        };

        debug!(
            workspace_id = %ctx.workspace_id,
            short_id = %short_id,
            box_id = ?qr_code.box_id,
            "QR scan resolved"
        );

        Ok(ScanResolution {
            qr_code,
            storage_box,
            location,
            breadcrumbs,
        })
    }
}
