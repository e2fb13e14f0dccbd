//! Box creation, updates, and listings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;
use validator::Validate;

use stashbox_core::config::{EngineConfig, ShortIdConfig};
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_core::traits::ShortIdGenerator;
use stashbox_core::types::{PageRequest, PageResponse};
use stashbox_database::DatabasePool;
use stashbox_database::error::map_db_error;
use stashbox_database::repositories::{BoxRepository, LocationRepository, QrCodeRepository};
use stashbox_entity::storage_box::{CreateStorageBox, StorageBox, UpdateStorageBox, normalize_tags};

use crate::context::RequestContext;
use crate::text::non_empty;
use crate::qr::assign_in_tx;
use crate::retry::with_retry;

const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// Change to an optional field: keep it, clear it, or set a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum FieldUpdate<T> {
    /// Keep the current value.
    #[default]
    Leave,
    /// Remove the current value.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Apply the update to `current`.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Leave => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// Request to create a box.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBoxRequest {
    /// Box name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Optional description.
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Where the box is placed.
    pub location_id: Option<Uuid>,
    /// QR code to bind on creation.
    pub qr_code_id: Option<Uuid>,
}

/// Partial update of a box.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBoxRequest {
    /// New name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Description change.
    #[serde(default)]
    pub description: FieldUpdate<String>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
    /// Location change.
    #[serde(default)]
    pub location: FieldUpdate<Uuid>,
    /// QR code change. Setting a new code releases the previous one.
    #[serde(default)]
    pub qr_code: FieldUpdate<Uuid>,
}

/// Manages box CRUD and the box side of QR assignment.
#[derive(Debug, Clone)]
pub struct BoxService {
    /// Connection pool for transactions.
    db: DatabasePool,
    /// Box repository.
    box_repo: Arc<BoxRepository>,
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// QR code repository.
    qr_repo: Arc<QrCodeRepository>,
    /// Candidate box codes.
    generator: Arc<dyn ShortIdGenerator>,
    /// Short identifier settings.
    short_ids: ShortIdConfig,
    /// Engine limits.
    engine: EngineConfig,
}

impl BoxService {
    /// Creates a new box service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: DatabasePool,
        box_repo: Arc<BoxRepository>,
        location_repo: Arc<LocationRepository>,
        qr_repo: Arc<QrCodeRepository>,
        generator: Arc<dyn ShortIdGenerator>,
        short_ids: ShortIdConfig,
        engine: EngineConfig,
    ) -> Self {
        Self {
            db,
            box_repo,
            location_repo,
            qr_repo,
            generator,
            short_ids,
            engine,
        }
    }

    /// Gets a box by ID.
    pub async fn get_box(&self, ctx: &RequestContext, box_id: Uuid) -> AppResult<StorageBox> {
        self.box_repo
            .find_by_id(ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::not_found("Box not found"))
    }

    /// Lists the workspace's boxes, newest first.
    pub async fn list_boxes(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> AppResult<PageResponse<StorageBox>> {
        let result = self.box_repo.list(ctx.workspace_id, page).await?;
        debug!(
            workspace_id = %ctx.workspace_id,
            page = result.page,
            total = result.total_items,
            "Listed boxes"
        );
        Ok(result)
    }

    /// Creates a box, optionally placed at a location and carrying a QR code.
    pub async fn create_box(&self, ctx: &RequestContext, req: CreateBoxRequest) -> AppResult<StorageBox> {
        req.validate()?;
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Box name cannot be blank"));
        }

        let req = &req;
        with_retry("create_box", self.engine.transaction_retries, move || {
            self.create_once(ctx, req)
        })
        .await
    }

    async fn create_once(&self, ctx: &RequestContext, req: &CreateBoxRequest) -> AppResult<StorageBox> {
        let mut tx = self.db.begin().await?;

        if let Some(location_id) = req.location_id {
            self.location_repo
                .find_for_share_tx(&mut tx, ctx.workspace_id, location_id)
                .await?
                .ok_or_else(|| AppError::not_found("Location not found"))?;
        }

        let mut record = CreateStorageBox {
            workspace_id: ctx.workspace_id,
            short_id: String::new(),
            name: req.name.trim().to_string(),
            description: non_empty(req.description.as_deref()),
            tags: normalize_tags(&req.tags),
            location_id: req.location_id,
        };

        let mut box_id = None;
        for _ in 0..self.short_ids.max_attempts {
            record.short_id = self.generator.generate();
            box_id = self.box_repo.try_insert_tx(&mut tx, &record).await?;
            if box_id.is_some() {
                break;
            }
            debug!(short_id = %record.short_id, "Box short ID collision");
        }
        let Some(box_id) = box_id else {
            error!(
                workspace_id = %ctx.workspace_id,
                attempts = self.short_ids.max_attempts,
                "Could not find a free box short ID"
            );
            return Err(AppError::short_id_exhausted(format!(
                "No free box short ID after {} attempts",
                self.short_ids.max_attempts
            )));
        };

        if let Some(qr_code_id) = req.qr_code_id {
            assign_in_tx(&self.qr_repo, &mut tx, ctx.workspace_id, qr_code_id, box_id).await?;
        }

        let created = self
            .box_repo
            .find_by_id_tx(&mut tx, ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::internal("Created box vanished before commit"))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit box"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            box_id = %created.id,
            short_id = %created.short_id,
            location_id = ?created.location_id,
            qr_code_id = ?created.qr_code_id,
            "Box created"
        );

        Ok(created)
    }

    /// Applies a partial update to a box.
    pub async fn update_box(
        &self,
        ctx: &RequestContext,
        box_id: Uuid,
        req: UpdateBoxRequest,
    ) -> AppResult<StorageBox> {
        req.validate()?;
        if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Box name cannot be blank"));
        }
        if matches!(&req.description, FieldUpdate::Set(d) if d.chars().count() > MAX_DESCRIPTION_CHARS)
        {
            return Err(AppError::validation(format!(
                "Description is limited to {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        let req = &req;
        with_retry("update_box", self.engine.transaction_retries, move || {
            self.update_once(ctx, box_id, req)
        })
        .await
    }

    async fn update_once(
        &self,
        ctx: &RequestContext,
        box_id: Uuid,
        req: &UpdateBoxRequest,
    ) -> AppResult<StorageBox> {
        let mut tx = self.db.begin().await?;

        let existing = self
            .box_repo
            .lock_tx(&mut tx, ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::not_found("Box not found"))?;

        let mut data = UpdateStorageBox::from(&existing);
        if let Some(name) = &req.name {
            data.name = name.trim().to_string();
        }
        let description = req.description.clone().apply(existing.description.clone());
        data.description = non_empty(description.as_deref());
        if let Some(tags) = &req.tags {
            data.tags = normalize_tags(tags);
        }
        data.location_id = req.location.clone().apply(existing.location_id);

        if let Some(location_id) = data
            .location_id
            .filter(|id| Some(*id) != existing.location_id)
        {
            self.location_repo
                .find_for_share_tx(&mut tx, ctx.workspace_id, location_id)
                .await?
                .ok_or_else(|| AppError::not_found("Location not found"))?;
        }

        self.box_repo
            .update_tx(&mut tx, ctx.workspace_id, box_id, &data)
            .await?;

        match &req.qr_code {
            FieldUpdate::Leave => {}
            FieldUpdate::Clear => {
                self.qr_repo
                    .release_by_box_tx(&mut tx, ctx.workspace_id, box_id)
                    .await?;
            }
            FieldUpdate::Set(qr_code_id) => {
                if existing.qr_code_id != Some(*qr_code_id) {
                    self.qr_repo
                        .release_by_box_tx(&mut tx, ctx.workspace_id, box_id)
                        .await?;
                    assign_in_tx(&self.qr_repo, &mut tx, ctx.workspace_id, *qr_code_id, box_id)
                        .await?;
                }
            }
        }

        let updated = self
            .box_repo
            .find_by_id_tx(&mut tx, ctx.workspace_id, box_id)
            .await?
            .ok_or_else(|| AppError::internal("Updated box vanished before commit"))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error(e, "Failed to commit box update"))?;

        info!(
            workspace_id = %ctx.workspace_id,
            user_id = %ctx.user_id,
            box_id = %box_id,
            location_id = ?updated.location_id,
            qr_code_id = ?updated.qr_code_id,
            "Box updated"
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_update_apply() {
        assert_eq!(FieldUpdate::Leave.apply(Some(1)), Some(1));
        assert_eq!(FieldUpdate::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(FieldUpdate::Set(2).apply(None), Some(2));
    }

    #[test]
    fn test_field_update_wire_format() {
        let set: FieldUpdate<String> =
            serde_json::from_str(r#"{"op":"set","value":"x"}"#).unwrap();
        assert_eq!(set, FieldUpdate::Set("x".to_string()));

        let clear: FieldUpdate<String> = serde_json::from_str(r#"{"op":"clear"}"#).unwrap();
        assert_eq!(clear, FieldUpdate::Clear);
    }

    #[test]
    fn test_update_request_defaults_leave_everything() {
        let req: UpdateBoxRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.location, FieldUpdate::Leave);
        assert_eq!(req.qr_code, FieldUpdate::Leave);
        assert_eq!(req.description, FieldUpdate::Leave);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_long_name() {
        let req = CreateBoxRequest {
            name: "b".repeat(101),
            description: None,
            tags: Vec::new(),
            location_id: None,
            qr_code_id: None,
        };
        assert!(req.validate().is_err());
    }
}
