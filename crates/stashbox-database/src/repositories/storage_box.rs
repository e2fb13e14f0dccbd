//! Box repository implementation.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_core::types::{PageRequest, PageResponse};
use stashbox_entity::storage_box::{CreateStorageBox, StorageBox, UpdateStorageBox};

use crate::error::map_db_error;

/// Box columns plus the QR link read from the QR side.
const BOX_SELECT: &str = "SELECT b.id, b.workspace_id, b.short_id, b.name, b.description, \
     b.tags, b.location_id, q.id AS qr_code_id, b.created_at, b.updated_at \
     FROM boxes b LEFT JOIN qr_codes q ON q.box_id = b.id";

/// Repository for box rows.
#[derive(Debug, Clone)]
pub struct BoxRepository {
    pool: PgPool,
}

impl BoxRepository {
    /// Create a new box repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a box by ID.
    pub async fn find_by_id(&self, workspace_id: Uuid, id: Uuid) -> AppResult<Option<StorageBox>> {
        sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.id = $1 AND b.workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to find box"))
    }

    /// Find a box by ID inside a transaction.
    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<StorageBox>> {
        sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.id = $1 AND b.workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to find box"))
    }

    /// Read a box and hold an exclusive lock on its row.
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<StorageBox>> {
        sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.id = $1 AND b.workspace_id = $2 FOR UPDATE OF b"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to lock box"))
    }

    /// Read a box and hold a share lock so it cannot be deleted meanwhile.
    pub async fn find_for_share_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<StorageBox>> {
        sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.id = $1 AND b.workspace_id = $2 FOR SHARE OF b"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to lock box"))
    }

    /// Insert a box unless its short ID is taken.
    ///
    /// Returns `None` on a short-ID collision so the caller can retry with a
    /// new candidate. `ON CONFLICT` keeps the collision from aborting the
    /// surrounding transaction.
    pub async fn try_insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        data: &CreateStorageBox,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO boxes (id, workspace_id, short_id, name, description, tags, location_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (short_id) DO NOTHING \
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(data.workspace_id)
        .bind(&data.short_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.tags)
        .bind(data.location_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to create box"))
    }

    /// Overwrite a box's editable fields.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
        data: &UpdateStorageBox,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE boxes \
             SET name = $3, description = $4, tags = $5, location_id = $6, updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2",
        )
        .bind(id)
        .bind(workspace_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.tags)
        .bind(data.location_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to update box"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the location on every box placed at `location_id`.
    pub async fn detach_from_location_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE boxes SET location_id = NULL, updated_at = NOW() \
             WHERE workspace_id = $1 AND location_id = $2",
        )
        .bind(workspace_id)
        .bind(location_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to detach boxes from location"))?;
        Ok(result.rows_affected())
    }

    /// Remove a box row.
    ///
    /// Fails with `AlreadyAssigned` if a QR code still references the box;
    /// release the code first.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM boxes WHERE id = $1 AND workspace_id = $2")
            .bind(id)
            .bind(workspace_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_db_error(e, "Failed to delete box"))?;
        Ok(result.rows_affected() > 0)
    }

    /// List a workspace's boxes, newest first.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<StorageBox>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boxes WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to count boxes"))?;

        let boxes = sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.workspace_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(workspace_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to list boxes"))?;

        Ok(PageResponse::new(boxes, page, total as u64))
    }

    /// List boxes placed directly at a location, by name.
    pub async fn list_by_location(
        &self,
        workspace_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<Vec<StorageBox>> {
        sqlx::query_as::<_, StorageBox>(&format!(
            "{BOX_SELECT} WHERE b.workspace_id = $1 AND b.location_id = $2 ORDER BY b.name ASC"
        ))
        .bind(workspace_id)
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to list boxes at location"))
    }
}
