//! QR code repository implementation.
//!
//! State transitions are written as conditional updates: the `WHERE` clause
//! carries the allowed source state, so two racing writers cannot both win.
//! A method that matched no row returns `None`/`false` and the service layer
//! re-reads the code to report why.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_core::types::{PageRequest, PageResponse};
use stashbox_entity::qr::{QrCode, QrStatus};

use crate::error::map_db_error;

const QR_COLUMNS: &str = "id, workspace_id, short_id, status, box_id, created_at, updated_at";

/// Repository for QR code rows.
#[derive(Debug, Clone)]
pub struct QrCodeRepository {
    pool: PgPool,
}

impl QrCodeRepository {
    /// Create a new QR code repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a QR code by ID.
    pub async fn find_by_id(&self, workspace_id: Uuid, id: Uuid) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE id = $1 AND workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to find QR code"))
    }

    /// Find a QR code by ID inside a transaction.
    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE id = $1 AND workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to find QR code"))
    }

    /// Find a QR code by the short ID printed on its label.
    pub async fn find_by_short_id(
        &self,
        workspace_id: Uuid,
        short_id: &str,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE short_id = $1 AND workspace_id = $2"
        ))
        .bind(short_id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to find QR code"))
    }

    /// Find the code currently bound to a box.
    pub async fn find_by_box_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        box_id: Uuid,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE box_id = $1 AND workspace_id = $2"
        ))
        .bind(box_id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to find QR code for box"))
    }

    /// Insert a fresh `generated` code unless its short ID is taken.
    ///
    /// Returns `None` on a collision; the transaction stays usable.
    pub async fn try_insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        short_id: &str,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "INSERT INTO qr_codes (id, workspace_id, short_id, status) \
             VALUES ($1, $2, $3, 'generated') \
             ON CONFLICT (short_id) DO NOTHING \
             RETURNING {QR_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(workspace_id)
        .bind(short_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to create QR code"))
    }

    /// Bind a `generated` code to a box.
    ///
    /// Returns `None` when the code does not exist or is no longer
    /// `generated`. Fails with `AlreadyAssigned` if the box already holds
    /// another code.
    pub async fn assign_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
        box_id: Uuid,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "UPDATE qr_codes \
             SET status = 'assigned', box_id = $3, updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2 AND status = 'generated' \
             RETURNING {QR_COLUMNS}"
        ))
        .bind(id)
        .bind(workspace_id)
        .bind(box_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to assign QR code"))
    }

    /// Return a linked code to `generated`.
    ///
    /// Returns `None` when the code does not exist or is not linked.
    pub async fn release_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "UPDATE qr_codes \
             SET status = 'generated', box_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2 AND status IN ('assigned', 'printed') \
             RETURNING {QR_COLUMNS}"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to release QR code"))
    }

    /// Release whatever code is bound to a box, returning its ID.
    pub async fn release_by_box_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        box_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE qr_codes \
             SET status = 'generated', box_id = NULL, updated_at = NOW() \
             WHERE box_id = $1 AND workspace_id = $2 \
             RETURNING id",
        )
        .bind(box_id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to release QR code for box"))
    }

    /// Move an `assigned` code to `printed`.
    ///
    /// Returns `None` when the code does not exist or is not `assigned`.
    pub async fn mark_printed_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<QrCode>> {
        sqlx::query_as::<_, QrCode>(&format!(
            "UPDATE qr_codes \
             SET status = 'printed', updated_at = NOW() \
             WHERE id = $1 AND workspace_id = $2 AND status = 'assigned' \
             RETURNING {QR_COLUMNS}"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_db_error(e, "Failed to mark QR code printed"))
    }

    /// List a workspace's codes, oldest first, optionally filtered by status.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        status: Option<QrStatus>,
        page: PageRequest,
    ) -> AppResult<PageResponse<QrCode>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM qr_codes \
             WHERE workspace_id = $1 AND ($2::qr_status IS NULL OR status = $2)",
        )
        .bind(workspace_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to count QR codes"))?;

        let codes = sqlx::query_as::<_, QrCode>(&format!(
            "SELECT {QR_COLUMNS} FROM qr_codes \
             WHERE workspace_id = $1 AND ($2::qr_status IS NULL OR status = $2) \
             ORDER BY created_at ASC, id ASC LIMIT $3 OFFSET $4"
        ))
        .bind(workspace_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to list QR codes"))?;

        Ok(PageResponse::new(codes, page, total as u64))
    }
}
