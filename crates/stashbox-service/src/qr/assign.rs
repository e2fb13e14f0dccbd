//! Binding a QR code to a box inside a caller's transaction.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::repositories::QrCodeRepository;
use stashbox_entity::qr::QrCode;

/// Bind `qr_code_id` to `box_id`.
///
/// The caller must already hold a lock on the box row. Outcomes:
/// - the code is `generated`: it becomes `assigned` to the box;
/// - the code is already bound to this box: returned unchanged;
/// - the box holds a different code, or the code is bound to another box:
///   `AlreadyAssigned`;
/// - the code does not exist in the workspace: `NotFound`.
pub(crate) async fn assign_in_tx(
    qr_repo: &QrCodeRepository,
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    qr_code_id: Uuid,
    box_id: Uuid,
) -> AppResult<QrCode> {
    if let Some(held) = qr_repo.find_by_box_tx(tx, workspace_id, box_id).await? {
        if held.id == qr_code_id {
            return Ok(held);
        }
        return Err(AppError::already_assigned(format!(
            "Box already carries QR code {}",
            held.short_id
        )));
    }

    if let Some(code) = qr_repo
        .assign_tx(tx, workspace_id, qr_code_id, box_id)
        .await?
    {
        return Ok(code);
    }

    // The conditional update matched nothing: find out why.
    let code = qr_repo
        .find_by_id_tx(tx, workspace_id, qr_code_id)
        .await?
        .ok_or_else(|| AppError::not_found("QR code not found"))?;

    if code.is_bound_to(box_id) {
        Ok(code)
    } else {
        Err(AppError::already_assigned(format!(
            "QR code {} is already assigned to another box",
            code.short_id
        )))
    }
}
