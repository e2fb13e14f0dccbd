//! QR code entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::QrStatus;

/// A printable QR code that can be bound to one box.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QrCode {
    /// Unique QR code identifier.
    pub id: Uuid,
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Code encoded in the label, e.g. `QR-7K2M9XQ4`.
    pub short_id: String,
    /// Lifecycle state.
    pub status: QrStatus,
    /// Bound box; set exactly when the status is linked.
    pub box_id: Option<Uuid>,
    /// When the code was generated.
    pub created_at: DateTime<Utc>,
    /// When the code was last updated.
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    /// Whether the status and box link agree.
    pub fn is_consistent(&self) -> bool {
        self.status.is_linked() == self.box_id.is_some()
    }

    /// Whether this code is bound to `box_id`.
    pub fn is_bound_to(&self, box_id: Uuid) -> bool {
        self.box_id == Some(box_id)
    }
}
