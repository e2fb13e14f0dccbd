//! Result of scanning a QR label.

use serde::{Deserialize, Serialize};

use super::model::QrCode;
use crate::location::{Breadcrumb, Location};
use crate::storage_box::StorageBox;

/// Everything a scan resolves to: the code, its box, and where the box is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResolution {
    /// The scanned code.
    pub qr_code: QrCode,
    /// The bound box, if any.
    pub storage_box: Option<StorageBox>,
    /// The box's location, if it has a live one.
    pub location: Option<Location>,
    /// Root-first trail to the location.
    pub breadcrumbs: Vec<Breadcrumb>,
}
