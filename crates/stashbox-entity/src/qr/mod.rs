//! QR code domain entities.

pub mod model;
pub mod scan;
pub mod status;

pub use model::QrCode;
pub use scan::ScanResolution;
pub use status::QrStatus;
