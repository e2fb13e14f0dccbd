//! Repository implementations for all Stashbox entities.

pub mod location;
pub mod qr_code;
pub mod storage_box;

pub use location::LocationRepository;
pub use qr_code::QrCodeRepository;
pub use storage_box::BoxRepository;
