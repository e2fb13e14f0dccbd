//! QR code lifecycle services.

mod assign;
pub mod service;

pub(crate) use assign::assign_in_tx;
pub use service::QrCodeService;
