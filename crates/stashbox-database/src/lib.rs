//! # stashbox-database
//!
//! PostgreSQL connection management, migrations, and the repositories for
//! locations, boxes, and QR codes.
//!
//! Repositories expose two flavours of method: plain reads against the pool,
//! and `_tx` methods that run inside a caller-owned transaction so the
//! service layer can compose several writes into one atomic unit.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{BoxRepository, LocationRepository, QrCodeRepository};
