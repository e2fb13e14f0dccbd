//! # stashbox-entity
//!
//! Domain entity models for Stashbox. Database rows derive `sqlx::FromRow`;
//! everything derives `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod location;
pub mod qr;
pub mod storage_box;
