//! Box domain entities.
//!
//! `box` is a reserved word in Rust, so the entity is named [`StorageBox`].

pub mod model;

pub use model::{CreateStorageBox, StorageBox, UpdateStorageBox, normalize_tags};
