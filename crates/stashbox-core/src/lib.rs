//! # stashbox-core
//!
//! Core crate for Stashbox. Contains the unified error system, configuration
//! schemas, the pure path builder for the location hierarchy, pagination
//! types, and the short-identifier generator trait.
//!
//! This crate has **no** internal dependencies on other Stashbox crates.

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
