//! Core type definitions used across the Stashbox workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
