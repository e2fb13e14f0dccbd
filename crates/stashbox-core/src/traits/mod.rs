//! Core traits defined in `stashbox-core` and implemented by other crates.

pub mod short_id;

pub use short_id::ShortIdGenerator;
