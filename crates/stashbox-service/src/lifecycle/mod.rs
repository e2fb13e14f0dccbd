//! Multi-table operations that must commit or roll back as one unit.

pub mod box_delete;
pub mod location_delete;

pub use box_delete::BoxDeletion;
pub use location_delete::LocationLifecycle;
