//! Location domain entities.

pub mod model;
pub mod tree;

pub use model::{CreateLocation, Location};
pub use tree::{Breadcrumb, LocationNode, LocationTree};
