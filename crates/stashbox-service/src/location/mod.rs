//! Location hierarchy services.

pub mod service;
pub mod tree;

pub use service::{CreateLocationRequest, LocationService, RenameLocationRequest};
pub use tree::TreeService;
