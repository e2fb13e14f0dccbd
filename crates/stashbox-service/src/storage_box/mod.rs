//! Box services.

pub mod service;

pub use service::{BoxService, CreateBoxRequest, FieldUpdate, UpdateBoxRequest};
