//! # stashbox-service
//!
//! Business logic for the location hierarchy and the box/QR lifecycle.
//! Each service owns its repositories through `Arc` references and runs
//! every multi-step mutation inside a single database transaction.
//!
//! Callers are expected to have authorized the user for the workspace
//! before building a [`RequestContext`].

pub mod context;
pub mod lifecycle;
pub mod location;
pub mod qr;
pub mod retry;
pub mod services;
pub mod short_id;
pub mod storage_box;

mod text;

pub use context::RequestContext;
pub use lifecycle::{BoxDeletion, LocationLifecycle};
pub use location::{CreateLocationRequest, LocationService, RenameLocationRequest, TreeService};
pub use qr::QrCodeService;
pub use services::Services;
pub use short_id::RandomShortIdGenerator;
pub use storage_box::{BoxService, CreateBoxRequest, FieldUpdate, UpdateBoxRequest};
