//! Source of candidate short identifiers.

use std::fmt::Debug;

/// Produces candidate short identifiers for boxes and QR codes.
///
/// Implementations only propose candidates. Uniqueness is decided by the
/// database's unique constraints, and callers retry on collision up to a
/// bounded number of attempts.
pub trait ShortIdGenerator: Debug + Send + Sync + 'static {
    /// Propose a fresh candidate.
    fn generate(&self) -> String;
}
