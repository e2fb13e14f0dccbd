//! Lifecycle engine and short identifier settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Format of the human-facing short identifiers.
///
/// A short id is `prefix` followed by `length` characters drawn from
/// `A-Z0-9`.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ShortIdConfig {
    /// Constant prefix printed on QR labels.
    #[serde(default = "default_qr_prefix")]
    #[validate(length(max = 8))]
    pub qr_prefix: String,
    /// Random characters after the QR prefix.
    #[serde(default = "default_length")]
    #[validate(range(min = 4, max = 32))]
    pub qr_length: usize,
    /// Constant prefix for box codes.
    #[serde(default)]
    #[validate(length(max = 8))]
    pub box_prefix: String,
    /// Random characters after the box prefix.
    #[serde(default = "default_length")]
    #[validate(range(min = 4, max = 32))]
    pub box_length: usize,
    /// Candidates tried per identifier before giving up.
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: u32,
}

impl Default for ShortIdConfig {
    fn default() -> Self {
        Self {
            qr_prefix: default_qr_prefix(),
            qr_length: default_length(),
            box_prefix: String::new(),
            box_length: default_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Limits applied by the lifecycle services.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest QR batch a single call may generate.
    #[serde(default = "default_max_batch_size")]
    #[validate(range(min = 1, max = 10000))]
    pub max_batch_size: u32,
    /// Extra attempts after a transaction conflict.
    #[serde(default = "default_transaction_retries")]
    #[validate(range(max = 5))]
    pub transaction_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            transaction_retries: default_transaction_retries(),
        }
    }
}

fn default_qr_prefix() -> String {
    "QR-".to_string()
}

fn default_length() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_batch_size() -> u32 {
    100
}

fn default_transaction_retries() -> u32 {
    1
}
