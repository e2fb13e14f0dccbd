//! QR code lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a QR code.
///
/// ```text
/// generated --assign--> assigned --mark_printed--> printed
///     ^                    |                          |
///     +------unassign------+--------------------------+
/// ```
///
/// Any change of assignment lands back on `generated` or `assigned`; the
/// printed flag is never carried across boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "qr_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QrStatus {
    /// Fresh code, not bound to any box.
    Generated,
    /// Bound to exactly one box.
    Assigned,
    /// Bound to a box and a physical label has been produced.
    Printed,
}

impl QrStatus {
    /// Whether a code in this state is bound to a box.
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Assigned | Self::Printed)
    }

    /// Whether `assign` may start from this state.
    pub fn can_assign(&self) -> bool {
        matches!(self, Self::Generated)
    }

    /// Whether `unassign` may start from this state.
    pub fn can_unassign(&self) -> bool {
        self.is_linked()
    }

    /// Whether `mark_printed` may start from this state.
    pub fn can_mark_printed(&self) -> bool {
        matches!(self, Self::Assigned)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Assigned => "assigned",
            Self::Printed => "printed",
        }
    }
}

impl fmt::Display for QrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generated" => Ok(Self::Generated),
            "assigned" => Ok(Self::Assigned),
            "printed" => Ok(Self::Printed),
            other => Err(format!("unknown QR status '{other}'")),
        }
    }
}
