//! Box entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A physical container of items.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorageBox {
    /// Unique box identifier.
    pub id: Uuid,
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Compact human-facing code.
    pub short_id: String,
    /// Box name.
    pub name: String,
    /// Optional description of the contents.
    pub description: Option<String>,
    /// Free-form tags, de-duplicated and sorted.
    pub tags: Vec<String>,
    /// Where the box currently sits. Cleared when the location is deleted.
    pub location_id: Option<Uuid>,
    /// The QR code bound to this box, read from the QR side of the link.
    pub qr_code_id: Option<Uuid>,
    /// When the box was created.
    pub created_at: DateTime<Utc>,
    /// When the box was last updated.
    pub updated_at: DateTime<Utc>,
}

impl StorageBox {
    /// Whether a QR label is bound to this box.
    pub fn has_qr_code(&self) -> bool {
        self.qr_code_id.is_some()
    }
}

/// Data required to insert a box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStorageBox {
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Generated short code.
    pub short_id: String,
    /// Box name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Normalized tags.
    pub tags: Vec<String>,
    /// Initial location.
    pub location_id: Option<Uuid>,
}

/// Editable box fields, written as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStorageBox {
    /// Box name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Normalized tags.
    pub tags: Vec<String>,
    /// Current location.
    pub location_id: Option<Uuid>,
}

impl From<&StorageBox> for UpdateStorageBox {
    fn from(existing: &StorageBox) -> Self {
        Self {
            name: existing.name.clone(),
            description: existing.description.clone(),
            tags: existing.tags.clone(),
            location_id: existing.location_id,
        }
    }
}

/// Trim tags, drop blanks and duplicates, and sort them.
///
/// Tags form a set, so insertion order carries no meaning.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags_is_a_set() {
        let tags = normalize_tags(["winter ", "tools", "", "winter", "  "]);
        assert_eq!(tags, vec!["tools".to_string(), "winter".to_string()]);
    }

    #[test]
    fn test_normalize_tags_ignores_order() {
        assert_eq!(normalize_tags(["b", "a"]), normalize_tags(["a", "b"]));
    }
}
