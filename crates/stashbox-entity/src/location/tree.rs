//! Tree and breadcrumb views over the location hierarchy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Location;

/// A location with its live children, for hierarchical display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationNode {
    /// Location ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Full path.
    pub path: String,
    /// Depth level (1 at the root).
    pub depth: i32,
    /// Boxes placed directly at this location.
    pub box_count: u64,
    /// Child nodes ordered by name.
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> u64 {
        1 + self.children.iter().map(LocationNode::size).sum::<u64>()
    }
}

/// A forest of location nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationTree {
    /// Top-level nodes.
    pub roots: Vec<LocationNode>,
    /// Total number of nodes across all roots.
    pub total_locations: u64,
}

impl LocationTree {
    /// Wrap a set of root nodes, counting their subtrees.
    pub fn new(roots: Vec<LocationNode>) -> Self {
        let total_locations = roots.iter().map(LocationNode::size).sum();
        Self {
            roots,
            total_locations,
        }
    }
}

/// One step on the path from the root to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Location ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Full path.
    pub path: String,
}

impl From<&Location> for Breadcrumb {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            path: location.path.to_string(),
        }
    }
}
