//! Location tree building and breadcrumb trails.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::path::LocationPath;
use stashbox_core::result::AppResult;
use stashbox_database::repositories::LocationRepository;
use stashbox_entity::location::{Breadcrumb, Location, LocationNode, LocationTree};

use crate::context::RequestContext;

/// Builds location trees and resolves breadcrumb trails.
#[derive(Debug, Clone)]
pub struct TreeService {
    /// Location repository.
    location_repo: Arc<LocationRepository>,
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(location_repo: Arc<LocationRepository>) -> Self {
        Self { location_repo }
    }

    /// Builds the live tree under `root_id`, or the whole workspace forest.
    pub async fn get_tree(&self, ctx: &RequestContext, root_id: Option<Uuid>) -> AppResult<LocationTree> {
        let locations = match root_id {
            Some(id) => {
                let root = self
                    .location_repo
                    .find_by_id(ctx.workspace_id, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Location not found"))?;
                let descendants = self
                    .location_repo
                    .find_subtree(ctx.workspace_id, Some(&root.path))
                    .await?;
                let mut all = Vec::with_capacity(descendants.len() + 1);
                all.push(root);
                all.extend(descendants);
                all
            }
            None => self.location_repo.find_subtree(ctx.workspace_id, None).await?,
        };

        let ids: Vec<Uuid> = locations.iter().map(|l| l.id).collect();
        let box_counts = self
            .location_repo
            .count_boxes_batch(ctx.workspace_id, &ids)
            .await?;

        let tree = LocationTree::new(build_forest(&locations, &box_counts));
        debug!(
            workspace_id = %ctx.workspace_id,
            total = tree.total_locations,
            "Built location tree"
        );
        Ok(tree)
    }

    /// Gets the trail from the top of the tree down to a live location.
    pub async fn get_breadcrumbs(
        &self,
        ctx: &RequestContext,
        location_id: Uuid,
    ) -> AppResult<Vec<Breadcrumb>> {
        let location = self
            .location_repo
            .find_by_id(ctx.workspace_id, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Location not found"))?;
        self.breadcrumbs_for(ctx.workspace_id, &location).await
    }

    /// Live ancestors of `location` followed by the location itself.
    ///
    /// A soft-deleted ancestor leaves a gap in the trail.
    pub async fn breadcrumbs_for(
        &self,
        workspace_id: Uuid,
        location: &Location,
    ) -> AppResult<Vec<Breadcrumb>> {
        let ancestors = self
            .location_repo
            .find_ancestors(workspace_id, &location.path)
            .await?;

        let mut trail: Vec<Breadcrumb> = ancestors.iter().map(Breadcrumb::from).collect();
        trail.push(Breadcrumb::from(location));
        Ok(trail)
    }
}

/// Nest path-ordered locations into a forest.
///
/// A location whose parent is absent (outside the requested subtree or
/// soft-deleted) hangs off its nearest present ancestor, or becomes a root.
/// Siblings are ordered by name.
fn build_forest(locations: &[Location], box_counts: &HashMap<Uuid, u64>) -> Vec<LocationNode> {
    let mut roots = Vec::new();
    let mut open: Vec<(&LocationPath, LocationNode)> = Vec::new();

    for location in locations {
        while open
            .last()
            .is_some_and(|(path, _)| !path.is_ancestor_of(&location.path))
        {
            if let Some((_, node)) = open.pop() {
                close(&mut open, &mut roots, node);
            }
        }

        open.push((
            &location.path,
            LocationNode {
                id: location.id,
                name: location.name.clone(),
                path: location.path.to_string(),
                depth: location.depth,
                box_count: box_counts.get(&location.id).copied().unwrap_or(0),
                children: Vec::new(),
            },
        ));
    }

    while let Some((_, node)) = open.pop() {
        close(&mut open, &mut roots, node);
    }

    roots.sort_by(|a, b| a.name.cmp(&b.name));
    roots
}

fn close(open: &mut [(&LocationPath, LocationNode)], roots: &mut Vec<LocationNode>, mut node: LocationNode) {
    node.children.sort_by(|a, b| a.name.cmp(&b.name));
    match open.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => roots.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn location(name: &str, path: &str) -> Location {
        let path: LocationPath = path.parse().unwrap();
        Location {
            id: Uuid::new_v4(),
            workspace_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            depth: path.depth() as i32,
            path,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_nests_by_path() {
        let mut locations = vec![
            location("Garage", "garage"),
            location("Rack", "garage.rack"),
            location("Top Shelf", "garage.rack.top_shelf"),
            location("Bench", "garage.bench"),
            location("Attic", "attic"),
        ];
        locations.sort_by(|a, b| a.path.cmp(&b.path));

        let mut counts = HashMap::new();
        counts.insert(locations[3].id, 2);

        let forest = build_forest(&locations, &counts);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Attic");

        let garage = &forest[1];
        let names: Vec<_> = garage.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Bench", "Rack"]);
        assert_eq!(garage.children[1].children[0].name, "Top Shelf");
        assert_eq!(LocationTree::new(forest).total_locations, 5);
    }

    #[test]
    fn test_box_counts_attach_to_nodes() {
        let locations = vec![location("Garage", "garage"), location("Rack", "garage.rack")];
        let mut counts = HashMap::new();
        counts.insert(locations[1].id, 3);

        let forest = build_forest(&locations, &counts);
        assert_eq!(forest[0].box_count, 0);
        assert_eq!(forest[0].children[0].box_count, 3);
    }

    #[test]
    fn test_orphan_hangs_off_nearest_present_ancestor() {
        // `garage.rack` is missing, e.g. soft-deleted.
        let locations = vec![
            location("Garage", "garage"),
            location("Bin", "garage.rack.bin"),
        ];
        let forest = build_forest(&locations, &HashMap::new());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].name, "Bin");
    }

    #[test]
    fn test_similar_prefix_is_not_a_child() {
        let locations = vec![location("Box", "box"), location("Boxes", "boxes")];
        let forest = build_forest(&locations, &HashMap::new());
        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|n| n.children.is_empty()));
    }
}
