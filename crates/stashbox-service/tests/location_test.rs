//! Location hierarchy tests against a live database.

mod helpers;

use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;

use stashbox_core::error::ErrorKind;
use stashbox_core::path::normalize;
use stashbox_entity::location::LocationNode;
use stashbox_service::{CreateLocationRequest, RenameLocationRequest};

use helpers::{TestApp, assert_kind};

#[tokio::test]
async fn test_create_nested_locations() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let rack = app.location("Metal Rack #2", Some(&garage)).await;

    assert_eq!(garage.path.as_str(), "garage");
    assert_eq!(garage.depth, 1);
    assert_eq!(rack.path.as_str(), "garage.metal_rack_2");
    assert_eq!(rack.depth, 2);
    assert_eq!(rack.name, "Metal Rack #2");
}

#[tokio::test]
async fn test_depth_is_capped_at_five() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let mut parent = app.location("L1", None).await;
    for name in ["L2", "L3", "L4", "L5"] {
        parent = app.location(name, Some(&parent)).await;
    }
    assert_eq!(parent.depth, 5);
    assert_eq!(parent.path.as_str(), "l1.l2.l3.l4.l5");

    let result = app
        .services
        .locations
        .create_location(
            &app.ctx,
            CreateLocationRequest {
                name: "L6".to_string(),
                description: None,
                parent_id: Some(parent.id),
            },
        )
        .await;
    assert_kind(result, ErrorKind::MaxDepthExceeded);

    // Nothing was written under the fifth level.
    let children = app
        .services
        .locations
        .list_children(&app.ctx, Some(parent.id))
        .await
        .unwrap();
    assert!(children.is_empty());
}

#[tokio::test]
async fn test_sibling_names_collide_after_normalization() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    app.location("Top Shelf", Some(&garage)).await;

    let result = app
        .services
        .locations
        .create_location(
            &app.ctx,
            CreateLocationRequest {
                name: "top-shelf!".to_string(),
                description: None,
                parent_id: Some(garage.id),
            },
        )
        .await;
    assert_kind(result, ErrorKind::SiblingConflict);

    // The same name under a different parent is fine.
    let attic = app.location("Attic", None).await;
    let shelf = app.location("Top Shelf", Some(&attic)).await;
    assert_eq!(shelf.path.as_str(), "attic.top_shelf");
}

#[tokio::test]
async fn test_workspaces_do_not_share_paths() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;

    let other = app.other_workspace();
    let theirs = app
        .services
        .locations
        .create_location(
            &other,
            CreateLocationRequest {
                name: "Garage".to_string(),
                description: None,
                parent_id: None,
            },
        )
        .await
        .expect("same path in another workspace");
    assert_eq!(theirs.path, garage.path);

    // Foreign rows behave as missing.
    assert_kind(
        app.services.locations.get_location(&other, garage.id).await,
        ErrorKind::NotFound,
    );
    let result = app
        .services
        .locations
        .create_location(
            &other,
            CreateLocationRequest {
                name: "Rack".to_string(),
                description: None,
                parent_id: Some(garage.id),
            },
        )
        .await;
    assert_kind(result, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_cascades_to_descendants() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let root = app.location("Root", None).await;
    let garage = app.location("Garage", Some(&root)).await;
    let rack = app.location("Rack", Some(&garage)).await;
    let bin = app.location("Bin", Some(&rack)).await;
    let bench = app.location("Bench", Some(&garage)).await;

    let renamed = app
        .services
        .locations
        .rename_location(
            &app.ctx,
            garage.id,
            RenameLocationRequest {
                name: Some("Storage".to_string()),
                description: None,
            },
        )
        .await
        .expect("rename");
    assert_eq!(renamed.path.as_str(), "root.storage");
    assert_eq!(renamed.name, "Storage");

    let locations = &app.services.locations;
    let rack = locations.get_location(&app.ctx, rack.id).await.unwrap();
    let bin = locations.get_location(&app.ctx, bin.id).await.unwrap();
    let bench = locations.get_location(&app.ctx, bench.id).await.unwrap();
    assert_eq!(rack.path.as_str(), "root.storage.rack");
    assert_eq!(bin.path.as_str(), "root.storage.rack.bin");
    assert_eq!(bench.path.as_str(), "root.storage.bench");

    // Nothing is left under the old prefix.
    let children = locations.list_children(&app.ctx, Some(root.id)).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].path.as_str(), "root.storage");
}

#[tokio::test]
async fn test_rename_into_existing_sibling_conflicts() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let rack = app.location("Rack", Some(&garage)).await;
    app.location("Shelf", Some(&garage)).await;
    let bin = app.location("Bin", Some(&rack)).await;

    let result = app
        .services
        .locations
        .rename_location(
            &app.ctx,
            rack.id,
            RenameLocationRequest {
                name: Some("SHELF".to_string()),
                description: None,
            },
        )
        .await;
    assert_kind(result, ErrorKind::SiblingConflict);

    // Rolled back: the subtree is untouched.
    let bin = app.services.locations.get_location(&app.ctx, bin.id).await.unwrap();
    assert_eq!(bin.path.as_str(), "garage.rack.bin");
}

#[tokio::test]
async fn test_rename_validation_and_description_only() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let locations = &app.services.locations;

    assert_kind(
        locations
            .rename_location(&app.ctx, garage.id, RenameLocationRequest::default())
            .await,
        ErrorKind::Validation,
    );

    let updated = locations
        .rename_location(
            &app.ctx,
            garage.id,
            RenameLocationRequest {
                name: None,
                description: Some("Cold in winter".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.path, garage.path);
    assert_eq!(updated.description.as_deref(), Some("Cold in winter"));

    // Case-only change keeps the path.
    let recased = locations
        .rename_location(
            &app.ctx,
            garage.id,
            RenameLocationRequest {
                name: Some("GARAGE".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(recased.name, "GARAGE");
    assert_eq!(recased.path.as_str(), "garage");

    assert_kind(
        locations
            .rename_location(
                &app.ctx,
                uuid::Uuid::new_v4(),
                RenameLocationRequest {
                    name: Some("x".to_string()),
                    description: None,
                },
            )
            .await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_list_children_ordered_by_name() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    for name in ["Shelf", "Bench", "Rack"] {
        app.location(name, Some(&garage)).await;
    }
    app.location("Attic", None).await;

    let children = app
        .services
        .locations
        .list_children(&app.ctx, Some(garage.id))
        .await
        .unwrap();
    let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Bench", "Rack", "Shelf"]);

    let roots = app.services.locations.list_children(&app.ctx, None).await.unwrap();
    let names: Vec<_> = roots.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Attic", "Garage"]);
}

#[tokio::test]
async fn test_tree_and_breadcrumbs() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let rack = app.location("Rack", Some(&garage)).await;
    let shelf = app.location("Shelf", Some(&rack)).await;
    app.location("Attic", None).await;
    app.storage_box("Cables", Some(&rack)).await;
    app.storage_box("Paint", Some(&rack)).await;

    let tree = app.services.trees.get_tree(&app.ctx, None).await.unwrap();
    assert_eq!(tree.total_locations, 4);
    assert_eq!(tree.roots.len(), 2);
    let garage_node = &tree.roots[1];
    assert_eq!(garage_node.children[0].box_count, 2);

    let subtree = app.services.trees.get_tree(&app.ctx, Some(rack.id)).await.unwrap();
    assert_eq!(subtree.total_locations, 2);
    assert_eq!(subtree.roots[0].children[0].id, shelf.id);

    let crumbs = app
        .services
        .trees
        .get_breadcrumbs(&app.ctx, shelf.id)
        .await
        .unwrap();
    let names: Vec<_> = crumbs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Garage", "Rack", "Shelf"]);
}

#[tokio::test]
async fn test_deleted_location_frees_its_path() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    app.services
        .location_lifecycle
        .delete(&app.ctx, garage.id)
        .await
        .unwrap();

    // A deleted parent cannot take children.
    let result = app
        .services
        .locations
        .create_location(
            &app.ctx,
            CreateLocationRequest {
                name: "Rack".to_string(),
                description: None,
                parent_id: Some(garage.id),
            },
        )
        .await;
    assert_kind(result, ErrorKind::NotFound);

    let again = app.location("Garage", None).await;
    assert_ne!(again.id, garage.id);
    assert_eq!(again.path.as_str(), "garage");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_of_same_path_has_one_winner() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let locations = &app.services.locations;
    let results = join_all(["Top Shelf", "top-shelf"].map(|name| {
        locations.create_location(
            &app.ctx,
            CreateLocationRequest {
                name: name.to_string(),
                description: None,
                parent_id: Some(garage.id),
            },
        )
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one create must fail");
    assert_eq!(loser.kind, ErrorKind::SiblingConflict);

    let children = locations.list_children(&app.ctx, Some(garage.id)).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].path.as_str(), "garage.top_shelf");
}

/// Every descendant of `node` must sit under the node's own path.
fn assert_subtree_consistent(node: &LocationNode) {
    let prefix = format!("{}.", node.path);
    for child in &node.children {
        assert!(
            child.path.starts_with(&prefix),
            "{} is not under {}",
            child.path,
            node.path
        );
        assert_subtree_consistent(child);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_a_half_renamed_subtree() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let rack = app.location("Rack", Some(&garage)).await;
    let shelf = app.location("Shelf", Some(&rack)).await;
    app.location("Bin", Some(&shelf)).await;
    for name in ["Bench", "Pegboard", "Cabinet"] {
        app.location(name, Some(&garage)).await;
    }

    let done = &AtomicBool::new(false);
    let trees = &app.services.trees;
    let locations = &app.services.locations;
    let ctx = &app.ctx;
    let garage_id = garage.id;

    let reader = move || async move {
        let mut reads = 0u32;
        while !done.load(Ordering::Acquire) || reads == 0 {
            let tree = trees.get_tree(ctx, None).await.unwrap();
            assert_eq!(tree.total_locations, 7);
            let root = &tree.roots[0];
            assert!(root.path == "garage" || root.path == "storage", "{}", root.path);
            assert_eq!(normalize(&root.name), root.path);
            assert_subtree_consistent(root);

            let children = locations
                .list_children(ctx, Some(garage_id))
                .await
                .unwrap();
            let prefixes: Vec<_> = children
                .iter()
                .filter_map(|c| c.path.parent())
                .collect();
            assert!(prefixes.windows(2).all(|w| w[0] == w[1]), "{prefixes:?}");
            reads += 1;
        }
        reads
    };

    let writer = async {
        let renamed = locations
            .rename_location(
                ctx,
                garage_id,
                RenameLocationRequest {
                    name: Some("Storage".to_string()),
                    description: None,
                },
            )
            .await;
        done.store(true, Ordering::Release);
        renamed
    };

    let (reads, renamed) = tokio::join!(join_all((0..3).map(|_| reader())), writer);
    assert!(reads.iter().all(|&n| n > 0));
    assert_eq!(renamed.unwrap().path.as_str(), "storage");

    let tree = trees.get_tree(&app.ctx, None).await.unwrap();
    assert_eq!(tree.roots[0].path, "storage");
    assert_subtree_consistent(&tree.roots[0]);
}
