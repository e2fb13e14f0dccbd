//! Deletion coordinators and box updates against a live database.

mod helpers;

use uuid::Uuid;

use stashbox_core::error::ErrorKind;
use stashbox_entity::qr::QrStatus;
use stashbox_service::{CreateBoxRequest, FieldUpdate, UpdateBoxRequest};

use helpers::{TestApp, assert_kind};

#[tokio::test]
async fn test_location_delete_detaches_boxes() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let rack = app.location("Rack", Some(&garage)).await;
    let cables = app.storage_box("Cables", Some(&garage)).await;
    let paint = app.storage_box("Paint", Some(&garage)).await;
    let nails = app.storage_box("Nails", Some(&rack)).await;

    let code_id = app.qr_code().await;
    app.services
        .qr_codes
        .assign(&app.ctx, code_id, cables.id)
        .await
        .unwrap();

    let detached = app
        .services
        .location_lifecycle
        .delete(&app.ctx, garage.id)
        .await
        .unwrap();
    assert_eq!(detached, 2);

    let boxes = &app.services.boxes;
    assert!(boxes.get_box(&app.ctx, cables.id).await.unwrap().location_id.is_none());
    assert!(boxes.get_box(&app.ctx, paint.id).await.unwrap().location_id.is_none());
    assert_eq!(
        boxes.get_box(&app.ctx, nails.id).await.unwrap().location_id,
        Some(rack.id)
    );

    // QR links survive a location delete.
    let code = app.services.qr_codes.get(&app.ctx, code_id).await.unwrap();
    assert_eq!(code.status, QrStatus::Assigned);
    assert_eq!(code.box_id, Some(cables.id));

    // Descendants stay live.
    let rack = app.services.locations.get_location(&app.ctx, rack.id).await.unwrap();
    assert_eq!(rack.path.as_str(), "garage.rack");

    assert_kind(
        app.services.locations.get_location(&app.ctx, garage.id).await,
        ErrorKind::NotFound,
    );
    assert_kind(
        app.services.location_lifecycle.delete(&app.ctx, garage.id).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_location_delete_in_other_workspace_is_not_found() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let other = app.other_workspace();
    assert_kind(
        app.services.location_lifecycle.delete(&other, garage.id).await,
        ErrorKind::NotFound,
    );
    assert!(app.services.locations.get_location(&app.ctx, garage.id).await.is_ok());
}

#[tokio::test]
async fn test_box_delete_releases_code() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let storage_box = app.storage_box("Cables", None).await;
    let code_id = app.qr_code().await;
    let qr = &app.services.qr_codes;
    qr.assign(&app.ctx, code_id, storage_box.id).await.unwrap();
    qr.mark_printed(&app.ctx, code_id).await.unwrap();

    let released = app
        .services
        .box_deletion
        .delete(&app.ctx, storage_box.id)
        .await
        .unwrap();
    assert_eq!(released, Some(code_id));

    let code = qr.get(&app.ctx, code_id).await.unwrap();
    assert_eq!(code.status, QrStatus::Generated);
    assert!(code.box_id.is_none());

    assert_kind(
        app.services.boxes.get_box(&app.ctx, storage_box.id).await,
        ErrorKind::NotFound,
    );
    assert_kind(
        app.services.box_deletion.delete(&app.ctx, storage_box.id).await,
        ErrorKind::NotFound,
    );

    // The released code can go onto another box.
    let next = app.storage_box("Paint", None).await;
    let reassigned = qr.assign(&app.ctx, code_id, next.id).await.unwrap();
    assert_eq!(reassigned.box_id, Some(next.id));
}

#[tokio::test]
async fn test_box_delete_without_code() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let storage_box = app.storage_box("Empty", None).await;
    let released = app
        .services
        .box_deletion
        .delete(&app.ctx, storage_box.id)
        .await
        .unwrap();
    assert!(released.is_none());
    assert_kind(
        app.services.box_deletion.delete(&app.ctx, Uuid::new_v4()).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_create_box_in_missing_location() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let result = app
        .services
        .boxes
        .create_box(
            &app.ctx,
            CreateBoxRequest {
                name: "Lost".to_string(),
                description: None,
                tags: Vec::new(),
                location_id: Some(Uuid::new_v4()),
                qr_code_id: None,
            },
        )
        .await;
    assert_kind(result, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_update_box_fields() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let garage = app.location("Garage", None).await;
    let attic = app.location("Attic", None).await;
    let storage_box = app.storage_box("Cables", Some(&garage)).await;
    let boxes = &app.services.boxes;

    let moved = boxes
        .update_box(
            &app.ctx,
            storage_box.id,
            UpdateBoxRequest {
                name: Some("Cables & Chargers".to_string()),
                description: FieldUpdate::Set("USB mostly".to_string()),
                tags: Some(vec!["usb".to_string(), "power".to_string()]),
                location: FieldUpdate::Set(attic.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.name, "Cables & Chargers");
    assert_eq!(moved.description.as_deref(), Some("USB mostly"));
    assert_eq!(moved.tags, ["power", "usb"]);
    assert_eq!(moved.location_id, Some(attic.id));
    assert_eq!(moved.short_id, storage_box.short_id);

    let cleared = boxes
        .update_box(
            &app.ctx,
            storage_box.id,
            UpdateBoxRequest {
                description: FieldUpdate::Clear,
                location: FieldUpdate::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.description.is_none());
    assert!(cleared.location_id.is_none());
    assert_eq!(cleared.name, "Cables & Chargers");

    assert_kind(
        boxes
            .update_box(
                &app.ctx,
                storage_box.id,
                UpdateBoxRequest {
                    location: FieldUpdate::Set(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_update_box_swaps_code() {
    let Some(app) = TestApp::try_new().await else {
        return;
    };

    let storage_box = app.storage_box("Cables", None).await;
    let old_code = app.qr_code().await;
    let new_code = app.qr_code().await;
    let qr = &app.services.qr_codes;
    let boxes = &app.services.boxes;
    qr.assign(&app.ctx, old_code, storage_box.id).await.unwrap();

    let updated = boxes
        .update_box(
            &app.ctx,
            storage_box.id,
            UpdateBoxRequest {
                qr_code: FieldUpdate::Set(new_code),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.qr_code_id, Some(new_code));
    assert_eq!(qr.get(&app.ctx, old_code).await.unwrap().status, QrStatus::Generated);
    assert_eq!(qr.get(&app.ctx, new_code).await.unwrap().status, QrStatus::Assigned);

    // Swapping to a code held elsewhere fails and keeps the current code.
    let other_box = app.storage_box("Paint", None).await;
    qr.assign(&app.ctx, old_code, other_box.id).await.unwrap();
    assert_kind(
        boxes
            .update_box(
                &app.ctx,
                storage_box.id,
                UpdateBoxRequest {
                    qr_code: FieldUpdate::Set(old_code),
                    ..Default::default()
                },
            )
            .await,
        ErrorKind::AlreadyAssigned,
    );
    let current = boxes.get_box(&app.ctx, storage_box.id).await.unwrap();
    assert_eq!(current.qr_code_id, Some(new_code));

    let cleared = boxes
        .update_box(
            &app.ctx,
            storage_box.id,
            UpdateBoxRequest {
                qr_code: FieldUpdate::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.qr_code_id.is_none());
    assert_eq!(qr.get(&app.ctx, new_code).await.unwrap().status, QrStatus::Generated);
}
