//! Wiring of repositories and services over one connection pool.

use std::sync::Arc;

use stashbox_core::config::AppConfig;
use stashbox_core::traits::ShortIdGenerator;
use stashbox_database::DatabasePool;
use stashbox_database::repositories::{BoxRepository, LocationRepository, QrCodeRepository};

use crate::lifecycle::{BoxDeletion, LocationLifecycle};
use crate::location::{LocationService, TreeService};
use crate::qr::QrCodeService;
use crate::short_id::RandomShortIdGenerator;
use crate::storage_box::BoxService;

/// Every service of the engine, sharing one pool and one set of repositories.
#[derive(Debug, Clone)]
pub struct Services {
    /// Location CRUD.
    pub locations: Arc<LocationService>,
    /// Trees and breadcrumbs.
    pub trees: Arc<TreeService>,
    /// Box CRUD.
    pub boxes: Arc<BoxService>,
    /// QR code lifecycle.
    pub qr_codes: Arc<QrCodeService>,
    /// Location deletion.
    pub location_lifecycle: Arc<LocationLifecycle>,
    /// Box deletion.
    pub box_deletion: Arc<BoxDeletion>,
}

impl Services {
    /// Builds the services with random short identifier generators.
    pub fn new(db: DatabasePool, config: &AppConfig) -> Self {
        let qr_ids = Arc::new(RandomShortIdGenerator::for_qr_codes(&config.short_ids));
        let box_ids = Arc::new(RandomShortIdGenerator::for_boxes(&config.short_ids));
        Self::with_generators(db, config, qr_ids, box_ids)
    }

    /// Builds the services with caller-supplied short identifier generators.
    pub fn with_generators(
        db: DatabasePool,
        config: &AppConfig,
        qr_ids: Arc<dyn ShortIdGenerator>,
        box_ids: Arc<dyn ShortIdGenerator>,
    ) -> Self {
        let pool = db.pool().clone();
        let location_repo = Arc::new(LocationRepository::new(pool.clone()));
        let box_repo = Arc::new(BoxRepository::new(pool.clone()));
        let qr_repo = Arc::new(QrCodeRepository::new(pool));

        let trees = Arc::new(TreeService::new(Arc::clone(&location_repo)));
        let locations = Arc::new(LocationService::new(
            db.clone(),
            Arc::clone(&location_repo),
            Arc::clone(&box_repo),
            config.engine.clone(),
        ));
        let boxes = Arc::new(BoxService::new(
            db.clone(),
            Arc::clone(&box_repo),
            Arc::clone(&location_repo),
            Arc::clone(&qr_repo),
            box_ids,
            config.short_ids.clone(),
            config.engine.clone(),
        ));
        let qr_codes = Arc::new(QrCodeService::new(
            db.clone(),
            Arc::clone(&qr_repo),
            Arc::clone(&box_repo),
            Arc::clone(&location_repo),
            Arc::clone(&trees),
            qr_ids,
            config.short_ids.clone(),
            config.engine.clone(),
        ));
        let location_lifecycle = Arc::new(LocationLifecycle::new(
            db.clone(),
            Arc::clone(&location_repo),
            Arc::clone(&box_repo),
            config.engine.clone(),
        ));
        let box_deletion = Arc::new(BoxDeletion::new(db, box_repo, qr_repo, config.engine.clone()));

        Self {
            locations,
            trees,
            boxes,
            qr_codes,
            location_lifecycle,
            box_deletion,
        }
    }
}
