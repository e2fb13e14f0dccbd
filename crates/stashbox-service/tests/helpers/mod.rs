//! Shared helpers for the database-backed integration tests.
//!
//! Tests need a PostgreSQL instance reachable through `DATABASE_URL`. When
//! the variable is unset, [`TestApp::try_new`] prints a skip notice to
//! stderr, returns `None`, and the test returns early.

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use stashbox_core::config::{AppConfig, DatabaseConfig, EngineConfig, LoggingConfig, ShortIdConfig};
use stashbox_core::error::{AppError, ErrorKind};
use stashbox_core::traits::ShortIdGenerator;
use stashbox_database::DatabasePool;
use stashbox_database::migration::run_migrations;
use stashbox_entity::location::Location;
use stashbox_entity::storage_box::StorageBox;
use stashbox_service::{
    CreateBoxRequest, CreateLocationRequest, RandomShortIdGenerator, RequestContext, Services,
};

/// Test application context, isolated in a fresh workspace.
pub struct TestApp {
    /// All engine services.
    pub services: Services,
    /// Pool for direct queries.
    pub db: DatabasePool,
    /// Context scoped to this test's workspace.
    pub ctx: RequestContext,
    /// Configuration the services were built with.
    pub config: AppConfig,
}

impl TestApp {
    /// Connect, migrate, and open a fresh workspace.
    pub async fn try_new() -> Option<Self> {
        let config = test_config()?;
        let qr_ids = Arc::new(RandomShortIdGenerator::for_qr_codes(&config.short_ids));
        let box_ids = Arc::new(RandomShortIdGenerator::for_boxes(&config.short_ids));
        Some(Self::build(config, qr_ids, box_ids).await)
    }

    /// Like [`Self::try_new`], with custom short identifier generators.
    pub async fn with_generators(
        qr_ids: Arc<dyn ShortIdGenerator>,
        box_ids: Arc<dyn ShortIdGenerator>,
    ) -> Option<Self> {
        let config = test_config()?;
        Some(Self::build(config, qr_ids, box_ids).await)
    }

    async fn build(
        config: AppConfig,
        qr_ids: Arc<dyn ShortIdGenerator>,
        box_ids: Arc<dyn ShortIdGenerator>,
    ) -> Self {
        let db = DatabasePool::connect(&config.database)
            .await
            .expect("Failed to connect to test database");
        run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let services = Services::with_generators(db.clone(), &config, qr_ids, box_ids);
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4());

        Self {
            services,
            db,
            ctx,
            config,
        }
    }

    /// A context for a different, unrelated workspace.
    pub fn other_workspace(&self) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), self.ctx.user_id)
    }

    /// Create a location, failing the test on error.
    pub async fn location(&self, name: &str, parent: Option<&Location>) -> Location {
        self.services
            .locations
            .create_location(
                &self.ctx,
                CreateLocationRequest {
                    name: name.to_string(),
                    description: None,
                    parent_id: parent.map(|p| p.id),
                },
            )
            .await
            .expect("Failed to create location")
    }

    /// Create a box, failing the test on error.
    pub async fn storage_box(&self, name: &str, location: Option<&Location>) -> StorageBox {
        self.services
            .boxes
            .create_box(
                &self.ctx,
                CreateBoxRequest {
                    name: name.to_string(),
                    description: None,
                    tags: Vec::new(),
                    location_id: location.map(|l| l.id),
                    qr_code_id: None,
                },
            )
            .await
            .expect("Failed to create box")
    }

    /// Generate one QR code and return its ID.
    pub async fn qr_code(&self) -> Uuid {
        self.services
            .qr_codes
            .generate_batch(&self.ctx, 1)
            .await
            .expect("Failed to generate QR code")[0]
            .id
    }
}

/// Always proposes the same candidate.
#[derive(Debug)]
pub struct FixedShortIds(pub String);

impl ShortIdGenerator for FixedShortIds {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Assert that `result` failed with `kind`.
#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, AppError>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {kind}, got Ok({value:?})"),
        Err(err) => assert_eq!(err.kind, kind, "unexpected error: {err}"),
    }
}

fn test_config() -> Option<AppConfig> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping database test: DATABASE_URL is not set");
        return None;
    };
    Some(AppConfig {
        database: DatabaseConfig {
            url,
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 60,
        },
        logging: LoggingConfig::default(),
        short_ids: ShortIdConfig::default(),
        engine: EngineConfig::default(),
    })
}
