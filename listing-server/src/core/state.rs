//! Server state - shared handles for every service
//!
//! [`ServerState`] is the composition root: it owns the database handle,
//! the TTL cache, the event publisher, and the lifecycle engine built on
//! top of them. Cloning is shallow (Arc-backed handles throughout).

use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::cache::CacheService;
use crate::core::config::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::events::EventPublisher;
use crate::services::{
    LocalObjectStorage, ObjectStorage, RandomCodeGenerator, RestaurantService, VerificationService,
};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database handle
    pub db: Surreal<Db>,
    /// TTL cache (verification code store)
    pub cache: CacheService,
    /// Domain event publisher
    pub publisher: EventPublisher,
    /// Restaurant lifecycle engine
    pub restaurants: RestaurantService,
    /// JWT validation service
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Initialize the full service stack:
    /// 1. work directory layout
    /// 2. embedded database
    /// 3. cache, publisher, object storage
    /// 4. lifecycle engine and JWT service
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("listing.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        let db = db_service.db;

        let cache = CacheService::new();
        let publisher = EventPublisher::new();

        let verification = VerificationService::new(
            cache.clone(),
            Arc::new(RandomCodeGenerator::default()),
            config.otp_ttl_secs,
        );
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(LocalObjectStorage::new(config.uploads_dir()));

        let restaurants =
            RestaurantService::new(db.clone(), verification, storage, publisher.clone());
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Ok(Self {
            config: config.clone(),
            db,
            cache,
            publisher,
            restaurants,
            jwt_service,
        })
    }

    /// Register the server's background tasks. Must run before serving.
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let cache = self.cache.clone();
        let shutdown = tasks.shutdown_token();
        let period = Duration::from_secs(self.config.cache_sweep_secs);

        tasks.spawn("cache_sweeper", TaskKind::Periodic, async move {
            cache.run_sweeper(period, shutdown).await;
        });
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
