//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use vitrine_core::Config;
use vitrine_db::{
    ActivityRepository, DashboardRepository, FavoriteRepository, ProductRepository, UserRepository,
};
use vitrine_storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub storage: Arc<dyn BlobStore>,
    pub products: ProductRepository,
    pub favorites: FavoriteRepository,
    pub activities: ActivityRepository,
    pub users: UserRepository,
    pub dashboard: DashboardRepository,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, storage: Arc<dyn BlobStore>) -> Self {
        Self {
            products: ProductRepository::new(pool.clone(), storage.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            activities: ActivityRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            dashboard: DashboardRepository::new(pool.clone()),
            config,
            pool,
            storage,
        }
    }
}
