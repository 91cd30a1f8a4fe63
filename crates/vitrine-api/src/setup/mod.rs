//! Application initialization: database, state, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use vitrine_core::Config;
use vitrine_storage::PgBlobStore;

use crate::state::AppState;

/// Wire up the database, blob store, and router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = database::setup_database(&config).await?;

    let storage = Arc::new(PgBlobStore::new(pool.clone()));

    let state = Arc::new(AppState::new(config.clone(), pool, storage));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
