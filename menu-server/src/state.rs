//! Application state

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::db::PgSiblingStore;
use crate::ordering::ReorderEngine;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Engine = ReorderEngine<PgSiblingStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Sole writer of `sort_order`
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Connect, apply migrations and build the engine
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let engine = ReorderEngine::new(PgSiblingStore::new(pool.clone()));
        Self {
            pool,
            engine: Arc::new(engine),
        }
    }
}
