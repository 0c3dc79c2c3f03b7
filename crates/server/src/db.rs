use axum::extract::FromRef;
use shared_types::FeatureFlags;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::{ConfigError, ServerConfig, StoreBackend};
use crate::repo::{
    MemoryTodoStore, MemoryUserStore, PgTodoStore, PgUserStore, TodoStore, UserStore,
};
use crate::service::TodoService;

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers and middleware extract only the part they need.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub todos: TodoService,
    pub users: Arc<dyn UserStore>,
    pub keys: Arc<JwtKeys>,
    pub flags: FeatureFlags,
}

impl AppState {
    pub fn new(
        todos: Arc<dyn TodoStore>,
        users: Arc<dyn UserStore>,
        keys: JwtKeys,
        flags: FeatureFlags,
    ) -> Self {
        Self {
            todos: TodoService::new(todos),
            users,
            keys: Arc::new(keys),
            flags,
        }
    }

    /// State over empty in-process stores.
    pub fn in_memory(keys: JwtKeys, flags: FeatureFlags) -> Self {
        Self::new(
            Arc::new(MemoryTodoStore::new()),
            Arc::new(MemoryUserStore::new()),
            keys,
            flags,
        )
    }

    pub fn postgres(pool: Pool<Postgres>, keys: JwtKeys, flags: FeatureFlags) -> Self {
        Self::new(
            Arc::new(PgTodoStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool)),
            keys,
            flags,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry: {0}")]
    Telemetry(String),
}

/// Create a database connection pool.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool(database_url: &str, max_connections: u32) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(database_url)
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Build the state for the configured backend, migrating Postgres first.
pub async fn connect_state(
    config: &ServerConfig,
    flags: FeatureFlags,
) -> Result<AppState, StartupError> {
    let keys = JwtKeys::from_config(config);
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(AppState::in_memory(keys, flags))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let pool = create_pool(url, config.max_connections)?;
            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");
            Ok(AppState::postgres(pool, keys, flags))
        }
    }
}
