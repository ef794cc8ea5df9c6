use std::time::Duration;

use axum::extract::FromRef;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::Config;

const MAX_CONNECT_RETRIES: u32 = 5;

/// Process-wide resources shared by every request.
/// The pool is created once at startup; handlers check out connections per query.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl AppState {
    /// Connects to the database, applies pending migrations and bundles
    /// the result with the configuration.
    pub async fn init(config: Config) -> Result<Self, sqlx::Error> {
        let pool = connect_pool(&config.database_url).await?;

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self { pool, config })
    }
}

/// Opens the connection pool, retrying while the database starts up.
pub async fn connect_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_CONNECT_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    "Database not ready ({}), retrying in 2s... (Attempt {})",
                    e,
                    attempt
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
