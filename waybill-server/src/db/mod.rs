//! PostgreSQL storage for trips and ranking snapshots
//!
//! Used when `DATABASE_URL` is set. Migrations under `migrations/` run on
//! connect.

pub mod snapshots;
pub mod trips;

pub use snapshots::PostgresSnapshotRepository;
pub use trips::PostgresTripRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use waybill_core::WaybillError;

/// Open a connection pool and apply pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, WaybillError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| WaybillError::storage(format!("database connection failed: {}", e)))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| WaybillError::storage(format!("database migration failed: {}", e)))?;

    tracing::info!(max_connections, "Database connected and migrations applied");

    Ok(pool)
}

pub(crate) fn storage_error(e: sqlx::Error) -> WaybillError {
    WaybillError::storage(e.to_string())
}
