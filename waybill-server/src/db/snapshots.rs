//! Ranking snapshot table repository

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use waybill_core::{RankingSnapshot, SnapshotRepository};

use super::storage_error;

/// Snapshots stored whole as JSONB, keyed by id.
#[derive(Debug, Clone)]
pub struct PostgresSnapshotRepository {
    pool: PgPool,
}

impl PostgresSnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for PostgresSnapshotRepository {
    async fn store(&self, snapshot: RankingSnapshot) -> waybill_core::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ranking_snapshots (id, period, body, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.period)
        .bind(Json(&snapshot))
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn list(&self) -> waybill_core::Result<Vec<RankingSnapshot>> {
        let rows: Vec<(Json<RankingSnapshot>,)> = sqlx::query_as(
            "SELECT body FROM ranking_snapshots ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(|(Json(s),)| s).collect())
    }

    async fn get(&self, id: &str) -> waybill_core::Result<Option<RankingSnapshot>> {
        let row: Option<(Json<RankingSnapshot>,)> =
            sqlx::query_as("SELECT body FROM ranking_snapshots WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(row.map(|(Json(s),)| s))
    }

    async fn delete(&self, id: &str) -> waybill_core::Result<bool> {
        let result = sqlx::query("DELETE FROM ranking_snapshots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }
}
