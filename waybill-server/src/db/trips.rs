//! Trip table repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use waybill_core::{
    Amount, Fingerprint, Platform, Segment, TripRecord, TripRepository, WaybillError,
};

use super::storage_error;

/// Key of the transaction-scoped advisory lock serializing appends across
/// server processes.
const TRIP_APPEND_LOCK_KEY: i64 = 0x5741_5942_494c_4c;

/// Trip row from database
#[derive(Debug, Clone, FromRow)]
struct TripRow {
    id: String,
    driver_id: String,
    driver_name: String,
    company_name: Option<String>,
    origin: String,
    destination: String,
    trip_date: NaiveDate,
    value_cents: i64,
    platform: String,
    segment: String,
    initial_fingerprint: String,
    final_fingerprint: String,
    initial_proof_ref: String,
    final_proof_ref: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for TripRecord {
    type Error = WaybillError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let value_cents = u64::try_from(row.value_cents).map_err(|_| {
            WaybillError::storage(format!("trip {} has a negative value", row.id))
        })?;

        Ok(Self {
            driver_id: row.driver_id,
            driver_name: row.driver_name,
            company_name: row.company_name,
            origin: row.origin,
            destination: row.destination,
            date: row.trip_date,
            value_cents: Amount::from_cents(value_cents),
            platform: row.platform.parse::<Platform>()?,
            segment: row.segment.parse::<Segment>()?,
            initial_fingerprint: Fingerprint::parse(&row.initial_fingerprint)?,
            final_fingerprint: Fingerprint::parse(&row.final_fingerprint)?,
            initial_proof_ref: row.initial_proof_ref,
            final_proof_ref: row.final_proof_ref,
            created_at: row.created_at,
            id: row.id,
        })
    }
}

/// Trip store backed by the `trips` and `trip_proofs` tables.
#[derive(Debug, Clone)]
pub struct PostgresTripRepository {
    pool: PgPool,
}

impl PostgresTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripRepository for PostgresTripRepository {
    async fn list_all(&self) -> waybill_core::Result<Vec<TripRecord>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, driver_id, driver_name, company_name, origin, destination,
                   trip_date, value_cents, platform, segment,
                   initial_fingerprint, final_fingerprint,
                   initial_proof_ref, final_proof_ref, created_at
            FROM trips
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(TripRecord::try_from).collect()
    }

    async fn append(&self, trip: TripRecord) -> waybill_core::Result<()> {
        let value_cents = i64::try_from(trip.value_cents.cents())
            .map_err(|_| WaybillError::validation("trip value is too large"))?;

        let mut fingerprints = vec![trip.initial_fingerprint.to_string()];
        if trip.final_fingerprint != trip.initial_fingerprint {
            fingerprints.push(trip.final_fingerprint.to_string());
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(TRIP_APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let existing_id: Option<(String,)> = sqlx::query_as("SELECT id FROM trips WHERE id = $1")
            .bind(&trip.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;
        if existing_id.is_some() {
            return Err(WaybillError::ConcurrencyConflict(format!(
                "trip id {} already stored",
                trip.id
            )));
        }

        let clash: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT fingerprint, trip_id
            FROM trip_proofs
            WHERE fingerprint = ANY($1)
            LIMIT 1
            "#,
        )
        .bind(&fingerprints)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;
        if let Some((fingerprint, trip_id)) = clash {
            return Err(WaybillError::DuplicateProof {
                fingerprint: fingerprint.trim().to_string(),
                trip_id,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO trips (
                id, driver_id, driver_name, company_name, origin, destination,
                trip_date, value_cents, platform, segment,
                initial_fingerprint, final_fingerprint,
                initial_proof_ref, final_proof_ref, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&trip.id)
        .bind(&trip.driver_id)
        .bind(&trip.driver_name)
        .bind(&trip.company_name)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.date)
        .bind(value_cents)
        .bind(trip.platform.code())
        .bind(trip.segment.code())
        .bind(trip.initial_fingerprint.as_str())
        .bind(trip.final_fingerprint.as_str())
        .bind(&trip.initial_proof_ref)
        .bind(&trip.final_proof_ref)
        .bind(trip.created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO trip_proofs (fingerprint, trip_id)
            SELECT fingerprint, $2 FROM UNNEST($1::TEXT[]) AS fingerprint
            "#,
        )
        .bind(&fingerprints)
        .bind(&trip.id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;

        tracing::debug!(trip_id = %trip.id, "Trip row inserted");
        Ok(())
    }
}
