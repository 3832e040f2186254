//! Waybill Server - REST API for trip submission and leaderboards
//!
//! Exposes waybill-core functionality via HTTP endpoints:
//! - POST /trips - Record a trip with two proof screenshots
//! - GET /trips - List trips visible to the caller
//! - GET /ranking - Compute a leaderboard
//! - /ranking/snapshots - Archived monthly leaderboards

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waybill_core::{
    JsonFileProfileRepository, JsonFileTripRepository, LocalSubmissionLock,
    MemoryProfileRepository, MemorySnapshotRepository, MemoryTripRepository, ProfileRepository,
    SnapshotRepository, SubmissionLock, TripRepository,
};
use waybill_server::{
    create_router_with_config, db, AppState, Config, PostgresSnapshotRepository,
    PostgresTripRepository,
};

type Stores = (
    Arc<dyn TripRepository>,
    Arc<dyn SubmissionLock>,
    Arc<dyn SnapshotRepository>,
    &'static str,
);

async fn open_stores(config: &Config) -> Result<Stores, Box<dyn Error>> {
    if let Some(url) = &config.database_url {
        let pool = db::connect(url, config.database_max_connections).await?;
        return Ok((
            Arc::new(PostgresTripRepository::new(pool.clone())),
            Arc::new(LocalSubmissionLock::new()),
            Arc::new(PostgresSnapshotRepository::new(pool)),
            "postgres",
        ));
    }

    if let Some(path) = &config.trips_file {
        tracing::info!(path = %path.display(), "Using JSON file trip store");
        let trips = JsonFileTripRepository::new(path.clone());
        let lock = trips.submission_lock();
        return Ok((
            Arc::new(trips),
            Arc::new(lock),
            Arc::new(MemorySnapshotRepository::new()),
            "file",
        ));
    }

    tracing::warn!("No DATABASE_URL or TRIPS_FILE set, trips are kept in memory only");
    Ok((
        Arc::new(MemoryTripRepository::new()),
        Arc::new(LocalSubmissionLock::new()),
        Arc::new(MemorySnapshotRepository::new()),
        "memory",
    ))
}

fn open_profiles(config: &Config) -> Arc<dyn ProfileRepository> {
    match &config.profiles_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading profiles from file");
            Arc::new(JsonFileProfileRepository::new(path.clone()))
        }
        None => {
            tracing::warn!("No PROFILES_FILE set, every request will be unidentified");
            Arc::new(MemoryProfileRepository::new(Vec::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waybill_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let (trips, lock, snapshots, backend) = open_stores(&config).await?;
    let profiles = open_profiles(&config);
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, administrator routes are disabled");
    }

    let state = AppState::new(&config, trips, lock, profiles, snapshots, backend);
    let app = create_router_with_config(&config, state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = backend, "Waybill server listening");
    tracing::info!("OpenAPI docs at http://{}/swagger-ui", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
