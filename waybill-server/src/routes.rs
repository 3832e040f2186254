//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::get,
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{ADMIN_TOKEN_HEADER, PROFILE_HEADER};
use crate::config::Config;
use crate::handlers::{
    create_snapshot_handler, delete_snapshot_handler, get_snapshot_handler, health,
    list_snapshots_handler, list_trips_handler, ranking_handler, ready, submit_trip_handler,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(&Config::default(), state)
}

/// Create the application router with custom configuration
pub fn create_router_with_config(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(PROFILE_HEADER),
                    HeaderName::from_static(ADMIN_TOKEN_HEADER),
                ])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let router = Router::new()
        .route("/trips", get(list_trips_handler).post(submit_trip_handler))
        .route("/ranking", get(ranking_handler))
        .route(
            "/ranking/snapshots",
            get(list_snapshots_handler).post(create_snapshot_handler),
        )
        .route(
            "/ranking/snapshots/{id}",
            get(get_snapshot_handler).delete(delete_snapshot_handler),
        )
        .route("/health", get(health))
        .route("/ready", get(ready))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(timeout);

    // Conditionally apply rate limiting (disabled in tests, enabled in production)
    let governor_conf = if config.rate_limit_enabled {
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_sec)
            .burst_size(config.rate_limit_burst)
            .finish()
    } else {
        None
    };

    let router = match governor_conf {
        Some(governor_conf) => {
            tracing::info!(
                "Rate limiting: {} req/s (burst: {})",
                config.rate_limit_per_sec,
                config.rate_limit_burst
            );
            router.layer(GovernorLayer::new(Arc::new(governor_conf)))
        }
        None if config.rate_limit_enabled => {
            tracing::error!(
                per_sec = config.rate_limit_per_sec,
                burst = config.rate_limit_burst,
                "Invalid rate limiter settings, rate limiting disabled"
            );
            router
        }
        None => {
            tracing::warn!("Rate limiting: DISABLED");
            router
        }
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
