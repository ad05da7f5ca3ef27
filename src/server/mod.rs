//! HTTP server
//!
//! Inbound surface for the dashboard: station telemetry, RCH parsing and
//! cache control, time-series store queries, and notifications. Every
//! response is `{ "data": ... }` on success or `{ "error": ... }` with a
//! non-200 status on failure.

mod handlers;

use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    // Allow-all CORS: the dashboard frontend is served from its own origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Station telemetry
        .route("/stations", get(handlers::list_stations))
        .route("/stations/:id/daily", get(handlers::station_daily))
        .route("/stations/:id/hourly", get(handlers::station_hourly))
        .route("/stations/:id/min10", get(handlers::station_min10))
        // RCH files
        .route("/rch", get(handlers::rch_sample).post(handlers::rch_upload))
        .route("/rch/cache", delete(handlers::rch_invalidate_all))
        .route("/rch/cache/:location", delete(handlers::rch_invalidate))
        // Time-series store
        .route("/measurements/:name", get(handlers::measurement_range))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until ctrl-c
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.bind_addr.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("hydrodash listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
