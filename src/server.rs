use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::error;
use crate::handlers;
use crate::metrics::stream;
use crate::metrics::MetricsStore;
use crate::middleware::timing::{self, TelemetryInterceptor};
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let metrics = state.metrics.clone();

    let routes = Router::new()
        // ── Probe endpoints ─────────────────────────────────────
        .route("/api/health", get(handlers::probe::health))
        .route("/api/echo/:status", get(handlers::probe::echo_status))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .route("/api/metrics/reset", post(stream::reset_metrics))
        .fallback(handlers::probe::not_found)
        // ── Provide shared state to all routes above ────────────
        .with_state(state);

    instrument(routes, metrics)
}

/// Wraps any router in the telemetry interceptor.
///
/// Layers apply bottom-up: a handler panic is turned into a 500 by
/// `CatchPanicLayer` first, so the interceptor still sees and records a
/// finished response.
pub fn instrument(routes: Router, metrics: Arc<MetricsStore>) -> Router {
    let interceptor = Arc::new(TelemetryInterceptor::new(metrics));

    routes
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(axum_mw::from_fn_with_state(
            interceptor,
            timing::observe::<TelemetryInterceptor>,
        ))
        .layer(CorsLayer::permissive())
}
