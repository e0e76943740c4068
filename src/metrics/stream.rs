use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::process::ProcessStats;
use super::store::MetricsSnapshot;
use crate::AppState;

/// Snapshot plus the host's process figures, as served to operators.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    #[serde(flatten)]
    pub process: ProcessStats,
}

impl MetricsReport {
    pub fn collect(state: &AppState) -> Self {
        Self {
            metrics: state.metrics.snapshot(),
            process: ProcessStats::capture(&state.started),
        }
    }
}

// ─── GET /api/metrics ────────────────────────────────────────────

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsReport> {
    Json(MetricsReport::collect(&state))
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint pushing a `MetricsReport` every
/// `stream_interval_ms` (never below 50 ms).

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.config.stream_interval());

    let stream = IntervalStream::new(interval).map(move |_| {
        let report = MetricsReport::collect(&state);
        let json = match serde_json::to_string(&report) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize metrics report");
                String::new()
            }
        };
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// ─── POST /api/metrics/reset ─────────────────────────────────────
/// Administrative wipe, meant for test harnesses.

pub async fn reset_metrics(State(state): State<Arc<AppState>>) -> StatusCode {
    state.metrics.reset();
    tracing::info!("metrics reset");
    StatusCode::NO_CONTENT
}
