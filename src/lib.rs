//! Request telemetry for an axum server: an interceptor that counts every
//! request/response pair, and a store that aggregates counts, latency
//! percentiles and error rates into on-demand snapshots.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;

use config::Config;
use metrics::process::StartTime;
use metrics::MetricsStore;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
///
/// Each server instance owns its own store, so several can coexist in
/// one process without sharing counters.
pub struct AppState {
    /// Aggregates written by the interceptor, read by the metrics routes.
    pub metrics: Arc<MetricsStore>,

    /// Anchor for the uptime figure in the metrics report.
    pub started: StartTime,

    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let metrics = MetricsStore::with_limits(config.sample_capacity, config.max_tracked_paths);
        Arc::new(Self {
            metrics: Arc::new(metrics),
            started: StartTime::now(),
            config,
        })
    }
}
