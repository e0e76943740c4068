use tracing_subscriber::{fmt, EnvFilter};

use request_telemetry::{config::Config, server, AppState};

#[tokio::main]
async fn main() {
    // ── 1. Load config ───────────────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(1);
        }
    };

    // ── 2. Logging (RUST_LOG wins over the config filter) ────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt().with_env_filter(filter).init();

    let addr = match config.bind_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "invalid bind address");
            std::process::exit(1);
        }
    };

    // ── 3. Build shared state & router ───────────────────────────
    tracing::info!(
        sample_capacity = config.sample_capacity,
        max_tracked_paths = ?config.max_tracked_paths,
        "metrics store ready"
    );
    let state = AppState::new(config);
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "request-telemetry listening");
    tracing::info!("metrics JSON → http://{addr}/api/metrics");
    tracing::info!("metrics SSE  → http://{addr}/api/metrics/stream");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
