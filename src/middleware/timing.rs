use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::MetricsStore;

/// Carries the measured handler time as `"<ms>ms"`.
pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time");

/// Hooks a per-request observer into the middleware chain.
///
/// `on_before_dispatch` runs before the handler and hands back a token;
/// `on_response_finalize` consumes that token once the response exists
/// and before it is written out. The token is taken by value, so the
/// finalize hook can fire at most once per request. If the request future
/// is dropped first (client gone, upstream cancel) the token is dropped
/// with it and nothing is recorded.
pub trait LifecycleObserver: Send + Sync + 'static {
    type InFlight: Send + 'static;

    fn on_before_dispatch(&self, req: &Request) -> Self::InFlight;

    /// Must not fail the response; faults are to be logged and swallowed.
    fn on_response_finalize(&self, in_flight: Self::InFlight, response: &mut Response);
}

/// Generic `from_fn_with_state` adapter for any [`LifecycleObserver`].
pub async fn observe<O: LifecycleObserver>(
    State(observer): State<Arc<O>>,
    req: Request,
    next: Next,
) -> Response {
    let in_flight = observer.on_before_dispatch(&req);
    let mut response = next.run(req).await;
    observer.on_response_finalize(in_flight, &mut response);
    response
}

/// Feeds every request/response pair into a [`MetricsStore`] and stamps
/// `X-Response-Time` on the way out.
pub struct TelemetryInterceptor {
    store: Arc<MetricsStore>,
}

/// What the interceptor remembers between arrival and finalize.
pub struct InFlight {
    method: Method,
    path: String,
    started: Instant,
}

impl TelemetryInterceptor {
    pub fn new(store: Arc<MetricsStore>) -> Self {
        Self { store }
    }
}

impl LifecycleObserver for TelemetryInterceptor {
    type InFlight = InFlight;

    fn on_before_dispatch(&self, req: &Request) -> InFlight {
        let path = req.uri().path().to_owned();
        self.store.record_request_start(&path);

        InFlight {
            method: req.method().clone(),
            path,
            started: Instant::now(),
        }
    }

    fn on_response_finalize(&self, in_flight: InFlight, response: &mut Response) {
        let InFlight {
            method,
            path,
            started,
        } = in_flight;

        let duration_ms = started.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        self.store.record_request_end(&path, status, duration_ms);

        // ── Inject response header ──────────────────────────────
        match HeaderValue::from_str(&format!("{duration_ms}ms")) {
            Ok(val) => {
                response.headers_mut().insert(RESPONSE_TIME_HEADER, val);
            }
            Err(e) => {
                tracing::warn!(error = %e, %path, "could not build X-Response-Time header");
            }
        }

        tracing::debug!(%method, %path, status, duration_ms, "request completed");
    }
}
