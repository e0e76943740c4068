use std::collections::BTreeMap;
use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::window::LatencyWindow;
use super::ErrorClass;

// ─── Configuration ───────────────────────────────────────────────

/// How many recent latency observations feed p50/p95/p99.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 1000;

/// Key that absorbs new paths once `max_tracked_paths` is reached.
pub const OVERFLOW_PATH_KEY: &str = "__other__";

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe aggregate of request telemetry.
///
/// Every operation takes the same lock, so a reader never sees a path
/// counted without the matching total. Lock hold time is O(1) for the
/// record calls and O(N log N) in the window size for `snapshot`.
pub struct MetricsStore {
    inner: Mutex<Inner>,
}

/// `requests` section of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: u64,
    pub by_path: BTreeMap<String, u64>,
    /// serde_json writes the numeric keys as strings ("200", "404").
    pub by_status: BTreeMap<u16, u64>,
}

/// `errors` section of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStats {
    pub total: u64,
    /// Percentage of all started requests, 0 when nothing was recorded.
    pub rate: f64,
    pub by_type: BTreeMap<ErrorClass, u64>,
}

/// Immutable view materialized on demand by [`MetricsStore::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: RequestStats,
    pub latency: PercentileSet,
    pub errors: ErrorStats,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    total_requests: u64,
    by_path: HashMap<String, u64>,
    by_status: BTreeMap<u16, u64>,

    // All-time running totals for the mean
    latency_sum_ms: u64,
    latency_count: u64,

    // Bounded window for percentiles
    window: LatencyWindow,

    total_errors: u64,
    errors_by_class: BTreeMap<ErrorClass, u64>,

    max_tracked_paths: Option<usize>,
}

// ─── MetricsStore impl ───────────────────────────────────────────

impl MetricsStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SAMPLE_CAPACITY, None)
    }

    /// `sample_capacity` bounds the percentile window; `max_tracked_paths`
    /// caps distinct path keys (unbounded when `None`).
    pub fn with_limits(sample_capacity: usize, max_tracked_paths: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::new(sample_capacity, max_tracked_paths)),
        }
    }

    /// Count a request as it arrives, before the handler runs.
    pub fn record_request_start(&self, path: &str) {
        self.inner.lock().record_start(path);
    }

    /// Fold in the outcome of a finished request.
    pub fn record_request_end(&self, path: &str, status: u16, duration_ms: u64) {
        self.inner.lock().record_end(path, status, duration_ms);
    }

    /// Zero every counter and empty the window in one step.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let capacity = inner.window.capacity();
        let max_paths = inner.max_tracked_paths;
        *inner = Inner::new(capacity, max_paths);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn sample_capacity(&self) -> usize {
        self.inner.lock().window.capacity()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new(sample_capacity: usize, max_tracked_paths: Option<usize>) -> Self {
        Self {
            total_requests: 0,
            by_path: HashMap::new(),
            by_status: BTreeMap::new(),
            latency_sum_ms: 0,
            latency_count: 0,
            window: LatencyWindow::new(sample_capacity),
            total_errors: 0,
            errors_by_class: BTreeMap::new(),
            max_tracked_paths,
        }
    }

    fn record_start(&mut self, path: &str) {
        self.total_requests += 1;

        if let Some(count) = self.by_path.get_mut(path) {
            *count += 1;
            return;
        }

        let key = match self.max_tracked_paths {
            Some(max) if self.tracked_paths() >= max => OVERFLOW_PATH_KEY,
            _ => path,
        };
        *self.by_path.entry(key.to_owned()).or_insert(0) += 1;
    }

    /// Distinct real paths, not counting the overflow bucket.
    fn tracked_paths(&self) -> usize {
        self.by_path.len() - usize::from(self.by_path.contains_key(OVERFLOW_PATH_KEY))
    }

    fn record_end(&mut self, _path: &str, status: u16, duration_ms: u64) {
        self.window.push(duration_ms);
        self.latency_sum_ms = self.latency_sum_ms.saturating_add(duration_ms);
        self.latency_count += 1;

        *self.by_status.entry(status).or_insert(0) += 1;

        if let Some(class) = ErrorClass::from_status(status) {
            self.total_errors += 1;
            *self.errors_by_class.entry(class).or_insert(0) += 1;
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let rate = if self.total_requests > 0 {
            100.0 * self.total_errors as f64 / self.total_requests as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            requests: RequestStats {
                total: self.total_requests,
                by_path: self
                    .by_path
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
                by_status: self.by_status.clone(),
            },
            latency: PercentileSet::from_window(
                &self.window,
                self.latency_sum_ms,
                self.latency_count,
            ),
            errors: ErrorStats {
                total: self.total_errors,
                rate,
                by_type: self.errors_by_class.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(store: &MetricsStore, path: &str, status: u16, ms: u64) {
        store.record_request_start(path);
        store.record_request_end(path, status, ms);
    }

    #[test]
    fn totals_line_up_across_maps() {
        let store = MetricsStore::new();
        let paths = ["/a", "/b", "/a", "/c", "/a"];
        let statuses = [200, 201, 404, 200, 503];
        for (p, s) in paths.iter().zip(statuses) {
            record(&store, p, s, 7);
        }

        let snap = store.snapshot();
        assert_eq!(snap.requests.total, 5);
        assert_eq!(snap.requests.by_path.values().sum::<u64>(), 5);
        assert_eq!(snap.requests.by_status.values().sum::<u64>(), 5);
        assert_eq!(snap.requests.by_path["/a"], 3);
        assert_eq!(snap.requests.by_status[&200], 2);
    }

    #[test]
    fn recommend_scenario() {
        let store = MetricsStore::new();
        for i in 1..=100 {
            record(&store, "/api/recommend", 200, i * 10);
        }

        let snap = store.snapshot();
        assert_eq!(snap.requests.by_path["/api/recommend"], 100);
        assert_eq!(snap.latency.p95, 960);
        assert_eq!(snap.latency.avg, 505);
    }

    #[test]
    fn error_classes_split_on_500() {
        let store = MetricsStore::new();
        record(&store, "/missing", 404, 1);
        record(&store, "/boom", 500, 1);

        let snap = store.snapshot();
        assert_eq!(snap.errors.total, 2);
        assert_eq!(snap.errors.by_type[&ErrorClass::Client], 1);
        assert_eq!(snap.errors.by_type[&ErrorClass::Server], 1);
        assert_eq!(snap.errors.rate, 100.0);
    }

    #[test]
    fn odd_status_codes_are_counted_verbatim() {
        let store = MetricsStore::new();
        record(&store, "/x", 399, 1);
        record(&store, "/x", 999, 1);
        record(&store, "/x", 42, 1);

        let snap = store.snapshot();
        assert_eq!(snap.requests.by_status.len(), 3);
        assert_eq!(snap.errors.total, 1);
        assert_eq!(snap.errors.by_type[&ErrorClass::Server], 1);
    }

    #[test]
    fn empty_store_has_zero_rate() {
        let snap = MetricsStore::new().snapshot();
        assert_eq!(snap.requests.total, 0);
        assert_eq!(snap.errors.rate, 0.0);
        assert_eq!(snap.latency, PercentileSet::empty());
    }

    #[test]
    fn mean_is_all_time_but_percentiles_are_windowed() {
        let store = MetricsStore::with_limits(2, None);
        record(&store, "/", 200, 1000);
        record(&store, "/", 200, 10);
        record(&store, "/", 200, 10);

        let snap = store.snapshot();
        assert_eq!(snap.latency.avg, 340);
        assert_eq!(snap.latency.p99, 10);
        assert_eq!(snap.latency.samples, 2);
    }

    #[test]
    fn reset_clears_everything_but_keeps_limits() {
        let store = MetricsStore::with_limits(10, Some(3));
        record(&store, "/a", 500, 30);
        store.reset();

        let snap = store.snapshot();
        assert_eq!(snap.requests.total, 0);
        assert!(snap.requests.by_path.is_empty());
        assert!(snap.requests.by_status.is_empty());
        assert!(snap.errors.by_type.is_empty());
        assert_eq!(snap.errors.total, 0);
        assert_eq!(snap.latency, PercentileSet::empty());
        assert_eq!(store.sample_capacity(), 10);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let store = MetricsStore::new();
        record(&store, "/a", 200, 12);
        record(&store, "/b", 404, 30);
        assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn path_cap_folds_new_paths_into_overflow() {
        let store = MetricsStore::with_limits(10, Some(2));
        for p in ["/a", "/b", "/c", "/d", "/a"] {
            store.record_request_start(p);
        }

        let by_path = store.snapshot().requests.by_path;
        assert_eq!(by_path["/a"], 2);
        assert_eq!(by_path["/b"], 1);
        assert_eq!(by_path[OVERFLOW_PATH_KEY], 2);
        assert!(!by_path.contains_key("/c"));
        assert_eq!(by_path.values().sum::<u64>(), 5);
    }

    #[test]
    fn start_without_end_only_moves_the_total() {
        let store = MetricsStore::new();
        store.record_request_start("/dropped");

        let snap = store.snapshot();
        assert_eq!(snap.requests.total, 1);
        assert!(snap.requests.by_status.is_empty());
        assert_eq!(snap.latency.samples, 0);
    }

    #[test]
    fn concurrent_writers_keep_totals_consistent() {
        let store = Arc::new(MetricsStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let status = if i % 10 == 0 { 500 } else { 200 };
                        record(&store, &format!("/t{t}"), status, i);
                        let snap = store.snapshot();
                        assert_eq!(
                            snap.requests.by_path.values().sum::<u64>(),
                            snap.requests.total
                        );
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = store.snapshot();
        assert_eq!(snap.requests.total, 4000);
        assert_eq!(snap.requests.by_status.values().sum::<u64>(), 4000);
        assert_eq!(snap.errors.total, 400);
        assert_eq!(snap.latency.samples, 1000);
    }

    #[test]
    fn reset_never_exposes_a_torn_state() {
        let store = Arc::new(MetricsStore::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        let status = if i % 4 == 0 { 404 } else { 200 };
                        record(&store, &format!("/w{t}/{}", i % 7), status, i);
                    }
                })
            })
            .collect();

        let resetter = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store.reset();
                    let snap = store.snapshot();
                    assert_eq!(
                        snap.requests.by_path.values().sum::<u64>(),
                        snap.requests.total
                    );
                    let by_class: u64 = snap.errors.by_type.values().sum();
                    assert_eq!(by_class, snap.errors.total);
                    assert!(snap.latency.samples <= 1000);
                }
            })
        };

        for h in writers {
            h.join().unwrap();
        }
        resetter.join().unwrap();

        let snap = store.snapshot();
        assert_eq!(
            snap.requests.by_path.values().sum::<u64>(),
            snap.requests.total
        );
        assert!(snap.requests.total <= 4000);
    }

}
