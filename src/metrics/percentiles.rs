use serde::Serialize;

use super::window::LatencyWindow;

/// Latency breakdown served under `latency` in the snapshot.
///
/// `avg` comes from the all-time running sum; the percentiles only see the
/// current sample window, so the two can disagree after a traffic shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentileSet {
    pub avg: u64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    /// Number of samples the percentiles were taken from.
    pub samples: usize,
}

impl PercentileSet {
    /// Sort the window once and read p50/p95/p99 from it.
    /// An empty window yields zeroes.
    pub fn from_window(window: &LatencyWindow, sum_ms: u64, count: u64) -> Self {
        let sorted = window.sorted();

        Self {
            avg: rounded_mean(sum_ms, count),
            p50: value_at(&sorted, 50),
            p95: value_at(&sorted, 95),
            p99: value_at(&sorted, 99),
            samples: sorted.len(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            avg: 0,
            p50: 0,
            p95: 0,
            p99: 0,
            samples: 0,
        }
    }

    #[cfg(test)]
    pub fn has_data(&self) -> bool {
        self.samples > 0
    }
}

/// Nearest-rank lookup at index `floor(pct / 100 * len)` over ascending data.
///
/// Integer arithmetic keeps `len * 95 / 100` exact where `0.95 * len`
/// would pick up float error.
fn value_at(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[idx]
}

fn rounded_mean(sum_ms: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (sum_ms as f64 / count as f64).round() as u64
}
