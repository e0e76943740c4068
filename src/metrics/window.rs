use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent latency observations (ms).
///
/// Pushing past capacity drops the oldest sample. This is a plain ring
/// buffer, not a reservoir: it always holds the `capacity` newest values.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, duration_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(duration_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the window in ascending order, for percentile lookups.
    pub fn sorted(&self) -> Vec<u64> {
        let mut out: Vec<u64> = self.samples.iter().copied().collect();
        out.sort_unstable();
        out
    }

    #[cfg(test)]
    pub fn contains(&self, duration_ms: u64) -> bool {
        self.samples.contains(&duration_ms)
    }
}
