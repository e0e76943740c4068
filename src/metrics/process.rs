use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Host-level figures attached to the metrics report as-is.
/// The store never reads or derives anything from these.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    /// Seconds since the server started.
    pub uptime: f64,
    pub started_at: DateTime<Utc>,
    pub memory: Option<MemoryUsage>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

/// Wall-clock and monotonic anchors taken once at startup.
#[derive(Debug, Clone, Copy)]
pub struct StartTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl StartTime {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

impl ProcessStats {
    pub fn capture(started: &StartTime) -> Self {
        Self {
            uptime: started.instant.elapsed().as_secs_f64(),
            started_at: started.wall,
            memory: read_memory(),
        }
    }
}

#[cfg(target_os = "linux")]
fn read_memory() -> Option<MemoryUsage> {
    // statm: size resident shared text lib data dt, in pages
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    parse_statm(&statm, 4096)
}

#[cfg(not(target_os = "linux"))]
fn read_memory() -> Option<MemoryUsage> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_statm(statm: &str, page_size: u64) -> Option<MemoryUsage> {
    let mut fields = statm.split_whitespace();
    let size: u64 = fields.next()?.parse().ok()?;
    let resident: u64 = fields.next()?.parse().ok()?;
    Some(MemoryUsage {
        rss_bytes: resident * page_size,
        virtual_bytes: size * page_size,
    })
}
