pub mod percentiles;
pub mod process;
pub mod store;
pub mod stream;
pub mod window;

use serde::Serialize;

pub use percentiles::PercentileSet;
pub use process::ProcessStats;
pub use store::{MetricsSnapshot, MetricsStore};

/// Bucket an error response falls into under `errors.byType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// 400–499
    Client,
    /// 500 and up
    Server,
}

impl ErrorClass {
    /// `None` for anything below 400, including out-of-range codes.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            500..=u16::MAX => Some(Self::Server),
            400..=499 => Some(Self::Client),
            _ => None,
        }
    }
}
