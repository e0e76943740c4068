//! Server configuration: defaults, optional TOML file, validation.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::metrics::store::DEFAULT_SAMPLE_CAPACITY;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_ENV: &str = "TELEMETRY_CONFIG";

/// Floor for the SSE push period.
pub const MIN_STREAM_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address, e.g. `0.0.0.0:3000`.
    pub bind: String,
    /// Size of the latency window feeding the percentiles.
    pub sample_capacity: usize,
    /// Cap on distinct path keys; unbounded when absent.
    pub max_tracked_paths: Option<usize>,
    /// SSE push period for `/api/metrics/stream`.
    pub stream_interval_ms: u64,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            max_tracked_paths: None,
            stream_interval_ms: 500,
            log_filter: "info".into(),
        }
    }
}

impl Config {
    /// Read the file named by `TELEMETRY_CONFIG`, or fall back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.bind.parse::<SocketAddr>().is_err() {
            problems.push(format!("bind '{}' is not a socket address", self.bind));
        }
        if self.sample_capacity == 0 {
            problems.push("sample_capacity must be at least 1".to_string());
        }
        if self.stream_interval_ms < MIN_STREAM_INTERVAL_MS {
            problems.push(format!(
                "stream_interval_ms must be at least {MIN_STREAM_INTERVAL_MS}"
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join(", ")))
        }
    }

    /// SSE push period, never below `MIN_STREAM_INTERVAL_MS` even when the
    /// config was built by hand and never validated.
    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms.max(MIN_STREAM_INTERVAL_MS))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Validation(format!("bind '{}' is not a socket address", self.bind)))
    }
}
