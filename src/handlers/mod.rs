//! Lightweight routes that exist to exercise the telemetry pipeline.

pub mod probe;
