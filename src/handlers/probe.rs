use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

/// Longest artificial delay `/api/echo` will honour.
const MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct EchoParams {
    #[serde(default)]
    pub delay_ms: u64,
}

// ─── GET /api/health ─────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── GET /api/echo/:status ───────────────────────────────────────
/// Answers with whatever status was asked for, optionally after a delay.
/// Handy for driving the error and latency counters by hand.

pub async fn echo_status(
    Path(code): Path<u16>,
    Query(params): Query<EchoParams>,
) -> Result<Response, AppError> {
    let status = StatusCode::from_u16(code)
        .map_err(|_| AppError::BadRequest(format!("{code} is not an HTTP status code")))?;
    // hyper cannot send a 1xx as a final response and rewrites it to 500
    if status.is_informational() {
        return Err(AppError::BadRequest(format!(
            "{code} is informational and cannot be a final response"
        )));
    }

    if params.delay_ms > MAX_DELAY_MS {
        return Err(AppError::BadRequest(format!(
            "delay_ms must be at most {MAX_DELAY_MS}"
        )));
    }
    if params.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(params.delay_ms)).await;
    }

    let body = serde_json::json!({ "status": code });
    Ok((status, Json(body)).into_response())
}

// ─── Fallback ────────────────────────────────────────────────────

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
