//! Health Routes
//!
//! - GET / (no upgrade) - Plain-text liveness, kept byte-compatible with
//!   existing probes
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Full status with broker and client details

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::state::AppState;

/// Body of the plain-text liveness response
pub const LIVENESS_BODY: &str = "Node server is on !\n";

/// Plain-text liveness response
///
/// Always 200, whatever the broker is doing.
pub fn liveness_text() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        LIVENESS_BODY,
    )
}

/// Fallback for any non-stream request
pub async fn plain_liveness() -> impl IntoResponse {
    liveness_text()
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub broker_connected: bool,
    pub clients: usize,
    pub messages_received: u64,
    pub readings_broadcast: u64,
    pub decode_failures: u64,
    pub last_reading_at: Option<chrono::DateTime<chrono::Utc>>,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health
///
/// A disconnected broker reports `degraded`; the bridge itself stays up and
/// keeps serving clients.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let upstream = state.upstream.snapshot();
    let status = if upstream.broker_connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        broker_connected: upstream.broker_connected,
        clients: state.hub.connection_count().await,
        messages_received: upstream.messages_received,
        readings_broadcast: upstream.readings_broadcast,
        decode_failures: upstream.decode_failures,
        last_reading_at: upstream.last_reading_at,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_health_reports_degraded_without_broker() {
        let state = Arc::new(AppState::default());
        let Json(health) = full_health(State(Arc::clone(&state))).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.broker_connected);
        assert_eq!(health.clients, 0);

        state.upstream.set_connected(true);
        let Json(health) = full_health(State(state)).await;
        assert_eq!(health.status, "healthy");
    }
}
