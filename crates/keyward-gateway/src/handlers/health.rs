//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use keyward_store::ClientStore;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// The kid used for new tokens.
    pub active_key_id: String,
}

/// Health check handler.
///
/// Returns the current service status. This endpoint is public and
/// does not require authentication.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "active_key_id": "superapp-key-1"
/// }
/// ```
pub async fn health<S>(State(state): State<Arc<GatewayState<S>>>) -> impl IntoResponse
where
    S: ClientStore + 'static,
{
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        active_key_id: state.key_ring().active_key_id().to_string(),
    };

    (StatusCode::OK, Json(response))
}
