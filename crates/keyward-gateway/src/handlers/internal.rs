//! Internal key-rotation endpoints.
//!
//! These endpoints are for operators and deployment tooling. They carry no
//! bearer authentication and are mounted only on the internal router, which
//! the gateway binds to `INTERNAL_LISTEN_ADDR` (loopback by default).
//!
//! # Security
//!
//! Binding the internal listener to a non-loopback address exposes key
//! rotation to anyone who can reach it. Restrict it with network policy.
//!
//! # Rotation
//!
//! 1. Stage `<kid>_private.pem` and `<kid>_public.pem` in the key directory.
//! 2. `POST /internal/keys/reload` to load them.
//! 3. `POST /internal/keys/active {"kid": "<kid>"}` to start signing with it.
//! 4. Once no unexpired token can carry the old kid,
//!    `POST /internal/keys/retire {"kid": "<old>"}`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use keyward_core::KeyId;
use keyward_store::ClientStore;

use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request body naming one key.
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    /// The kid to act on.
    pub kid: String,
}

/// Key ring state.
#[derive(Debug, Serialize)]
pub struct KeysResponse {
    /// The kid used for new tokens.
    pub active_key_id: String,
    /// All published kids.
    pub key_ids: Vec<String>,
}

/// Result of a directory reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Kids added by this reload.
    pub added: Vec<String>,
    /// Key ring state after the reload.
    #[serde(flatten)]
    pub keys: KeysResponse,
}

fn keys_response<S: ClientStore>(state: &GatewayState<S>) -> KeysResponse {
    let ring = state.key_ring();
    KeysResponse {
        active_key_id: ring.active_key_id().to_string(),
        key_ids: ring.key_ids().into_iter().map(String::from).collect(),
    }
}

fn parse_kid(kid: String) -> Result<KeyId, ApiError> {
    KeyId::new(kid).map_err(|e| ApiError::InvalidRequest(format!("invalid kid: {e}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /internal/keys`
pub async fn list_keys<S>(State(state): State<Arc<GatewayState<S>>>) -> Json<KeysResponse>
where
    S: ClientStore + 'static,
{
    Json(keys_response(&state))
}

/// `POST /internal/keys/active`
///
/// # Errors
///
/// Returns 404 if the kid is not loaded.
pub async fn set_active_key<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Json(body): Json<KeyRequest>,
) -> Result<Json<KeysResponse>, ApiError>
where
    S: ClientStore + 'static,
{
    let kid = parse_kid(body.kid)?;
    state.key_ring().set_active_key(&kid)?;
    Ok(Json(keys_response(&state)))
}

/// `POST /internal/keys/reload`
///
/// # Errors
///
/// Returns 500 if the ring has no key directory or it cannot be read.
pub async fn reload_keys<S>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<Json<ReloadResponse>, ApiError>
where
    S: ClientStore + 'static,
{
    let added = state.key_ring().reload_directory()?;
    Ok(Json(ReloadResponse {
        added: added.into_iter().map(String::from).collect(),
        keys: keys_response(&state),
    }))
}

/// `POST /internal/keys/retire`
///
/// # Errors
///
/// Returns 409 for the active key and 404 for an unknown kid.
pub async fn retire_key<S>(
    State(state): State<Arc<GatewayState<S>>>,
    Json(body): Json<KeyRequest>,
) -> Result<Json<KeysResponse>, ApiError>
where
    S: ClientStore + 'static,
{
    let kid = parse_kid(body.kid)?;
    state.key_ring().retire_key(&kid)?;
    Ok(Json(keys_response(&state)))
}
