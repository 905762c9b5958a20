//! OAuth2 token endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;

use keyward_issuer::TokenRequest;
use keyward_store::ClientStore;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Exchange client credentials for a service token.
///
/// Accepts a JSON body, a form body, or HTTP Basic credentials with a form
/// `grant_type`.
///
/// ```text
/// POST /oauth/token
/// Content-Type: application/json
/// {"grant_type": "client_credentials", "client_id": "...", "client_secret": "..."}
///
/// Response: 200 OK
/// {"access_token": "...", "token_type": "Bearer", "expires_in": 3600}
/// ```
///
/// # Errors
///
/// Returns an OAuth2 error body: `invalid_request` or `unsupported_grant_type`
/// (400), `invalid_client` (401), or `server_error` (500).
pub async fn token<S>(
    State(state): State<Arc<GatewayState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    S: ClientStore + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let request = TokenRequest::parse(content_type, authorization, &body)?;
    let response = state.authenticator.exchange(&request)?;

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(response),
    ))
}
