//! Published key set.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use keyward_auth::JwkSet;
use keyward_store::ClientStore;

use crate::state::GatewayState;

/// Serve every published public key.
///
/// ```text
/// GET /.well-known/jwks.json
///
/// Response: 200 OK
/// {"keys": [{"kty": "RSA", "use": "sig", "kid": "...", "n": "...", "e": "AQAB", "alg": "RS256"}]}
/// ```
pub async fn jwks<S>(State(state): State<Arc<GatewayState<S>>>) -> impl IntoResponse
where
    S: ClientStore + 'static,
{
    let keys: JwkSet = state.issuer().jwks().as_ref().clone();
    ([(header::CACHE_CONTROL, "public, max-age=300")], Json(keys))
}
