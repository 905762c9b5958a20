//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use keyward_store::ClientStore;

use crate::handlers::{health, identity, internal, jwks, oauth};
use crate::state::GatewayState;

/// Create the public gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /oauth/token` - Client-credentials grant
/// - `GET /.well-known/jwks.json` - Published signing keys
///
/// ## Authenticated
/// - `GET /v1/me` - End-user identity
/// - `GET /v1/service/me` - Calling service identity
///
/// Key rotation is served separately by [`create_internal_router`].
pub fn create_router<S>(state: GatewayState<S>) -> Router
where
    S: ClientStore + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        // Public
        .route("/health", get(health::health::<S>))
        .route("/oauth/token", post(oauth::token::<S>))
        .route("/.well-known/jwks.json", get(jwks::jwks::<S>))
        // Authenticated
        .route("/v1/me", get(identity::me))
        .route("/v1/service/me", get(identity::service_me))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Create the key-rotation router for the internal listener.
///
/// These routes carry no authentication and no CORS layer. Bind this router
/// to `internal_listen_addr` only.
///
/// # Routes
///
/// - `GET /internal/keys` - Key ring state
/// - `POST /internal/keys/active` - Switch the signing key
/// - `POST /internal/keys/reload` - Load new keys from the key directory
/// - `POST /internal/keys/retire` - Unpublish a key
pub fn create_internal_router<S>(state: GatewayState<S>) -> Router
where
    S: ClientStore + 'static,
{
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/internal/keys", get(internal::list_keys::<S>))
        .route("/internal/keys/active", post(internal::set_active_key::<S>))
        .route("/internal/keys/reload", post(internal::reload_keys::<S>))
        .route("/internal/keys/retire", post(internal::retire_key::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(Arc::new(state))
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600))
    }
}
