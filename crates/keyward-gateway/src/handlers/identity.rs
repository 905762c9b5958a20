//! Identity echo endpoints.
//!
//! These let callers confirm which identity a bearer token carries.

use axum::Json;
use serde::Serialize;

use crate::auth::{AuthUser, ServiceClient};

/// The caller's user identity.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Email address.
    pub email: String,
    /// Group memberships.
    pub groups: Vec<String>,
}

/// The caller's service identity.
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    /// Client ID.
    pub client_id: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

/// `GET /v1/me`
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        email: user.email,
        groups: user.groups,
    })
}

/// `GET /v1/service/me`
pub async fn service_me(ServiceClient(service): ServiceClient) -> Json<ServiceResponse> {
    Json(ServiceResponse {
        client_id: service.client_id.to_string(),
        scopes: service.scopes,
    })
}
