//! Bearer authentication extractors.
//!
//! `AuthUser` validates end-user tokens from the identity provider;
//! `ServiceClient` validates service tokens minted by this gateway (or its
//! peer issuer).

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use keyward_auth::{ServiceIdentity, UserIdentity};
use keyward_store::ClientStore;

use crate::error::ApiError;
use crate::state::GatewayState;

/// An authenticated end user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserIdentity);

/// An authenticated calling service.
#[derive(Debug, Clone)]
pub struct ServiceClient(pub ServiceIdentity);

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The header must have exactly two space-separated parts; the scheme is
/// matched case-insensitively.
///
/// # Errors
///
/// Returns `ApiError::InvalidToken` if the header is absent or malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidToken)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(ApiError::InvalidToken),
    }
}

#[async_trait]
impl<S> FromRequestParts<Arc<GatewayState<S>>> for AuthUser
where
    S: ClientStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.user_validator.validate_user(token).await?;
        Ok(Self(identity))
    }
}

#[async_trait]
impl<S> FromRequestParts<Arc<GatewayState<S>>> for ServiceClient
where
    S: ClientStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let identity = state.service_validator.validate_service(token).await?;
        Ok(Self(identity))
    }
}
