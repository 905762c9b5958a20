//! API error types and responses.
//!
//! Every error body has the OAuth2 shape `{error, error_description?}`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use keyward_auth::AuthError;
use keyward_issuer::IssuerError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed token request parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// Client authentication failed.
    #[error("invalid client")]
    InvalidClient,

    /// Grant type other than `client_credentials`.
    #[error("unsupported grant type")]
    UnsupportedGrantType,

    /// Missing, malformed, or rejected bearer token.
    #[error("invalid or missing bearer token")]
    InvalidToken,

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with the current state.
    #[error("{0}")]
    Conflict(String),

    /// The key set needed to verify tokens cannot be fetched.
    #[error("token verification temporarily unavailable")]
    Unavailable,

    /// Internal server error.
    #[error("internal error")]
    Internal,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_description: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnsupportedGrantType => StatusCode::BAD_REQUEST,
            Self::InvalidClient | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidToken => "invalid_token",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unavailable => "temporarily_unavailable",
            Self::Internal => "server_error",
        }
    }

    fn description(&self) -> Option<String> {
        match self {
            Self::InvalidClient | Self::UnsupportedGrantType | Self::Internal => None,
            _ => Some(self.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            error_description: self.description(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::InvalidToken) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer error=\"invalid_token\""),
            );
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err.root() {
            AuthError::JwksUnavailable(_) => {
                tracing::error!(error = %err, "Key set unavailable");
                Self::Unavailable
            }
            AuthError::Signing(_) => {
                tracing::error!(error = %err, "Signing failed");
                Self::Internal
            }
            _ => {
                tracing::debug!(error = %err, "Rejected bearer token");
                Self::InvalidToken
            }
        }
    }
}

impl From<IssuerError> for ApiError {
    fn from(err: IssuerError) -> Self {
        match err {
            IssuerError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            IssuerError::InvalidClient => Self::InvalidClient,
            IssuerError::UnsupportedGrantType(_) => Self::UnsupportedGrantType,
            IssuerError::KeyNotFound(kid) => Self::NotFound(format!("key {kid} is not loaded")),
            IssuerError::ActiveKeyRetirement(kid) => {
                Self::Conflict(format!("key {kid} is the active signing key"))
            }
            IssuerError::InvalidKey { .. } => Self::InvalidRequest(err.to_string()),
            IssuerError::KeyStoreInit(_) | IssuerError::Signing(_) | IssuerError::Store(_) => {
                tracing::error!(error = %err, "Issuer error");
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_auth::Stage;
    use keyward_core::KeyId;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UnsupportedGrantType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidClient.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_errors_map_through_stage() {
        let unavailable = AuthError::JwksUnavailable("down".into()).at(Stage::KeySet);
        assert!(matches!(ApiError::from(unavailable), ApiError::Unavailable));
        let expired = AuthError::Expired.at(Stage::Claims);
        assert!(matches!(ApiError::from(expired), ApiError::InvalidToken));
        let signing = AuthError::Signing("key too small".into());
        assert!(matches!(ApiError::from(signing), ApiError::Internal));
    }

    #[test]
    fn issuer_errors_map_to_oauth_codes() {
        assert_eq!(
            ApiError::from(IssuerError::UnsupportedGrantType("password".into())).code(),
            "unsupported_grant_type"
        );
        assert_eq!(ApiError::from(IssuerError::InvalidClient).code(), "invalid_client");
        let kid = KeyId::new("k1").unwrap();
        assert_eq!(
            ApiError::from(IssuerError::ActiveKeyRetirement(kid)).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(IssuerError::Signing("x".into())).code(),
            "server_error"
        );
    }

    #[test]
    fn secretless_errors_have_no_description() {
        assert!(ApiError::InvalidClient.description().is_none());
        assert!(ApiError::InvalidRequest("missing".into()).description().is_some());
    }
}
