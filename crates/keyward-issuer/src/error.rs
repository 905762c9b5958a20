//! Error types for token issuance.
//!
//! Key-ring failures are fatal at startup or surface as operator errors on
//! the rotation endpoints. Credential failures map onto the OAuth2 error
//! codes returned from the token endpoint.

use keyward_core::KeyId;
use thiserror::Error;

/// A result type using `IssuerError`.
pub type Result<T> = std::result::Result<T, IssuerError>;

/// Errors that can occur while managing keys or issuing tokens.
#[derive(Debug, Error)]
pub enum IssuerError {
    /// No usable key pair could be loaded, or the active kid is missing.
    #[error("key store initialization failed: {0}")]
    KeyStoreInit(String),

    /// The requested kid is not loaded.
    #[error("key not found: {0}")]
    KeyNotFound(KeyId),

    /// The active signing key cannot be retired.
    #[error("cannot retire active signing key {0}")]
    ActiveKeyRetirement(KeyId),

    /// A key file could not be read or parsed.
    #[error("invalid key {kid}: {reason}")]
    InvalidKey {
        /// The kid being loaded.
        kid: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// Signing or encoding a token failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// The token request is missing required parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown client, inactive client, or wrong secret.
    #[error("invalid client credentials")]
    InvalidClient,

    /// The grant type is not `client_credentials`.
    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] keyward_store::StoreError),
}

impl IssuerError {
    /// Returns the OAuth2 error code for this error.
    #[must_use]
    pub const fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            _ => "server_error",
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::UnsupportedGrantType(_) => 400,
            Self::InvalidClient => 401,
            Self::KeyNotFound(_) => 404,
            Self::ActiveKeyRetirement(_) => 409,
            Self::InvalidKey { .. } => 422,
            Self::KeyStoreInit(_) | Self::Signing(_) | Self::Store(_) => 500,
        }
    }
}
