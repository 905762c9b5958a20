//! Authentication error types.

use std::fmt;

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// The verification stage at which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Splitting and decoding the compact token.
    Parse,
    /// Obtaining the key set from the cache or upstream.
    KeySet,
    /// Locating the key and checking the RSA signature.
    Signature,
    /// Checking expiry, not-before, issuer, and audience.
    Claims,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "could not parse token",
            Self::KeySet => "could not fetch JWKS",
            Self::Signature => "signature verification failed",
            Self::Claims => "claims validation failed",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during token verification or signing.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is not a well-formed three-part compact token.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// No key in the key set matches the token's `kid`.
    #[error("unknown signing key: {0}")]
    UnknownSigningKey(String),

    /// The matching key is not an RSA/RS256 key.
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// The signature does not verify against the key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token has expired or carries no expiry.
    #[error("token expired")]
    Expired,

    /// The token's not-before time is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// The `iss` claim does not match the expected issuer.
    #[error("invalid issuer: expected '{expected}', got '{actual}'")]
    IssuerMismatch {
        /// The configured issuer.
        expected: String,
        /// The issuer carried by the token.
        actual: String,
    },

    /// The `aud` claim does not match the expected audience.
    #[error("invalid audience: expected '{expected}', got '{actual}'")]
    AudienceMismatch {
        /// The configured audience.
        expected: String,
        /// The audience carried by the token.
        actual: String,
    },

    /// The private key could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The key set could not be fetched and nothing usable is cached.
    #[error("JWKS unavailable: {0}")]
    JwksUnavailable(String),

    /// An error from one verification stage, with the stage attached.
    #[error("{stage}: {source}")]
    Stage {
        /// Where the failure happened.
        stage: Stage,
        /// The underlying failure.
        #[source]
        source: Box<AuthError>,
    },
}

impl AuthError {
    /// Attach stage context to an error.
    #[must_use]
    pub fn at(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying error, looking through any stage wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns `true` if this error is transient and the request may succeed later.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self.root(), Self::JwksUnavailable(_))
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.root() {
            Self::JwksUnavailable(_) => 503,
            Self::Signing(_) => 500,
            _ => 401,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_sees_through_stage_wrappers() {
        let err = AuthError::Expired.at(Stage::Claims);
        assert!(matches!(err.root(), AuthError::Expired));
        assert_eq!(err.to_string(), "claims validation failed: token expired");
    }

    #[test]
    fn status_codes() {
        assert_eq!(AuthError::Expired.http_status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.http_status_code(), 401);
        assert_eq!(
            AuthError::MalformedToken("x".into())
                .at(Stage::Parse)
                .http_status_code(),
            401
        );
        assert_eq!(
            AuthError::JwksUnavailable("down".into())
                .at(Stage::KeySet)
                .http_status_code(),
            503
        );
        assert_eq!(AuthError::Signing("key too small".into()).http_status_code(), 500);
    }

    #[test]
    fn only_upstream_failures_are_retriable() {
        assert!(AuthError::JwksUnavailable("timeout".into()).is_retriable());
        assert!(!AuthError::InvalidSignature.is_retriable());
        assert!(!AuthError::UnknownSigningKey("k".into()).is_retriable());
        assert!(!AuthError::Signing("key too small".into()).is_retriable());
    }
}
