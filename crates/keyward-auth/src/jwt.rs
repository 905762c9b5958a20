//! Token verification and identity projection.
//!
//! `JwksValidator` runs the full pipeline: parse, obtain the key set, verify
//! the signature, validate claims. Any stage failure aborts verification and
//! is returned wrapped with the stage it came from.

use std::sync::Arc;

use async_trait::async_trait;
use keyward_core::{ClientId, Clock, SystemClock};

use crate::claims::ClaimsValidator;
use crate::error::{AuthError, Result, Stage};
use crate::signature;
use crate::source::{KeySetSource, RemoteJwks};
use crate::token::{self, Claims};
use crate::{AuthConfig, JwksCache};

/// The identity of an end user, taken from an identity-provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// The user's email address.
    pub email: String,
    /// Group memberships.
    pub groups: Vec<String>,
}

impl From<Claims> for UserIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email,
            groups: claims.groups,
        }
    }
}

/// The identity of a calling service, taken from a service token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// The client (micro-app) ID from the `sub` claim.
    pub client_id: ClientId,
    /// Scopes granted to the client.
    pub scopes: Vec<String>,
}

impl ServiceIdentity {
    /// True if the identity carries `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl TryFrom<Claims> for ServiceIdentity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self> {
        let client_id = ClientId::new(claims.sub)
            .map_err(|e| AuthError::MalformedToken(format!("invalid sub claim: {e}")))?;
        let scopes = claims
            .scope
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Ok(Self { client_id, scopes })
    }
}

/// Trait for validating bearer tokens.
#[async_trait]
pub trait JwtValidator: Send + Sync {
    /// Validate a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, carries an unknown or
    /// unsupported key, fails signature or claims checks, or if the key set
    /// is unavailable.
    async fn validate(&self, token: &str) -> Result<Claims>;

    /// Validate a user token and project it to a `UserIdentity`.
    ///
    /// # Errors
    ///
    /// See [`JwtValidator::validate`].
    async fn validate_user(&self, token: &str) -> Result<UserIdentity> {
        self.validate(token).await.map(UserIdentity::from)
    }

    /// Validate a service token and project it to a `ServiceIdentity`.
    ///
    /// # Errors
    ///
    /// See [`JwtValidator::validate`]; additionally `MalformedToken` if the
    /// subject is not a valid client ID.
    async fn validate_service(&self, token: &str) -> Result<ServiceIdentity> {
        let claims = self.validate(token).await?;
        ServiceIdentity::try_from(claims).map_err(|e| e.at(Stage::Claims))
    }
}

/// Signature-checking validator backed by a key-set source.
pub struct JwksValidator<S> {
    source: S,
    claims: ClaimsValidator,
    clock: Arc<dyn Clock>,
}

impl<S: KeySetSource> JwksValidator<S> {
    /// Create a validator reading keys from `source`.
    #[must_use]
    pub fn new(source: S, claims: ClaimsValidator) -> Self {
        Self {
            source,
            claims,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a reference to the key-set source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Run the full verification pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, wrapped with its `Stage`.
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        let parsed = token::parse(token).map_err(|e| e.at(Stage::Parse))?;

        let keys = self
            .source
            .key_set()
            .await
            .map_err(|e| e.at(Stage::KeySet))?;

        if let Err(err) = signature::verify(&parsed, &keys) {
            if matches!(err, AuthError::InvalidSignature) {
                tracing::warn!(kid = ?parsed.header.kid, "Token signature rejected");
            }
            return Err(err.at(Stage::Signature));
        }

        self.claims
            .validate(&parsed.claims, self.clock.now())
            .map_err(|e| e.at(Stage::Claims))?;

        Ok(parsed.claims)
    }
}

impl JwksValidator<RemoteJwks> {
    /// Create a validator for the remote JWKS named in `config`.
    #[must_use]
    pub fn remote(config: &AuthConfig, cache: Arc<JwksCache>) -> Self {
        Self::new(
            RemoteJwks::new(cache, config.jwks_url.clone()),
            ClaimsValidator::new(config.issuer.clone(), config.audience.clone()),
        )
    }
}

#[async_trait]
impl<S: KeySetSource> JwtValidator for JwksValidator<S> {
    async fn validate(&self, token: &str) -> Result<Claims> {
        self.verify(token).await
    }
}
