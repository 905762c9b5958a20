//! Bearer token verification for keyward.
//!
//! This crate verifies RS256-signed JWTs against a JSON Web Key Set:
//!
//! - Compact token parsing
//! - JWKS fetching with a TTL cache shared across verifiers
//! - RSA PKCS#1 v1.5 / SHA-256 signatures
//! - Registered-claim validation (`exp`, `nbf`, `iss`, `aud`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│   JwtValidator   │
//! │   (HTTP)         │     │   (trait)        │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  JwksValidator   │
//!                          │  parse → sig →   │
//!                          │  claims          │
//!                          └────────┬─────────┘
//!                                   │ KeySetSource
//!                    ┌──────────────┴─────────────┐
//!           ┌────────▼─────────┐        ┌─────────▼────────┐
//!           │  RemoteJwks      │        │  in-process      │
//!           │  (JwksCache)     │        │  key ring        │
//!           └────────┬─────────┘        └──────────────────┘
//!                    │ HTTPS
//!           ┌────────▼─────────┐
//!           │  JWKS endpoint   │
//!           └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyward_auth::{AuthConfig, JwksCache, JwksValidator, JwtValidator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::default();
//! let cache = Arc::new(JwksCache::from_config(&config)?);
//! let validator = JwksValidator::remote(&config, cache);
//!
//! let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//! let user = validator.validate_user(token).await?;
//! println!("email: {}", user.email);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod signature;
pub mod source;
pub mod token;

use serde::Deserialize;

pub use cache::JwksCache;
pub use claims::ClaimsValidator;
pub use error::{AuthError, Result, Stage};
pub use jwks::{Jwk, JwkSet};
pub use jwt::{JwksValidator, JwtValidator, ServiceIdentity, UserIdentity};
pub use source::{KeySetSource, RemoteJwks};
pub use token::{Claims, Header, ParsedToken};

/// Configuration for verifying tokens from one issuer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWKS endpoint URL.
    pub jwks_url: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// How long a fetched key set stays fresh, in seconds.
    pub jwks_cache_ttl_seconds: u64,
    /// Upper bound on one JWKS fetch, in seconds.
    pub fetch_timeout_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_url: "http://localhost:8081/.well-known/jwks.json".to_string(),
            issuer: "superapp-idp".to_string(),
            audience: "superapp-api".to_string(),
            jwks_cache_ttl_seconds: cache::DEFAULT_TTL.as_secs(),
            fetch_timeout_seconds: cache::DEFAULT_FETCH_TIMEOUT.as_secs(),
        }
    }
}
