//! HTTP gateway for keyward token issuance and verification.
//!
//! This crate exposes the issuer and validators over HTTP. It handles:
//!
//! - The OAuth2 client-credentials grant at `/oauth/token`
//! - Publishing signing keys at `/.well-known/jwks.json`
//! - Bearer authentication for end users and services
//! - Key rotation on a separate internal router
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Micro-apps / Browser clients                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      keyward-gateway                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │   Bearer    │ │   Router    │ │   Key rotation      │   │
//! │  │  Extractors │ │  + Handlers │ │   (internal)        │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │  Issuer  │   │  Auth    │   │  Client  │
//!        │ + KeyRing│   │ (JWKS)   │   │  Store   │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyward_auth::{AuthConfig, JwksCache, JwksValidator};
//! use keyward_gateway::{create_internal_router, create_router, GatewayConfig, GatewayState};
//! use keyward_issuer::{ClientAuthenticator, IssuerConfig, KeySource, TokenIssuer};
//! use keyward_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RocksStore::open("/tmp/keyward")?;
//! let issuer = Arc::new(TokenIssuer::from_config(&IssuerConfig::new(
//!     KeySource::Directory {
//!         keys_dir: "/keys".into(),
//!         active_kid: "superapp-key-1".into(),
//!     },
//! ))?);
//!
//! let auth_config = AuthConfig::default();
//! let cache = Arc::new(JwksCache::from_config(&auth_config)?);
//! let user_validator = Arc::new(JwksValidator::remote(&auth_config, cache));
//! let service_validator = Arc::new(issuer.validator());
//!
//! let authenticator = Arc::new(ClientAuthenticator::new(store, issuer));
//! let state = GatewayState::new(
//!     authenticator,
//!     user_validator,
//!     service_validator,
//!     GatewayConfig::default(),
//! );
//!
//! let internal_app = create_internal_router(state.clone());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8081").await?;
//! let internal_listener = tokio::net::TcpListener::bind("127.0.0.1:9081").await?;
//! tokio::spawn(async move { axum::serve(internal_listener, internal_app).await });
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use routes::{create_internal_router, create_router};
pub use state::GatewayState;

// Re-export key types for convenience
pub use auth::{AuthUser, ServiceClient};
