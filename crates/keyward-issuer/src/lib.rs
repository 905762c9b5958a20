//! Token issuance for keyward.
//!
//! This crate owns the signing side of the token trust domain: the RSA key
//! ring, the service token issuer, and the OAuth2 client-credentials grant.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Gateway (POST /oauth/token)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ClientAuthenticator                      │
//! │        grant type → credentials → secret hash check         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌─────────────┐               ┌─────────────┐
//!        │ ClientStore │               │ TokenIssuer │
//!        │  (RocksDB)  │               └──────┬──────┘
//!        └─────────────┘                      │
//!                                      ┌──────▼──────┐
//!                                      │   KeyRing   │──▶ JWKS
//!                                      └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use keyward_issuer::{ClientAuthenticator, IssuerConfig, KeySource, TokenIssuer, TokenRequest};
//! use keyward_store::RocksStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IssuerConfig::new(KeySource::Directory {
//!     keys_dir: PathBuf::from("/etc/keyward/keys"),
//!     active_kid: "superapp-key-2".to_string(),
//! });
//! let issuer = Arc::new(TokenIssuer::from_config(&config)?);
//! let store = RocksStore::open("/var/lib/keyward")?;
//! let authenticator = ClientAuthenticator::new(store, issuer);
//!
//! let request = TokenRequest::new("client_credentials", "payslip-viewer", "s3cret");
//! let response = authenticator.exchange(&request)?;
//! println!("expires in {}s", response.expires_in);
//! # Ok(())
//! # }
//! ```
//!
//! # Rotation
//!
//! Stage a new pair in the key directory, call [`KeyRing::reload_directory`],
//! then [`KeyRing::set_active_key`]. Old public keys stay published until
//! [`KeyRing::retire_key`] removes them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod issuer;
pub mod keyring;

pub use config::{IssuerConfig, KeySource};
pub use credentials::{
    hash_secret, ClientAuthenticator, TokenRequest, TokenResponse, GRANT_CLIENT_CREDENTIALS,
};
pub use error::{IssuerError, Result};
pub use issuer::{ServiceClaims, TokenIssuer};
pub use keyring::KeyRing;
