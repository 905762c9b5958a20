//! Issuer configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Default kid used in single-key mode.
pub const DEFAULT_KEY_ID: &str = "superapp-key-1";

/// Where the key ring loads its key pairs from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum KeySource {
    /// One explicit key pair under a fixed kid.
    Single {
        /// Private key PEM file.
        private_key_path: PathBuf,
        /// Optional public key PEM file; derived from the private key if absent.
        #[serde(default)]
        public_key_path: Option<PathBuf>,
        /// The kid to publish.
        #[serde(default = "default_kid")]
        kid: String,
    },
    /// Every `<kid>_private.pem` in a directory.
    Directory {
        /// Directory to scan.
        keys_dir: PathBuf,
        /// The kid used for signing.
        active_kid: String,
    },
}

fn default_kid() -> String {
    DEFAULT_KEY_ID.to_string()
}

/// Configuration for the token issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    /// `iss` claim on issued tokens.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// `aud` claim on issued tokens.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Lifetime of issued tokens, in seconds.
    #[serde(default = "default_expiry")]
    pub token_expiry_seconds: u64,

    /// Key material.
    pub key_source: KeySource,
}

impl IssuerConfig {
    /// Create a config with default claims for the given key source.
    #[must_use]
    pub fn new(key_source: KeySource) -> Self {
        Self {
            issuer: default_issuer(),
            audience: default_audience(),
            token_expiry_seconds: default_expiry(),
            key_source,
        }
    }
}

fn default_issuer() -> String {
    "superapp-idp".to_string()
}

fn default_audience() -> String {
    "superapp-api".to_string()
}

const fn default_expiry() -> u64 {
    3600
}
