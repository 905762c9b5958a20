//! OAuth2 client records.

use chrono::{DateTime, Utc};
use keyward_core::ClientId;
use serde::{Deserialize, Serialize};

/// A registered OAuth2 client (micro-app).
///
/// The secret itself is never stored; only its SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Client identifier, used as the token subject.
    pub client_id: ClientId,
    /// Lowercase hex SHA-256 of the client secret.
    pub client_secret_hash: String,
    /// Human-readable name.
    pub name: String,
    /// Space-separated scopes granted to issued tokens.
    #[serde(default)]
    pub scopes: String,
    /// Inactive clients cannot obtain tokens.
    pub is_active: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl OAuthClient {
    /// Create an active client record.
    #[must_use]
    pub fn new(
        client_id: ClientId,
        client_secret_hash: impl Into<String>,
        name: impl Into<String>,
        scopes: impl Into<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret_hash: client_secret_hash.into(),
            name: name.into(),
            scopes: scopes.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
