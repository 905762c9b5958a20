//! API request and response types for the gateway client.
//!
//! These types mirror the bodies of the keyward-gateway API.

use serde::{Deserialize, Serialize};

pub use keyward_issuer::TokenResponse;

// =============================================================================
// OAuth Types
// =============================================================================

/// Client-credentials token request.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequestBody<'a> {
    /// Always `client_credentials`.
    pub grant_type: &'a str,
    /// Client ID.
    pub client_id: &'a str,
    /// Client secret.
    pub client_secret: &'a str,
}

/// OAuth2-style error body returned by every gateway endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code (e.g. `invalid_client`).
    pub error: String,
    /// Optional human-readable detail.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ApiErrorResponse {
    /// The description if present, otherwise the code.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.error_description {
            Some(desc) => format!("{}: {desc}", self.error),
            None => self.error.clone(),
        }
    }
}

// =============================================================================
// Key Rotation Types
// =============================================================================

/// Request body naming one key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyRequest<'a> {
    /// The kid to act on.
    pub kid: &'a str,
}

/// Key ring state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeysResponse {
    /// The kid used for new tokens.
    pub active_key_id: String,
    /// All published kids.
    pub key_ids: Vec<String>,
}

/// Result of a key directory reload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReloadResponse {
    /// Kids added by the reload.
    pub added: Vec<String>,
    /// Key ring state after the reload.
    #[serde(flatten)]
    pub keys: KeysResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_description() {
        let err: ApiErrorResponse = serde_json::from_str(
            r#"{"error":"invalid_request","error_description":"missing client_id"}"#,
        )
        .unwrap();
        assert_eq!(err.message(), "invalid_request: missing client_id");

        let err: ApiErrorResponse = serde_json::from_str(r#"{"error":"invalid_client"}"#).unwrap();
        assert_eq!(err.message(), "invalid_client");
    }

    #[test]
    fn reload_response_flattens_key_state() {
        let body: ReloadResponse = serde_json::from_str(
            r#"{"added":["k2"],"active_key_id":"k1","key_ids":["k1","k2"]}"#,
        )
        .unwrap();
        assert_eq!(body.added, ["k2"]);
        assert_eq!(body.keys.active_key_id, "k1");
    }
}
