//! HTTP client for the gateway REST API.
//!
//! This module provides a typed client for the keyward-gateway token and
//! key-rotation endpoints.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use keyward_issuer::GRANT_CLIENT_CREDENTIALS;

use crate::types::{
    ApiErrorResponse, KeyRequest, KeysResponse, ReloadResponse, TokenRequestBody, TokenResponse,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Client for the gateway REST API.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// `base_url` is the listener root, e.g. `http://localhost:8081` for
    /// tokens or `http://127.0.0.1:9081` for key rotation.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Handle API error responses.
    async fn handle_error(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(err) => err.message(),
            Err(_) => "Unknown error".to_string(),
        };
        ClientError::Api { status, message }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Exchange client credentials for a service token.
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, ClientError> {
        let url = format!("{}/oauth/token", self.base_url);
        let body = TokenRequestBody {
            grant_type: GRANT_CLIENT_CREDENTIALS,
            client_id,
            client_secret,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        Self::parse(response).await
    }

    // =========================================================================
    // Key Rotation
    // =========================================================================

    /// Show the gateway's key ring.
    pub async fn list_keys(&self) -> Result<KeysResponse, ClientError> {
        let url = format!("{}/internal/keys", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::parse(response).await
    }

    /// Make `kid` the signing key.
    pub async fn set_active_key(&self, kid: &str) -> Result<KeysResponse, ClientError> {
        let url = format!("{}/internal/keys/active", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&KeyRequest { kid })
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Load new key pairs from the gateway's key directory.
    pub async fn reload_keys(&self) -> Result<ReloadResponse, ClientError> {
        let url = format!("{}/internal/keys/reload", self.base_url);
        let response = self.client.post(&url).send().await?;
        Self::parse(response).await
    }

    /// Stop publishing `kid`.
    pub async fn retire_key(&self, kid: &str) -> Result<KeysResponse, ClientError> {
        let url = format!("{}/internal/keys/retire", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&KeyRequest { kid })
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn trailing_slash_trimmed() {
        let client = GatewayClient::new("http://localhost:8081/");
        assert_eq!(client.base_url(), "http://localhost:8081");
    }

    #[tokio::test]
    async fn request_token_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "grant_type": "client_credentials",
                "client_id": "wallet-app",
                "client_secret": "s3cret",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a.b.c",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GatewayClient::new(server.uri());
        let token = client.request_token("wallet-app", "s3cret").await.unwrap();
        assert_eq!(token.access_token, "a.b.c");
        assert_eq!(token.expires_in, 3600);
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let client = GatewayClient::new(server.uri());
        let err = client.request_token("wallet-app", "wrong").await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid_client");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rotation_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/keys/reload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "added": ["k2"],
                "active_key_id": "k1",
                "key_ids": ["k1", "k2"],
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/internal/keys/active"))
            .and(body_json(json!({ "kid": "k2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "active_key_id": "k2",
                "key_ids": ["k1", "k2"],
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/internal/keys/retire"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "conflict",
                "error_description": "key k2 is the active signing key",
            })))
            .mount(&server)
            .await;

        let client = GatewayClient::new(server.uri());
        let reload = client.reload_keys().await.unwrap();
        assert_eq!(reload.added, ["k2"]);

        let keys = client.set_active_key("k2").await.unwrap();
        assert_eq!(keys.active_key_id, "k2");

        let err = client.retire_key("k2").await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 409, .. }));
    }
}
