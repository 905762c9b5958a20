//! OAuth2 client-credentials grant.
//!
//! Credentials arrive in one of three shapes. A JSON body is used when the
//! content type says JSON. Otherwise the body is read as a form, and HTTP
//! Basic credentials, when present, take priority over form fields.

use std::fmt;
use std::sync::Arc;

use base64::prelude::*;
use keyward_core::ClientId;
use keyward_store::{ClientStore, OAuthClient};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{IssuerError, Result};
use crate::issuer::TokenIssuer;

/// The only supported grant type.
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";

/// `token_type` of every issued token.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A parsed token request.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    /// Requested grant type.
    pub grant_type: String,
    /// Presented client ID.
    pub client_id: String,
    /// Presented client secret.
    pub client_secret: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl TokenRequest {
    /// Build a request from its parts.
    #[must_use]
    pub fn new(
        grant_type: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: grant_type.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Parse a request from its `Content-Type`, `Authorization` header, and body.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::InvalidRequest` if the body does not decode.
    pub fn parse(
        content_type: Option<&str>,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<Self> {
        let content_type = content_type.unwrap_or_default();

        if content_type.contains("application/json") {
            return serde_json::from_slice(body)
                .map_err(|_| IssuerError::InvalidRequest("invalid request body".to_string()));
        }

        let mut request: Self = if content_type.contains(FORM_CONTENT_TYPE) {
            serde_urlencoded::from_bytes(body)
                .map_err(|_| IssuerError::InvalidRequest("invalid form data".to_string()))?
        } else {
            Self::default()
        };

        // TODO: reject requests carrying both Basic and body credentials (RFC 6749 2.3.1).
        if let Some((id, secret)) = authorization.and_then(basic_credentials) {
            request.client_id = id;
            request.client_secret = secret;
        }

        Ok(request)
    }
}

/// Decode `Basic <base64(id:secret)>` credentials.
///
/// Returns `None` for other schemes or undecodable values.
#[must_use]
pub fn basic_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, value) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(value.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}

/// Hash a client secret for storage: lowercase hex SHA-256.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compare a presented secret against a stored hash in constant time.
#[must_use]
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    let presented = hash_secret(secret);
    presented.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed service token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Token lifetime, in seconds.
    pub expires_in: u64,
}

/// Validates client credentials and exchanges them for service tokens.
pub struct ClientAuthenticator<S> {
    store: S,
    issuer: Arc<TokenIssuer>,
}

impl<S: ClientStore> ClientAuthenticator<S> {
    /// Create an authenticator over a client store and issuer.
    #[must_use]
    pub fn new(store: S, issuer: Arc<TokenIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Get a reference to the client store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the issuer.
    #[must_use]
    pub const fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Check a request's grant type and credentials.
    ///
    /// Unknown, inactive, and wrong-secret clients are indistinguishable to
    /// the caller.
    ///
    /// # Errors
    ///
    /// - `UnsupportedGrantType` if the grant is not `client_credentials`
    /// - `InvalidRequest` if the client ID or secret is empty
    /// - `InvalidClient` if the client is unknown, inactive, or the secret is wrong
    /// - `Store` if the lookup fails
    pub fn authenticate(&self, request: &TokenRequest) -> Result<OAuthClient> {
        if request.grant_type != GRANT_CLIENT_CREDENTIALS {
            return Err(IssuerError::UnsupportedGrantType(request.grant_type.clone()));
        }

        if request.client_id.is_empty() || request.client_secret.is_empty() {
            return Err(IssuerError::InvalidRequest(
                "client_id and client_secret are required".to_string(),
            ));
        }

        let Ok(client_id) = ClientId::new(request.client_id.as_str()) else {
            tracing::warn!("Rejected malformed client id");
            return Err(IssuerError::InvalidClient);
        };

        let Some(client) = self.store.find_active_client(&client_id)? else {
            tracing::warn!(client_id = %client_id, "Client not found or inactive");
            return Err(IssuerError::InvalidClient);
        };

        if !verify_secret(&request.client_secret, &client.client_secret_hash) {
            tracing::warn!(client_id = %client_id, "Invalid client secret");
            return Err(IssuerError::InvalidClient);
        }

        Ok(client)
    }

    /// Authenticate a request and issue a token for the client.
    ///
    /// # Errors
    ///
    /// See [`ClientAuthenticator::authenticate`]; additionally `Signing` if
    /// the token cannot be produced.
    pub fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse> {
        let client = self.authenticate(request)?;
        let access_token = self.issuer.issue(&client.client_id, &client.scopes)?;

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.issuer.expiry_seconds(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IssuerConfig, KeySource};
    use crate::keyring::{parse_private_key, KeyRing};
    use keyward_core::KeyId;
    use keyward_store::MemoryStore;
    use std::path::PathBuf;

    const KEY_1: &str = include_str!("../testdata/test-key-1_private.pem");

    fn basic(id: &str, secret: &str) -> String {
        format!("Basic {}", BASE64_STANDARD.encode(format!("{id}:{secret}")))
    }

    fn authenticator() -> ClientAuthenticator<MemoryStore> {
        let ring = KeyRing::new(
            KeyId::new("k1").unwrap(),
            parse_private_key("k1", KEY_1).unwrap(),
        );
        let config = IssuerConfig::new(KeySource::Directory {
            keys_dir: PathBuf::from("unused"),
            active_kid: "k1".to_string(),
        });
        let issuer = Arc::new(TokenIssuer::new(Arc::new(ring), &config));

        let store = MemoryStore::new();
        store
            .put_client(&OAuthClient::new(
                ClientId::new("test-client").unwrap(),
                hash_secret("test-secret"),
                "Test Client",
                "notifications:send",
            ))
            .unwrap();
        ClientAuthenticator::new(store, issuer)
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_secret("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
        assert!(verify_secret("test", &hash_secret("test")));
        assert!(!verify_secret("test", "9f86d0"));
    }

    #[test]
    fn parse_json_body() {
        let body = br#"{"grant_type":"client_credentials","client_id":"a","client_secret":"b"}"#;
        let req = TokenRequest::parse(Some("application/json; charset=utf-8"), None, body).unwrap();
        assert_eq!(req, TokenRequest::new("client_credentials", "a", "b"));
    }

    #[test]
    fn json_ignores_basic_auth() {
        let body = br#"{"grant_type":"client_credentials","client_id":"a","client_secret":"b"}"#;
        let auth = basic("other", "creds");
        let req = TokenRequest::parse(Some("application/json"), Some(&auth), body).unwrap();
        assert_eq!(req.client_id, "a");
    }

    #[test]
    fn malformed_json_is_invalid_request() {
        let err = TokenRequest::parse(Some("application/json"), None, b"{").unwrap_err();
        assert!(matches!(err, IssuerError::InvalidRequest(_)));
    }

    #[test]
    fn parse_form_body() {
        let req = TokenRequest::parse(
            Some(FORM_CONTENT_TYPE),
            None,
            b"grant_type=client_credentials&client_id=a&client_secret=s%26cret",
        )
        .unwrap();
        assert_eq!(req, TokenRequest::new("client_credentials", "a", "s&cret"));
    }

    #[test]
    fn basic_auth_wins_over_form_fields() {
        let auth = basic("basic-id", "basic:secret");
        let req = TokenRequest::parse(
            Some(FORM_CONTENT_TYPE),
            Some(&auth),
            b"grant_type=client_credentials&client_id=form-id&client_secret=form-secret",
        )
        .unwrap();
        assert_eq!(req.grant_type, "client_credentials");
        assert_eq!(req.client_id, "basic-id");
        assert_eq!(req.client_secret, "basic:secret");
    }

    #[test]
    fn basic_credentials_decoding() {
        assert_eq!(
            basic_credentials(&basic("id", "pw")),
            Some(("id".to_string(), "pw".to_string()))
        );
        assert!(basic_credentials("Bearer abc").is_none());
        assert!(basic_credentials("Basic !!!").is_none());
        let no_colon = format!("basic {}", BASE64_STANDARD.encode("nocolon"));
        assert!(basic_credentials(&no_colon).is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let req = TokenRequest::new("client_credentials", "a", "hunter2");
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn exchange_issues_token() {
        let auth = authenticator();
        let resp = auth
            .exchange(&TokenRequest::new(
                GRANT_CLIENT_CREDENTIALS,
                "test-client",
                "test-secret",
            ))
            .unwrap();
        assert!(!resp.access_token.is_empty());
        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.expires_in, 3600);

        let parsed = keyward_auth::token::parse(&resp.access_token).unwrap();
        assert_eq!(parsed.claims.sub, "test-client");
        assert_eq!(parsed.claims.scope, "notifications:send");
    }

    #[test]
    fn grant_type_checked_before_credentials() {
        let err = authenticator()
            .authenticate(&TokenRequest::new("password", "", ""))
            .unwrap_err();
        assert!(matches!(err, IssuerError::UnsupportedGrantType(g) if g == "password"));
    }

    #[test]
    fn missing_credentials_are_invalid_request() {
        let auth = authenticator();
        for req in [
            TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "", "test-secret"),
            TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "test-client", ""),
        ] {
            assert!(matches!(
                auth.authenticate(&req),
                Err(IssuerError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn bad_clients_are_indistinguishable() {
        let auth = authenticator();
        let wrong_secret = TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "test-client", "nope");
        let unknown = TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "ghost", "test-secret");
        let malformed = TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "has space", "test-secret");
        for req in [wrong_secret, unknown, malformed] {
            assert!(matches!(
                auth.authenticate(&req),
                Err(IssuerError::InvalidClient)
            ));
        }

        let id = ClientId::new("test-client").unwrap();
        auth.store().set_client_active(&id, false).unwrap();
        let valid = TokenRequest::new(GRANT_CLIENT_CREDENTIALS, "test-client", "test-secret");
        assert!(matches!(
            auth.authenticate(&valid),
            Err(IssuerError::InvalidClient)
        ));
    }
}
