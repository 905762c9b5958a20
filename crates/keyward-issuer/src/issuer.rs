//! Service token minting.

use std::sync::Arc;

use base64::prelude::*;
use keyward_auth::signature;
use keyward_auth::token::{encode_segment, Header};
use keyward_auth::{ClaimsValidator, JwkSet, JwksValidator};
use keyward_core::{ClientId, Clock, KeyId, SystemClock};
use serde::Serialize;
use uuid::Uuid;

use crate::config::IssuerConfig;
use crate::error::{IssuerError, Result};
use crate::keyring::KeyRing;

/// The claim set written into every service token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceClaims {
    /// Issuer.
    pub iss: String,
    /// Subject: the client ID.
    pub sub: String,
    /// Audience.
    pub aud: String,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Not before (Unix seconds).
    pub nbf: i64,
    /// Unique token ID.
    pub jti: String,
    /// Space-separated granted scopes.
    pub scope: String,
}

/// Mints RS256 service tokens with the active key of a `KeyRing`.
pub struct TokenIssuer {
    keys: Arc<KeyRing>,
    issuer: String,
    audience: String,
    expiry_seconds: u64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer over an existing key ring.
    #[must_use]
    pub fn new(keys: Arc<KeyRing>, config: &IssuerConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry_seconds: config.token_expiry_seconds,
            clock: Arc::new(SystemClock),
        }
    }

    /// Load the key ring named by `config` and create an issuer over it.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyStoreInit` if the key ring cannot be loaded.
    pub fn from_config(config: &IssuerConfig) -> Result<Self> {
        let keys = KeyRing::from_config(&config.key_source)?;
        Ok(Self::new(Arc::new(keys), config))
    }

    /// Replace the clock used to stamp tokens.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issue a signed token for `client_id` carrying `scope`.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::Signing` if encoding or signing fails.
    pub fn issue(&self, client_id: &ClientId, scope: &str) -> Result<String> {
        let now = self.clock.now();
        let expiry = i64::try_from(self.expiry_seconds).unwrap_or(i64::MAX);
        let claims = ServiceClaims {
            iss: self.issuer.clone(),
            sub: client_id.to_string(),
            aud: self.audience.clone(),
            exp: now.saturating_add(expiry),
            iat: now,
            nbf: now,
            jti: Uuid::new_v4().to_string(),
            scope: scope.to_string(),
        };

        let (kid, key) = self.keys.signing_key();
        let header = encode_segment(&Header::rs256(kid.as_str()))
            .map_err(|e| IssuerError::Signing(e.to_string()))?;
        let payload =
            encode_segment(&claims).map_err(|e| IssuerError::Signing(e.to_string()))?;

        let signing_input = format!("{header}.{payload}");
        let sig = signature::sign(signing_input.as_bytes(), &key)
            .map_err(|e| IssuerError::Signing(e.to_string()))?;

        tracing::info!(client_id = %client_id, kid = %kid, jti = %claims.jti, "Issued service token");
        Ok(format!("{signing_input}.{}", BASE64_URL_SAFE_NO_PAD.encode(sig)))
    }

    /// A verifier for tokens from this issuer, backed by the in-process ring.
    #[must_use]
    pub fn validator(&self) -> JwksValidator<Arc<KeyRing>> {
        JwksValidator::new(
            Arc::clone(&self.keys),
            ClaimsValidator::new(self.issuer.clone(), self.audience.clone()),
        )
    }

    /// The published key set.
    #[must_use]
    pub fn jwks(&self) -> Arc<JwkSet> {
        self.keys.jwks()
    }

    /// The underlying key ring.
    #[must_use]
    pub fn key_ring(&self) -> &Arc<KeyRing> {
        &self.keys
    }

    /// The kid used for new tokens.
    #[must_use]
    pub fn active_key_id(&self) -> KeyId {
        self.keys.active_key_id()
    }

    /// All published kids.
    #[must_use]
    pub fn key_ids(&self) -> Vec<KeyId> {
        self.keys.key_ids()
    }

    /// Lifetime of issued tokens, in seconds.
    #[must_use]
    pub const fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// The `iss` claim written into tokens.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The `aud` claim written into tokens.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeySource, DEFAULT_KEY_ID};
    use crate::keyring::parse_private_key;
    use keyward_auth::{token, AuthError, JwtValidator};
    use keyward_core::ManualClock;
    use std::path::PathBuf;

    const KEY_1: &str = include_str!("../testdata/test-key-1_private.pem");
    const KEY_2: &str = include_str!("../testdata/test-key-2_private.pem");
    const PUB_1: &str = include_str!("../testdata/test-key-1_public.pem");
    const NOW: i64 = 1_700_000_000;

    fn kid(s: &str) -> KeyId {
        KeyId::new(s).unwrap()
    }

    fn client(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    fn config() -> IssuerConfig {
        IssuerConfig::new(KeySource::Single {
            private_key_path: PathBuf::from("unused"),
            public_key_path: None,
            kid: DEFAULT_KEY_ID.to_string(),
        })
    }

    fn issuer(clock: Arc<ManualClock>) -> TokenIssuer {
        let ring = KeyRing::new(kid("k1"), parse_private_key("k1", KEY_1).unwrap());
        TokenIssuer::new(Arc::new(ring), &config()).with_clock(clock)
    }

    #[tokio::test]
    async fn issued_token_verifies_in_process() {
        let clock = Arc::new(ManualClock::new(NOW));
        let issuer = issuer(Arc::clone(&clock));
        let token = issuer.issue(&client("payslip-viewer"), "notifications:send").unwrap();

        let identity = issuer
            .validator()
            .with_clock(clock)
            .validate_service(&token)
            .await
            .unwrap();
        assert_eq!(identity.client_id, client("payslip-viewer"));
        assert_eq!(identity.scopes, vec!["notifications:send"]);
    }

    #[test]
    fn claim_set_and_header() {
        let issuer = issuer(Arc::new(ManualClock::new(NOW)));
        let token = issuer.issue(&client("attendance"), "read write").unwrap();
        let parsed = token::parse(&token).unwrap();

        assert_eq!(parsed.header.alg, "RS256");
        assert_eq!(parsed.header.kid.as_deref(), Some("k1"));
        assert_eq!(parsed.claims.iss, "superapp-idp");
        assert_eq!(parsed.claims.aud, "superapp-api");
        assert_eq!(parsed.claims.sub, "attendance");
        assert_eq!(parsed.claims.iat, NOW);
        assert_eq!(parsed.claims.nbf, NOW);
        assert_eq!(parsed.claims.exp, NOW + 3600);
        assert_eq!(parsed.claims.scope, "read write");
        assert!(Uuid::parse_str(&parsed.claims.jti).is_ok());

        let again = token::parse(&issuer.issue(&client("attendance"), "").unwrap()).unwrap();
        assert_ne!(parsed.claims.jti, again.claims.jti);
    }

    #[tokio::test]
    async fn rotation_keeps_old_tokens_valid() {
        let clock = Arc::new(ManualClock::new(NOW));
        let issuer = issuer(Arc::clone(&clock));
        issuer
            .key_ring()
            .insert_key_pair(kid("k2"), parse_private_key("k2", KEY_2).unwrap(), None)
            .unwrap();

        let before = issuer.issue(&client("svc"), "").unwrap();
        issuer.key_ring().set_active_key(&kid("k2")).unwrap();
        let after = issuer.issue(&client("svc"), "").unwrap();

        assert_eq!(token::parse(&after).unwrap().header.kid.as_deref(), Some("k2"));
        assert_eq!(issuer.active_key_id(), kid("k2"));

        let validator = issuer.validator().with_clock(clock);
        validator.validate(&before).await.unwrap();
        validator.validate(&after).await.unwrap();

        // Retiring the old key is what invalidates its tokens.
        issuer.key_ring().retire_key(&kid("k1")).unwrap();
        let err = validator.validate(&before).await.unwrap_err();
        assert!(matches!(err.root(), AuthError::UnknownSigningKey(_)));
    }

    #[tokio::test]
    async fn issued_token_expires() {
        let clock = Arc::new(ManualClock::new(NOW));
        let issuer = issuer(Arc::clone(&clock));
        let token = issuer.issue(&client("svc"), "").unwrap();

        clock.advance(3601);
        let err = issuer
            .validator()
            .with_clock(clock)
            .validate(&token)
            .await
            .unwrap_err();
        assert!(matches!(err.root(), AuthError::Expired));
    }

    #[test]
    fn decodes_with_jsonwebtoken() {
        let issuer = issuer(Arc::new(ManualClock::new(SystemClock.now())));
        let token = issuer.issue(&client("svc"), "read").unwrap();

        let key = jsonwebtoken::DecodingKey::from_rsa_pem(PUB_1.as_bytes()).unwrap();
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.set_audience(&["superapp-api"]);
        validation.set_issuer(&["superapp-idp"]);
        let data =
            jsonwebtoken::decode::<serde_json::Value>(&token, &key, &validation).unwrap();
        assert_eq!(data.claims["sub"], "svc");
        assert_eq!(data.header.kid.as_deref(), Some("k1"));
    }

    #[test]
    fn introspection() {
        let issuer = issuer(Arc::new(ManualClock::new(NOW)));
        assert_eq!(issuer.expiry_seconds(), 3600);
        assert_eq!(issuer.key_ids(), vec![kid("k1")]);
        assert_eq!(issuer.jwks().keys.len(), 1);
        assert_eq!(issuer.issuer(), "superapp-idp");
        assert_eq!(issuer.audience(), "superapp-api");
    }
}
