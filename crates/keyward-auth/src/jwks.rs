//! JWKS (JSON Web Key Set) types and RSA codec.
//!
//! This module converts RSA public keys to and from the JWK representation:
//! big-endian modulus and exponent, base64url-encoded without padding.

use base64::prelude::*;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::token::ALG_RS256;

/// Largest exponent encoding accepted, in bytes.
///
/// Exponents must fit a signed 64-bit machine integer.
const MAX_EXPONENT_BYTES: usize = 7;

/// A JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The list of keys, one per kid.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find the key with the given kid.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// True when the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A single JWK (JSON Web Key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    #[serde(default)]
    pub kty: String,
    /// Key ID.
    #[serde(default)]
    pub kid: String,
    /// Modulus (base64url, unpadded).
    #[serde(default)]
    pub n: String,
    /// Exponent (base64url, unpadded).
    #[serde(default)]
    pub e: String,
    /// Algorithm (e.g., "RS256").
    #[serde(default)]
    pub alg: String,
    /// Key use (e.g., "sig").
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Encode an RSA public key as an RS256 signing JWK.
    #[must_use]
    pub fn from_rsa(kid: impl Into<String>, key: &RsaPublicKey) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: kid.into(),
            n: BASE64_URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
            e: BASE64_URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
            alg: ALG_RS256.to_string(),
            key_use: Some("sig".to_string()),
        }
    }

    /// True if the key declares RSA and RS256.
    #[must_use]
    pub fn is_rs256(&self) -> bool {
        self.kty == "RSA" && self.alg == ALG_RS256
    }

    /// Rebuild the RSA public key from modulus and exponent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSignature` if either component fails to
    /// decode, the exponent does not fit a machine integer, or the
    /// components do not form a usable RSA key.
    pub fn to_rsa(&self) -> Result<RsaPublicKey> {
        let n = BASE64_URL_SAFE_NO_PAD.decode(&self.n).map_err(|e| {
            tracing::debug!(kid = %self.kid, error = %e, "failed to decode modulus");
            AuthError::InvalidSignature
        })?;
        let e = BASE64_URL_SAFE_NO_PAD.decode(&self.e).map_err(|e| {
            tracing::debug!(kid = %self.kid, error = %e, "failed to decode exponent");
            AuthError::InvalidSignature
        })?;
        // Leading zero bytes carry no value.
        let significant = e.iter().position(|&b| b != 0).map_or(&e[..0], |i| &e[i..]);
        if significant.len() > MAX_EXPONENT_BYTES {
            tracing::debug!(kid = %self.kid, len = significant.len(), "exponent too large");
            return Err(AuthError::InvalidSignature);
        }

        let exponent = BigUint::from_bytes_be(significant);
        RsaPublicKey::new(BigUint::from_bytes_be(&n), exponent).map_err(|e| {
            tracing::debug!(kid = %self.kid, error = %e, "invalid RSA components");
            AuthError::InvalidSignature
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::DecodePublicKey;

    const PUBLIC_PEM: &str =
        include_str!("../../keyward-issuer/testdata/test-key-1_public.pem");

    fn public_key() -> RsaPublicKey {
        RsaPublicKey::from_public_key_pem(PUBLIC_PEM).unwrap()
    }

    #[test]
    fn encodes_standard_fields() {
        let jwk = Jwk::from_rsa("test-key-1", &public_key());
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        // 65537 is 0x01 0x00 0x01.
        assert_eq!(jwk.e, "AQAB");
        assert!(!jwk.n.contains('='));
        assert!(jwk.is_rs256());
    }

    #[test]
    fn decodes_to_the_same_key() {
        let key = public_key();
        let jwk = Jwk::from_rsa("test-key-1", &key);
        assert_eq!(jwk.to_rsa().unwrap(), key);
    }

    #[test]
    fn serialises_use_field_name() {
        let jwk = Jwk::from_rsa("test-key-1", &public_key());
        let json = serde_json::to_value(&jwk).unwrap();
        assert_eq!(json["use"], "sig");
        assert_eq!(json["kid"], "test-key-1");
    }

    #[test]
    fn parses_document_without_use() {
        let doc = r#"{"keys":[{"kty":"RSA","kid":"a","n":"AQAB","e":"AQAB","alg":"RS256"}]}"#;
        let set: JwkSet = serde_json::from_str(doc).unwrap();
        assert_eq!(set.keys.len(), 1);
        assert!(set.find("a").is_some());
        assert!(set.find("b").is_none());
        assert!(set.keys[0].key_use.is_none());
    }

    #[test]
    fn oversized_exponent_rejected() {
        let mut jwk = Jwk::from_rsa("test-key-1", &public_key());
        jwk.e = BASE64_URL_SAFE_NO_PAD.encode([1u8; 8]);
        assert!(matches!(jwk.to_rsa(), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn zero_padded_exponent_accepted() {
        let key = public_key();
        let mut jwk = Jwk::from_rsa("test-key-1", &key);
        // 65537 behind eight zero bytes.
        jwk.e = BASE64_URL_SAFE_NO_PAD.encode([0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1]);
        assert_eq!(jwk.to_rsa().unwrap(), key);
    }

    #[test]
    fn garbage_modulus_rejected() {
        let mut jwk = Jwk::from_rsa("test-key-1", &public_key());
        jwk.n = "not base64!".to_string();
        assert!(matches!(jwk.to_rsa(), Err(AuthError::InvalidSignature)));
    }
}
