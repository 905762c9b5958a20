//! RS256 signature engine.
//!
//! Verification locates the JWK named by the token header, rebuilds the RSA
//! public key, and checks a PKCS#1 v1.5 signature over the SHA-256 digest of
//! the signing input. Signing is the mirror image with a private key.

use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};
use crate::jwks::JwkSet;
use crate::token::ParsedToken;

/// Find the public key for a parsed token in `keys`.
///
/// # Errors
///
/// - `UnknownSigningKey` if the header has no kid or no key matches it
/// - `UnsupportedKey` if the matching key is not RSA/RS256
/// - `InvalidSignature` if the key material cannot be decoded
pub fn find_public_key(token: &ParsedToken, keys: &JwkSet) -> Result<RsaPublicKey> {
    let kid = token
        .header
        .kid
        .as_deref()
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| {
            AuthError::UnknownSigningKey("token header does not have a 'kid'".to_string())
        })?;

    let jwk = keys
        .find(kid)
        .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))?;

    if !jwk.is_rs256() {
        return Err(AuthError::UnsupportedKey(format!(
            "key with kid '{kid}' is not a supported RSA RS256 key"
        )));
    }

    jwk.to_rsa()
}

/// Verify a parsed token's signature against a key set.
///
/// # Errors
///
/// See [`find_public_key`]; additionally `InvalidSignature` if the
/// signature does not match.
pub fn verify(token: &ParsedToken, keys: &JwkSet) -> Result<()> {
    let public_key = find_public_key(token, keys)?;
    verify_with_key(token.signing_input.as_bytes(), &token.signature, &public_key)
}

/// Verify an RS256 signature over `signing_input` with a known public key.
///
/// # Errors
///
/// Returns `AuthError::InvalidSignature` if the signature does not match.
pub fn verify_with_key(
    signing_input: &[u8],
    signature: &[u8],
    public_key: &RsaPublicKey,
) -> Result<()> {
    let digest = Sha256::digest(signing_input);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| AuthError::InvalidSignature)
}

/// Produce an RS256 signature over `signing_input`.
///
/// # Errors
///
/// Returns `AuthError::Signing` if the private key cannot sign, which only
/// happens for a malformed or undersized key.
pub fn sign(signing_input: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let digest = Sha256::digest(signing_input);
    private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| AuthError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwks::Jwk;
    use crate::token::{encode_segment, parse, Header};
    use base64::prelude::*;
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use serde_json::json;

    const KEY_1: &str = include_str!("../../keyward-issuer/testdata/test-key-1_private.pem");
    const KEY_2: &str = include_str!("../../keyward-issuer/testdata/test-key-2_private.pem");

    fn private_key(pem: &str) -> RsaPrivateKey {
        RsaPrivateKey::from_pkcs1_pem(pem).unwrap()
    }

    fn key_set(kid: &str, pem: &str) -> JwkSet {
        JwkSet {
            keys: vec![Jwk::from_rsa(kid, &private_key(pem).to_public_key())],
        }
    }

    fn signed_token(kid: Option<&str>, pem: &str) -> String {
        let header = Header {
            kid: kid.map(str::to_string),
            ..Header::rs256("")
        };
        let input = format!(
            "{}.{}",
            encode_segment(&header).unwrap(),
            encode_segment(&json!({"sub": "svc", "exp": 4_000_000_000_i64})).unwrap()
        );
        let sig = sign(input.as_bytes(), &private_key(pem)).unwrap();
        format!("{input}.{}", BASE64_URL_SAFE_NO_PAD.encode(sig))
    }

    #[test]
    fn sign_then_verify() {
        let token = parse(&signed_token(Some("k1"), KEY_1)).unwrap();
        verify(&token, &key_set("k1", KEY_1)).unwrap();
    }

    #[test]
    fn undersized_key_is_a_signing_error() {
        // Too small to hold a SHA-256 DigestInfo.
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 256).unwrap();
        let err = sign(b"header.payload", &key).unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn wrong_key_material_is_invalid_signature() {
        let token = parse(&signed_token(Some("k1"), KEY_1)).unwrap();
        // Same kid, different modulus.
        let err = verify(&token, &key_set("k1", KEY_2)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_invalid_signature() {
        let token = signed_token(Some("k1"), KEY_1);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = encode_segment(&json!({"sub": "admin", "exp": 4_000_000_000_i64})).unwrap();
        parts[1] = &forged;
        let token = parse(&parts.join(".")).unwrap();
        assert!(matches!(
            verify(&token, &key_set("k1", KEY_1)),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn missing_or_unknown_kid() {
        let token = parse(&signed_token(None, KEY_1)).unwrap();
        assert!(matches!(
            verify(&token, &key_set("k1", KEY_1)),
            Err(AuthError::UnknownSigningKey(_))
        ));

        let token = parse(&signed_token(Some("k9"), KEY_1)).unwrap();
        assert!(matches!(
            verify(&token, &key_set("k1", KEY_1)),
            Err(AuthError::UnknownSigningKey(kid)) if kid == "k9"
        ));
    }

    #[test]
    fn non_rs256_key_unsupported() {
        let token = parse(&signed_token(Some("k1"), KEY_1)).unwrap();
        let mut keys = key_set("k1", KEY_1);
        keys.keys[0].alg = "RS512".to_string();
        assert!(matches!(
            verify(&token, &keys),
            Err(AuthError::UnsupportedKey(_))
        ));

        keys.keys[0].alg = "RS256".to_string();
        keys.keys[0].kty = "EC".to_string();
        assert!(matches!(
            verify(&token, &keys),
            Err(AuthError::UnsupportedKey(_))
        ));
    }

    #[test]
    fn interoperates_with_jsonwebtoken() {
        let encoding = jsonwebtoken::EncodingKey::from_rsa_pem(KEY_1.as_bytes()).unwrap();
        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = Some("k1".to_string());
        let token = jsonwebtoken::encode(
            &header,
            &json!({"sub": "svc", "exp": 4_000_000_000_i64}),
            &encoding,
        )
        .unwrap();

        let parsed = parse(&token).unwrap();
        verify(&parsed, &key_set("k1", KEY_1)).unwrap();
    }
}
