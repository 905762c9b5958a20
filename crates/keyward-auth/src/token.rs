//! Compact token parsing.
//!
//! A compact token is `base64url(header) "." base64url(payload) "." base64url(signature)`,
//! all unpadded. Parsing keeps the exact `header.payload` substring that was
//! transmitted, because the signature covers those bytes and not any
//! re-serialisation of the decoded JSON.

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// The algorithm tag used for every token this crate signs or accepts.
pub const ALG_RS256: &str = "RS256";

/// Decoded JOSE header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signing algorithm.
    #[serde(default)]
    pub alg: String,
    /// Token type, normally `JWT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Key ID of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Header {
    /// An RS256 JWT header naming `kid`.
    #[must_use]
    pub fn rs256(kid: impl Into<String>) -> Self {
        Self {
            alg: ALG_RS256.to_string(),
            typ: Some("JWT".to_string()),
            kid: Some(kid.into()),
        }
    }
}

/// Decoded token claims.
///
/// Absent numeric claims decode as `0` and absent strings as empty, so the
/// claims validator sees a missing `exp` as expired and a missing `iss` as a mismatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Issuer.
    #[serde(default)]
    pub iss: String,
    /// Subject.
    #[serde(default)]
    pub sub: String,
    /// Audience (single string).
    #[serde(default)]
    pub aud: String,
    /// Expiry, Unix seconds.
    #[serde(default)]
    pub exp: i64,
    /// Not-before, Unix seconds.
    #[serde(default)]
    pub nbf: i64,
    /// Issued-at, Unix seconds.
    #[serde(default)]
    pub iat: i64,
    /// Token ID.
    #[serde(default)]
    pub jti: String,
    /// User email (identity-provider tokens).
    #[serde(default)]
    pub email: String,
    /// Group memberships (identity-provider tokens).
    #[serde(default)]
    pub groups: Vec<String>,
    /// Space-separated scopes (service tokens).
    #[serde(default)]
    pub scope: String,
}

/// A token split into its decoded parts.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    /// Decoded header.
    pub header: Header,
    /// Decoded claims.
    pub claims: Claims,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// The literal `header.payload` text the signer hashed.
    pub signing_input: String,
}

/// Split and decode a compact token.
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` if the token does not have exactly
/// three segments, or if any segment fails base64url or JSON decoding.
pub fn parse(token: &str) -> Result<ParsedToken> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::MalformedToken(
            "token must have 3 parts".to_string(),
        ));
    };

    let header: Header = decode_segment(header_b64, "header")?;
    let claims: Claims = decode_segment(payload_b64, "claims")?;

    let signature = BASE64_URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| AuthError::MalformedToken(format!("failed to decode signature: {e}")))?;

    // Slice the original text rather than re-joining so the bytes are untouched.
    let signing_input = token[..header_b64.len() + 1 + payload_b64.len()].to_string();

    Ok(ParsedToken {
        header,
        claims,
        signature,
        signing_input,
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("failed to decode {what}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("failed to unmarshal {what}: {e}")))
}

/// Serialise a value to JSON and base64url-encode it without padding.
///
/// # Errors
///
/// Returns `AuthError::MalformedToken` if the value cannot be serialised.
pub fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| AuthError::MalformedToken(format!("failed to serialise segment: {e}")))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(s: &str) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(s)
    }

    #[test]
    fn parses_three_segments() {
        let header = b64(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let payload = b64(
            r#"{"iss":"idp","aud":"api","exp":2000,"email":"a@b.c","groups":["admin","dev"]}"#,
        );
        let sig = BASE64_URL_SAFE_NO_PAD.encode([1u8, 2, 3]);
        let token = format!("{header}.{payload}.{sig}");

        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.header.kid.as_deref(), Some("k1"));
        assert_eq!(parsed.header.alg, "RS256");
        assert_eq!(parsed.claims.email, "a@b.c");
        assert_eq!(parsed.claims.groups, vec!["admin", "dev"]);
        assert_eq!(parsed.claims.exp, 2000);
        assert_eq!(parsed.claims.nbf, 0);
        assert_eq!(parsed.signature, vec![1, 2, 3]);
        assert_eq!(parsed.signing_input, format!("{header}.{payload}"));
    }

    #[test]
    fn signing_input_keeps_original_json_bytes() {
        // Whitespace and key order that a re-serialisation would not reproduce.
        let header = b64("{ \"kid\" : \"k1\", \"alg\":\"RS256\" }");
        let payload = b64("{\"sub\":\"x\",   \"iss\":\"y\"}");
        let token = format!("{header}.{payload}.AQID");

        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.signing_input, format!("{header}.{payload}"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for token in ["", "a", "a.b", "a.b.c.d", "a.b.c.d.e"] {
            let err = parse(token).unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedToken(_)),
                "{token:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_padded_or_invalid_base64() {
        let header = format!("{}=", b64(r#"{"alg":"RS256"}"#));
        let token = format!("{header}.{}.AQID", b64("{}"));
        assert!(matches!(parse(&token), Err(AuthError::MalformedToken(_))));

        let token = format!("{}.{}.!!!", b64(r#"{"alg":"RS256"}"#), b64("{}"));
        assert!(matches!(parse(&token), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn rejects_non_object_json() {
        let token = format!("{}.{}.AQID", b64(r#"{"alg":"RS256"}"#), b64("[1,2]"));
        let err = parse(&token).unwrap_err();
        assert!(err.to_string().contains("claims"));
    }

    #[test]
    fn encode_segment_is_unpadded_base64url_json() {
        let seg = encode_segment(&Header::rs256("k1")).unwrap();
        assert!(!seg.contains('='));
        let decoded = BASE64_URL_SAFE_NO_PAD.decode(seg).unwrap();
        let header: Header = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(header, Header::rs256("k1"));
    }
}
