//! Registered-claim validation.

use crate::error::{AuthError, Result};
use crate::token::Claims;

/// Checks `exp`, `nbf`, `iss`, and `aud` against fixed expectations.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    issuer: String,
    audience: String,
}

impl ClaimsValidator {
    /// Create a validator expecting the given issuer and audience.
    #[must_use]
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// The expected issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The expected audience.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate `claims` as of Unix time `now`.
    ///
    /// Issuer and audience are compared as exact strings.
    ///
    /// # Errors
    ///
    /// Returns `Expired`, `NotYetValid`, `IssuerMismatch`, or
    /// `AudienceMismatch`, checked in that order.
    pub fn validate(&self, claims: &Claims, now: i64) -> Result<()> {
        if claims.exp == 0 || now > claims.exp {
            return Err(AuthError::Expired);
        }

        if claims.nbf != 0 && now < claims.nbf {
            return Err(AuthError::NotYetValid);
        }

        if claims.iss != self.issuer {
            return Err(AuthError::IssuerMismatch {
                expected: self.issuer.clone(),
                actual: claims.iss.clone(),
            });
        }

        if claims.aud != self.audience {
            return Err(AuthError::AudienceMismatch {
                expected: self.audience.clone(),
                actual: claims.aud.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn claims() -> Claims {
        Claims {
            iss: "superapp-idp".to_string(),
            aud: "superapp-api".to_string(),
            exp: NOW + 3600,
            nbf: NOW,
            iat: NOW,
            ..Claims::default()
        }
    }

    fn validator() -> ClaimsValidator {
        ClaimsValidator::new("superapp-idp", "superapp-api")
    }

    #[test]
    fn accepts_valid_claims() {
        validator().validate(&claims(), NOW).unwrap();
        validator().validate(&claims(), NOW + 3600).unwrap();
    }

    #[test]
    fn expiry() {
        let err = validator().validate(&claims(), NOW + 3601).unwrap_err();
        assert!(matches!(err, AuthError::Expired));

        let no_exp = Claims {
            exp: 0,
            ..claims()
        };
        assert!(matches!(
            validator().validate(&no_exp, NOW),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn not_before() {
        let future = Claims {
            nbf: NOW + 10,
            ..claims()
        };
        assert!(matches!(
            validator().validate(&future, NOW),
            Err(AuthError::NotYetValid)
        ));

        let unset = Claims { nbf: 0, ..claims() };
        validator().validate(&unset, NOW).unwrap();
    }

    #[test]
    fn issuer_and_audience_are_exact() {
        let wrong_iss = Claims {
            iss: "superapp-idp/".to_string(),
            ..claims()
        };
        assert!(matches!(
            validator().validate(&wrong_iss, NOW),
            Err(AuthError::IssuerMismatch { actual, .. }) if actual == "superapp-idp/"
        ));

        let wrong_aud = Claims {
            aud: "SUPERAPP-API".to_string(),
            ..claims()
        };
        assert!(matches!(
            validator().validate(&wrong_aud, NOW),
            Err(AuthError::AudienceMismatch { expected, .. }) if expected == "superapp-api"
        ));
    }

    #[test]
    fn expiry_checked_before_issuer() {
        let bad = Claims {
            iss: "other".to_string(),
            exp: NOW - 1,
            ..claims()
        };
        assert!(matches!(
            validator().validate(&bad, NOW),
            Err(AuthError::Expired)
        ));
    }
}
