// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 session tokens for NGO accounts.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, Role, SessionClaims};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Issues and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Issue a token for an NGO.
    pub fn issue(&self, ngo_id: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: ngo_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Verify signature, expiry and issuer.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-jwt-secret", "incident-report-server", Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = issuer();
        let token = tokens.issue("ngo-1", Role::Ngo).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "ngo-1");
        assert_eq!(claims.role, Role::Ngo);
        assert_eq!(claims.iss, "incident-report-server");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issuer().issue("ngo-1", Role::Ngo).unwrap();
        let other = TokenIssuer::new("another-secret", "incident-report-server", Duration::hours(1));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = issuer().issue("ngo-1", Role::Ngo).unwrap();
        let other = TokenIssuer::new("test-jwt-secret", "someone-else", Duration::hours(1));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidIssuer)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = TokenIssuer::new("test-jwt-secret", "incident-report-server", Duration::hours(-2));
        let token = expired.issue("ngo-1", Role::Ngo).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(issuer().verify("not.a.jwt"), Err(AuthError::MalformedToken)));
    }
}
