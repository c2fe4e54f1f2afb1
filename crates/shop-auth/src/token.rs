//! # Identity Tokens
//!
//! HS256 JWTs carrying the user id (`sub`) and an expiry. Tokens are
//! signed, not encrypted: the payload is readable by anyone holding the
//! token, so it carries nothing beyond the id and timestamps.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shop_core::{ShopError, ShopResult, UserId};
use tracing::debug;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs and verifies identity tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the signing secret and token lifetime
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `user_id`.
    pub fn issue(&self, user_id: UserId) -> ShopResult<String> {
        let claims = Claims::new(user_id, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ShopError::Internal(format!("token signing failed: {}", e)))
    }

    /// Check signature and expiry and return the user id.
    pub fn verify(&self, token: &str) -> ShopResult<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => ShopError::unauthenticated("Token expired"),
                _ => ShopError::unauthenticated("Invalid token"),
            }
        })?;

        // jsonwebtoken treats exp == now as still valid; we don't.
        if data.claims.is_expired() {
            return Err(ShopError::unauthenticated("Token expired"));
        }

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ShopError::unauthenticated("Invalid token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let issuer = TokenIssuer::new(b"test-secret", Duration::days(7));
        let user = UserId::new();

        let token = issuer.issue(user).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(issuer.verify(&token).unwrap(), user);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(b"test-secret", Duration::seconds(-5));
        let token = issuer.issue(UserId::new()).unwrap();

        let err = issuer.verify(&token).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new(b"secret-a", Duration::hours(1))
            .issue(UserId::new())
            .unwrap();

        let err = TokenIssuer::new(b"secret-b", Duration::hours(1))
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, ShopError::Unauthenticated(_)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = TokenIssuer::new(b"test-secret", Duration::hours(1));
        let token = issuer.issue(UserId::new()).unwrap();

        let other = issuer.issue(UserId::new()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(issuer.verify(&forged).is_err());
        assert!(issuer.verify("garbage").is_err());
    }
}
