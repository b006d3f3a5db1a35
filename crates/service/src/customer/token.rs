//! Signed session tokens (HS256 JWT) carrying the customer id and email.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::CustomerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks tokens with a process-wide secret and fixed lifetime.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    /// An empty secret is refused.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, CustomerError> {
        if secret.is_empty() {
            return Err(CustomerError::TokenError("signing secret must not be empty".into()));
        }
        let ttl_secs = i64::try_from(ttl_secs).map_err(|_| CustomerError::TokenError("token ttl out of range".into()))?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, id: Uuid, email: &str) -> Result<String, CustomerError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims { id, email: email.to_string(), iat, exp: iat + self.ttl_secs };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CustomerError::TokenError(e.to_string()))
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, CustomerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| CustomerError::TokenError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret-key-for-testing", 3600).unwrap()
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let t = issuer();
        let id = Uuid::new_v4();
        let token = t.issue(id, "a@b.com").unwrap();
        let claims = t.verify(&token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issuer().issue(Uuid::new_v4(), "a@b.com").unwrap();
        let other = TokenIssuer::new(b"another-secret", 3600).unwrap();
        assert!(matches!(other.verify(&token), Err(CustomerError::TokenError(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = b"test-secret-key-for-testing";
        let now = chrono::Utc::now().timestamp();
        let claims = Claims { id: Uuid::new_v4(), email: "a@b.com".into(), iat: now - 7200, exp: now - 3600 };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap();
        assert!(issuer().verify(&token).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = issuer().issue(Uuid::new_v4(), "a@b.com").unwrap();
        token.push('x');
        assert!(issuer().verify(&token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(TokenIssuer::new(b"", 3600).is_err());
    }
}
