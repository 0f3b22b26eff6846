use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{AuthError, AuthResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self::with_ttl(secret, Duration::hours(ttl_hours))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Validate a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> AuthResult<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        data.claims.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// The token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("secret", 24);
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenIssuer::new("one", 24).issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            TokenIssuer::new("two", 24).verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired() {
        let issuer = TokenIssuer::with_ttl("secret", Duration::seconds(-30));
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage() {
        let issuer = TokenIssuer::new("secret", 1);
        assert!(matches!(issuer.verify("abc.def"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
