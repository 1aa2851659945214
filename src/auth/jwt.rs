//! JWT issuing and verification (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: Uuid,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Expired tokens are distinguished from otherwise-invalid ones for client
/// messaging; both map to 401 at the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

pub fn issue(user_id: Uuid, is_admin: bool, secret: &str, ttl_hours: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        is_admin,
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_round_trip() {
        let id = Uuid::new_v4();
        let token = issue(id, true, SECRET, 1).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id);
        assert!(claims.is_admin);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issue(Uuid::new_v4(), false, SECRET, 1).unwrap();
        assert_eq!(verify(&token, "other-secret"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let token = issue(Uuid::new_v4(), false, SECRET, -2).unwrap();
        assert_eq!(verify(&token, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(verify("not-a-token", SECRET), Err(TokenError::Invalid));
    }
}
