//! Bearer-token auth guard
//!
//! One shared extractor replaces per-route token checks: `AuthUser` for any
//! signed-in account, `AdminUser` layering the admin check on top.

pub mod jwt;
pub mod password;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Identity resolved from a valid bearer token, attached to the request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("No Authorization header provided".into()))?;

        let token = bearer_token(header)?;
        let claims = jwt::verify(token, &state.config.jwt_secret)
            .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

        // The token alone is not enough; the account must still exist.
        sqlx::query_as::<_, AuthUser>("SELECT id, email, is_admin FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("User not found".into()))
    }
}

/// Identity that must additionally carry the administrator flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::Unauthorized);
        }
        Ok(Self(user))
    }
}

fn bearer_token(header: &str) -> Result<&str, ApiError> {
    let mut parts = header.splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthenticated("Invalid Authorization format. Use: Bearer <token>".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_accepted() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_malformed_headers_rejected() {
        assert!(bearer_token("abc.def.ghi").is_err());
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer").is_err());
        assert!(bearer_token("Bearer ").is_err());
        assert!(bearer_token("Bearer a b").is_err());
    }
}
