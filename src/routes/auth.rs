//! Registration, login, and profile management

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{jwt, password, AuthUser};
use crate::domain::{User, UserAddress};
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/password", put(change_password))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    req.validate()?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_one(&state.db)
        .await?;
    if exists > 0 {
        return Err(ApiError::InvalidInput("Email already registered".into()));
    }

    let hash = password::hash(&req.password)?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, password_hash, is_admin, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, false, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&req.name)
    .bind(&req.email)
    .bind(&hash)
    .fetch_one(&state.db)
    .await?;

    let token = jwt::issue(user.id, user.is_admin, &state.config.jwt_secret, state.config.jwt_ttl_hours)
        .map_err(|e| ApiError::Internal(e.into()))?;
    tracing::info!(user = %user.id, "registered new account");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<AuthResponse>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".into()))?;

    if !password::verify(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated("Invalid email or password".into()));
    }

    let token = jwt::issue(user.id, user.is_admin, &state.config.jwt_secret, state.config.jwt_ttl_hours)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(AuthResponse { token, user }))
}

async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("User"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<UserAddress>,
}

async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(name) = &req.name {
        if name.is_empty() {
            return Err(ApiError::InvalidInput("Name cannot be empty".into()));
        }
    }
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = COALESCE($2, name), phone = COALESCE($3, phone), \
         address = COALESCE($4, address), updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(auth.id)
    .bind(req.name)
    .bind(req.phone)
    .bind(req.address.map(Jsonb))
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let current_hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if !password::verify(&req.current_password, &current_hash)? {
        return Err(ApiError::InvalidInput("Current password is incorrect".into()));
    }

    let new_hash = password::hash(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(auth.id)
        .bind(&new_hash)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}
