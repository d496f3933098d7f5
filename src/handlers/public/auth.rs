use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service::UserService;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// POST /auth/register - Create an account in the Pending state.
/// An administrator activates it before first login.
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Value> {
    let users = UserService::new().await?;
    let user = users
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.display_name.as_deref(),
        )
        .await?;

    Ok(ApiResponse::created(json!({
        "user": user,
        "status": user.status,
    })))
}

/// POST /auth/login - Authenticate and receive a JWT bearer token.
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let users = UserService::new().await?;
    let user = users
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(|e| match e {
            // Bad credentials are a 401, not a validation failure
            ServiceError::Validation(msg) => ApiError::unauthorized(msg),
            other => other.into(),
        })?;

    let claims = Claims::new(user.id, user.username.clone(), user.role);
    let expires_in = claims.expires_in_secs();
    let token = auth::generate_jwt(&claims)?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "role": user.role,
        },
        "expires_in": expires_in,
    })))
}

/// POST /auth/refresh - Re-issue a token from a still-signed token.
/// The signature must verify (expiry is ignored) and the account must
/// still be Active.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> ApiResult<Value> {
    let claims = auth::decode_jwt(&payload.token, true)?;

    let users = UserService::new().await?;
    let user = users.get_active(claims.sub).await?;

    let fresh = Claims::new(user.id, user.username.clone(), user.role);
    let expires_in = fresh.expires_in_secs();
    let token = auth::generate_jwt(&fresh)?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": expires_in,
    })))
}
