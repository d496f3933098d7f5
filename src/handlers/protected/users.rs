use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::user::User;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource, Role};
use crate::domain::status::UserStatus;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service::UserService;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// GET /api/users - Admin listing with role and status filters.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Page<User>> {
    rbac::require(auth.role, Resource::Users, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let service = UserService::new().await?;
    let page = service.list(query.role, query.status, params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/users/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    rbac::require(auth.role, Resource::Users, Action::Read)?;

    let service = UserService::new().await?;
    let user = service.get(id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/me - Self-service profile update.
pub async fn update_me(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service
        .update_profile(
            auth.user_id,
            payload.display_name.as_deref(),
            payload.email.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/:id/status - Admin activation, suspension, and
/// deactivation, checked against the lifecycle table.
pub async fn set_status(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> ApiResult<User> {
    rbac::require(auth.role, Resource::Users, Action::Manage)?;

    let service = UserService::new().await?;
    let user = service.set_status(auth.user_id, id, payload.status).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/:id/role
pub async fn set_role(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRoleRequest>,
) -> ApiResult<User> {
    rbac::require(auth.role, Resource::Users, Action::Manage)?;

    let service = UserService::new().await?;
    let user = service.set_role(id, payload.role).await?;
    Ok(ApiResponse::success(user))
}
