use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::notification::Notification;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::notification_service::NotificationService;

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications - The caller's notifications, newest first.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<Page<Notification>> {
    rbac::require(auth.role, Resource::Notifications, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let service = NotificationService::new().await?;
    let page = service.list_for_user(auth.user_id, query.unread, params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    rbac::require(auth.role, Resource::Notifications, Action::Read)?;

    let service = NotificationService::new().await?;
    let count = service.unread_count(auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "unread": count })))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    rbac::require(auth.role, Resource::Notifications, Action::Update)?;

    let service = NotificationService::new().await?;
    let notification = service.mark_read(auth.user_id, id).await?;
    Ok(ApiResponse::success(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    rbac::require(auth.role, Resource::Notifications, Action::Update)?;

    let service = NotificationService::new().await?;
    let updated = service.mark_all_read(auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "marked_read": updated })))
}
