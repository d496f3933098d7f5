use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::forum::{ForumPost, ForumTopic, ModerationHistory};
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::forum_service::{CreatePost, CreateTopic, ForumService, ModeratePost};

#[derive(Debug, Deserialize)]
pub struct TopicListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub site_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub body: String,
}

// ---- topics ----

/// GET /api/forum/topics
pub async fn list_topics(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TopicListQuery>,
) -> ApiResult<Page<ForumTopic>> {
    rbac::require(auth.role, Resource::ForumTopics, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let service = ForumService::new().await?;
    let page = service.list_topics(query.site_id, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/forum/topics
pub async fn create_topic(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateTopic>,
) -> ApiResult<ForumTopic> {
    rbac::require(auth.role, Resource::ForumTopics, Action::Create)?;

    let service = ForumService::new().await?;
    let topic = service.create_topic(&auth, payload).await?;
    Ok(ApiResponse::created(topic))
}

/// GET /api/forum/topics/:id
pub async fn get_topic(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ForumTopic> {
    rbac::require(auth.role, Resource::ForumTopics, Action::Read)?;

    let service = ForumService::new().await?;
    let topic = service.get_topic(id).await?;
    Ok(ApiResponse::success(topic))
}

/// POST /api/forum/topics/:id/lock
pub async fn lock_topic(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ForumTopic> {
    rbac::require(auth.role, Resource::ForumTopics, Action::Lock)?;

    let service = ForumService::new().await?;
    let topic = service.set_topic_locked(id, true).await?;
    Ok(ApiResponse::success(topic))
}

/// POST /api/forum/topics/:id/unlock
pub async fn unlock_topic(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ForumTopic> {
    rbac::require(auth.role, Resource::ForumTopics, Action::Lock)?;

    let service = ForumService::new().await?;
    let topic = service.set_topic_locked(id, false).await?;
    Ok(ApiResponse::success(topic))
}

// ---- posts ----

/// GET /api/forum/topics/:id/posts - Visible posts of a topic.
pub async fn list_posts(
    Extension(auth): Extension<AuthUser>,
    Path(topic_id): Path<Uuid>,
    Query(query): Query<PostListQuery>,
) -> ApiResult<Page<ForumPost>> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let service = ForumService::new().await?;
    let page = service.list_posts(&auth, topic_id, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/forum/topics/:id/posts
pub async fn create_post(
    Extension(auth): Extension<AuthUser>,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<CreatePost>,
) -> ApiResult<ForumPost> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Create)?;

    let service = ForumService::new().await?;
    let post = service.create_post(&auth, topic_id, payload).await?;
    Ok(ApiResponse::created(post))
}

/// GET /api/forum/posts/:id
pub async fn get_post(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ForumPost> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Read)?;

    let service = ForumService::new().await?;
    let post = service.get_post(&auth, id).await?;
    Ok(ApiResponse::success(post))
}

/// PUT /api/forum/posts/:id - Author edit.
pub async fn update_post(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<ForumPost> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Update)?;

    let service = ForumService::new().await?;
    let post = service.update_post(&auth, id, &payload.body).await?;
    Ok(ApiResponse::success(post))
}

/// POST /api/forum/posts/:id/flag - Queue an approved post for review.
pub async fn flag_post(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ForumPost> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Flag)?;

    let service = ForumService::new().await?;
    let post = service.flag_post(&auth, id).await?;
    Ok(ApiResponse::success(post))
}

/// POST /api/forum/posts/:id/moderate - Moderator decision; records
/// history and notifies the author.
pub async fn moderate_post(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModeratePost>,
) -> ApiResult<ForumPost> {
    rbac::require(auth.role, Resource::Moderation, Action::Moderate)?;

    let service = ForumService::new().await?;
    let post = service.moderate_post(&auth, id, payload).await?;
    Ok(ApiResponse::success(post))
}

/// GET /api/forum/posts/:id/history - Moderation trail (moderators).
pub async fn post_history(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ModerationHistory>> {
    rbac::require(auth.role, Resource::Moderation, Action::Read)?;

    let service = ForumService::new().await?;
    let history = service.post_history(id).await?;
    Ok(ApiResponse::success(history))
}

/// DELETE /api/forum/posts/:id - Author or moderator, soft.
pub async fn delete_post(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::ForumPosts, Action::Delete)?;

    let service = ForumService::new().await?;
    service.delete_post(&auth, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
