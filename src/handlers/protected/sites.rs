use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::site::HeritageSite;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::domain::status::SiteStatus;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::site_service::{CreateSite, SiteFilter, SiteService, UpdateSite};

#[derive(Debug, Deserialize)]
pub struct SiteListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<SiteStatus>,
    pub region: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: SiteStatus,
}

/// GET /api/sites - Paged listing. Non-moderators see published sites
/// plus their own drafts.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SiteListQuery>,
) -> ApiResult<Page<HeritageSite>> {
    rbac::require(auth.role, Resource::Sites, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let filter = SiteFilter {
        status: query.status,
        region: query.region,
        search: query.search,
    };

    let service = SiteService::new().await?;
    let page = service.list(&auth, filter, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/sites - Create a draft site.
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateSite>,
) -> ApiResult<HeritageSite> {
    rbac::require(auth.role, Resource::Sites, Action::Create)?;

    let service = SiteService::new().await?;
    let site = service.create(&auth, payload).await?;
    Ok(ApiResponse::created(site))
}

/// GET /api/sites/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<HeritageSite> {
    rbac::require(auth.role, Resource::Sites, Action::Read)?;

    let service = SiteService::new().await?;
    let site = service.get(&auth, id).await?;
    Ok(ApiResponse::success(site))
}

/// PUT /api/sites/:id - Owner edits, Draft/Rejected only.
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSite>,
) -> ApiResult<HeritageSite> {
    rbac::require(auth.role, Resource::Sites, Action::Update)?;

    let service = SiteService::new().await?;
    let site = service.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(site))
}

/// POST /api/sites/:id/status - Drive the review workflow. Legality
/// comes from the transition table; who may perform each step is
/// decided per target state in the service.
pub async fn transition(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> ApiResult<HeritageSite> {
    rbac::require(auth.role, Resource::Sites, Action::Update)?;

    let service = SiteService::new().await?;
    let site = service.transition(&auth, id, payload.status).await?;
    Ok(ApiResponse::success(site))
}

/// DELETE /api/sites/:id - Soft delete (admin).
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Sites, Action::Delete)?;

    let service = SiteService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/sites/:id/restore - Undo a soft delete (admin).
pub async fn restore(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<HeritageSite> {
    rbac::require(auth.role, Resource::Sites, Action::Restore)?;

    let service = SiteService::new().await?;
    let site = service.restore(id).await?;
    Ok(ApiResponse::success(site))
}
