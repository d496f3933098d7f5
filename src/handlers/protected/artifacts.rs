use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::artifact::Artifact;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::artifact_service::{
    ArtifactFilter, ArtifactService, CreateArtifact, UpdateArtifact,
};

#[derive(Debug, Deserialize)]
pub struct ArtifactListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub site_id: Option<Uuid>,
    pub artifact_type: Option<String>,
    pub search: Option<String>,
}

/// GET /api/artifacts
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ArtifactListQuery>,
) -> ApiResult<Page<Artifact>> {
    rbac::require(auth.role, Resource::Artifacts, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let filter = ArtifactFilter {
        site_id: query.site_id,
        artifact_type: query.artifact_type,
        search: query.search,
    };

    let service = ArtifactService::new().await?;
    let page = service.list(filter, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/artifacts
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateArtifact>,
) -> ApiResult<Artifact> {
    rbac::require(auth.role, Resource::Artifacts, Action::Create)?;

    let service = ArtifactService::new().await?;
    let artifact = service.create(&auth, payload).await?;
    Ok(ApiResponse::created(artifact))
}

/// GET /api/artifacts/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Artifact> {
    rbac::require(auth.role, Resource::Artifacts, Action::Read)?;

    let service = ArtifactService::new().await?;
    let artifact = service.get(id).await?;
    Ok(ApiResponse::success(artifact))
}

/// PUT /api/artifacts/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateArtifact>,
) -> ApiResult<Artifact> {
    rbac::require(auth.role, Resource::Artifacts, Action::Update)?;

    let service = ArtifactService::new().await?;
    let artifact = service.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(artifact))
}

/// DELETE /api/artifacts/:id - Soft delete (admin).
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Artifacts, Action::Delete)?;

    let service = ArtifactService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/artifacts/:id/restore
pub async fn restore(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Artifact> {
    rbac::require(auth.role, Resource::Artifacts, Action::Restore)?;

    let service = ArtifactService::new().await?;
    let artifact = service.restore(id).await?;
    Ok(ApiResponse::success(artifact))
}
