use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::document::Document;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::document_service::{CreateDocument, DocumentService, UpdateDocument};

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub site_id: Option<Uuid>,
}

/// GET /api/documents?site_id=... - Metadata listing for one site.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<DocumentListQuery>,
) -> ApiResult<Page<Document>> {
    rbac::require(auth.role, Resource::Documents, Action::Read)?;

    let site_id = query
        .site_id
        .ok_or_else(|| ApiError::bad_request("site_id query parameter is required"))?;
    let params = PageParams { page: query.page, limit: query.limit };

    let service = DocumentService::new().await?;
    let page = service.list_for_site(site_id, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/documents - Register document metadata.
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateDocument>,
) -> ApiResult<Document> {
    rbac::require(auth.role, Resource::Documents, Action::Create)?;

    let service = DocumentService::new().await?;
    let document = service.create(&auth, payload).await?;
    Ok(ApiResponse::created(document))
}

/// GET /api/documents/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    rbac::require(auth.role, Resource::Documents, Action::Read)?;

    let service = DocumentService::new().await?;
    let document = service.get(id).await?;
    Ok(ApiResponse::success(document))
}

/// PUT /api/documents/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocument>,
) -> ApiResult<Document> {
    rbac::require(auth.role, Resource::Documents, Action::Update)?;

    let service = DocumentService::new().await?;
    let document = service.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(document))
}

/// DELETE /api/documents/:id - Soft delete (admin).
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Documents, Action::Delete)?;

    let service = DocumentService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
