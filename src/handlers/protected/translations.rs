use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::translation::Translation;
use crate::domain::rbac::{self, Action, Resource};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::translation_service::{
    CreateTranslation, TranslationService, UpdateTranslation,
};

#[derive(Debug, Deserialize)]
pub struct TranslationListQuery {
    pub resource_type: String,
    pub resource_id: Uuid,
}

/// GET /api/translations?resource_type=...&resource_id=... - All
/// translations of one resource, ordered by language.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TranslationListQuery>,
) -> ApiResult<Vec<Translation>> {
    rbac::require(auth.role, Resource::Translations, Action::Read)?;

    let service = TranslationService::new().await?;
    let translations = service
        .list_for_resource(&query.resource_type, query.resource_id)
        .await?;
    Ok(ApiResponse::success(translations))
}

/// POST /api/translations
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateTranslation>,
) -> ApiResult<Translation> {
    rbac::require(auth.role, Resource::Translations, Action::Create)?;

    let service = TranslationService::new().await?;
    let translation = service.create(&auth, payload).await?;
    Ok(ApiResponse::created(translation))
}

/// GET /api/translations/:id
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Translation> {
    rbac::require(auth.role, Resource::Translations, Action::Read)?;

    let service = TranslationService::new().await?;
    let translation = service.get(id).await?;
    Ok(ApiResponse::success(translation))
}

/// PUT /api/translations/:id - Translator or admin.
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTranslation>,
) -> ApiResult<Translation> {
    rbac::require(auth.role, Resource::Translations, Action::Update)?;

    let service = TranslationService::new().await?;
    let translation = service.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(translation))
}

/// DELETE /api/translations/:id - Soft delete (admin).
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Translations, Action::Delete)?;

    let service = TranslationService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
