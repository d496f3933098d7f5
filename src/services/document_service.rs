use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::document::Document;
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::middleware::auth::AuthUser;
use crate::services::site_service::SiteService;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateDocument {
    pub site_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub struct DocumentService {
    pool: PgPool,
}

impl DocumentService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(&self, auth: &AuthUser, input: CreateDocument) -> Result<Document, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Document title is required"));
        }
        if input.file_name.trim().is_empty() {
            return Err(ServiceError::validation("File name is required"));
        }
        if input.size_bytes.is_some_and(|s| s < 0) {
            return Err(ServiceError::validation("Size must not be negative"));
        }

        let sites = SiteService::new().await?;
        if !sites.exists_active(input.site_id).await? {
            return Err(ServiceError::not_found("Heritage site not found"));
        }

        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents
                (site_id, title, description, file_name, content_type, size_bytes, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), $7)
            RETURNING *
            "#,
        )
        .bind(input.site_id)
        .bind(input.title.trim())
        .bind(input.description.unwrap_or_default())
        .bind(input.file_name.trim())
        .bind(input.content_type)
        .bind(input.size_bytes)
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    pub async fn get(&self, id: Uuid) -> Result<Document, ServiceError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document not found"))
    }

    pub async fn list_for_site(
        &self,
        site_id: Uuid,
        params: PageParams,
    ) -> Result<Page<Document>, ServiceError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE site_id = $1 AND is_active",
        )
        .bind(site_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE site_id = $1 AND is_active
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(site_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn update(
        &self,
        auth: &AuthUser,
        id: Uuid,
        input: UpdateDocument,
    ) -> Result<Document, ServiceError> {
        let document = self.get(id).await?;

        if document.uploaded_by != auth.user_id && auth.role < Role::Admin {
            return Err(ServiceError::forbidden("Only the uploader may edit this document"));
        }

        let updated = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE documents SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Document not found"));
        }
        Ok(())
    }
}
