use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::models::artifact::Artifact;
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::middleware::auth::AuthUser;
use crate::services::site_service::SiteService;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateArtifact {
    pub site_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub artifact_type: Option<String>,
    pub era: Option<String>,
    pub material: Option<String>,
    pub discovered_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArtifact {
    pub name: Option<String>,
    pub description: Option<String>,
    pub artifact_type: Option<String>,
    pub era: Option<String>,
    pub material: Option<String>,
    pub discovered_on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtifactFilter {
    pub site_id: Option<Uuid>,
    pub artifact_type: Option<String>,
    pub search: Option<String>,
}

pub struct ArtifactService {
    pool: PgPool,
}

impl ArtifactService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(&self, auth: &AuthUser, input: CreateArtifact) -> Result<Artifact, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::validation("Artifact name is required"));
        }

        let sites = SiteService::new().await?;
        if !sites.exists_active(input.site_id).await? {
            return Err(ServiceError::not_found("Heritage site not found"));
        }

        let artifact = sqlx::query_as::<_, Artifact>(
            r#"
            INSERT INTO artifacts
                (site_id, name, description, artifact_type, era, material, discovered_on, created_by)
            VALUES ($1, $2, $3, COALESCE($4, 'object'), $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.site_id)
        .bind(input.name.trim())
        .bind(input.description.unwrap_or_default())
        .bind(input.artifact_type)
        .bind(input.era)
        .bind(input.material)
        .bind(input.discovered_on)
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(artifact)
    }

    pub async fn get(&self, id: Uuid) -> Result<Artifact, ServiceError> {
        sqlx::query_as::<_, Artifact>("SELECT * FROM artifacts WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Artifact not found"))
    }

    pub async fn list(
        &self,
        filter: ArtifactFilter,
        params: PageParams,
    ) -> Result<Page<Artifact>, ServiceError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM artifacts WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM artifacts WHERE is_active");

        for builder in [&mut count, &mut query] {
            if let Some(site_id) = filter.site_id {
                builder.push(" AND site_id = ").push_bind(site_id);
            }
            if let Some(artifact_type) = &filter.artifact_type {
                builder.push(" AND artifact_type = ").push_bind(artifact_type.clone());
            }
            if let Some(search) = &filter.search {
                builder
                    .push(" AND name ILIKE ")
                    .push_bind(format!("%{}%", crate::services::escape_like(search)));
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<Artifact>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn update(
        &self,
        auth: &AuthUser,
        id: Uuid,
        input: UpdateArtifact,
    ) -> Result<Artifact, ServiceError> {
        let artifact = self.get(id).await?;

        if artifact.created_by != auth.user_id && auth.role < Role::Admin {
            return Err(ServiceError::forbidden("Only the artifact owner may edit it"));
        }

        let updated = sqlx::query_as::<_, Artifact>(
            r#"
            UPDATE artifacts
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                artifact_type = COALESCE($4, artifact_type),
                era = COALESCE($5, era),
                material = COALESCE($6, material),
                discovered_on = COALESCE($7, discovered_on),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.artifact_type)
        .bind(input.era)
        .bind(input.material)
        .bind(input.discovered_on)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE artifacts SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Artifact not found"));
        }
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> Result<Artifact, ServiceError> {
        sqlx::query_as::<_, Artifact>(
            r#"
            UPDATE artifacts SET is_active = TRUE, updated_at = now()
            WHERE id = $1 AND NOT is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("No deleted artifact with that id"))
    }
}
