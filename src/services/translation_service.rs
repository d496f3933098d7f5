use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::translation::Translation;
use crate::database::Database;
use crate::domain::rbac::Role;
use crate::middleware::auth::AuthUser;
use crate::services::ServiceError;

const RESOURCE_TYPES: &[&str] = &["site", "artifact", "document"];

#[derive(Debug, Deserialize)]
pub struct CreateTranslation {
    pub resource_type: String,
    pub resource_id: Uuid,
    pub language: String,
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTranslation {
    pub title: Option<String>,
    pub body: Option<String>,
}

pub struct TranslationService {
    pool: PgPool,
}

impl TranslationService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(
        &self,
        auth: &AuthUser,
        input: CreateTranslation,
    ) -> Result<Translation, ServiceError> {
        if !RESOURCE_TYPES.contains(&input.resource_type.as_str()) {
            return Err(ServiceError::validation("resource_type must be site, artifact, or document"));
        }
        let language = normalize_language(&input.language)?;
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Translated title is required"));
        }

        self.ensure_resource_exists(&input.resource_type, input.resource_id).await?;

        // The unique index turns duplicate (resource, language) pairs
        // into a 409 at the error-mapping layer
        let translation = sqlx::query_as::<_, Translation>(
            r#"
            INSERT INTO translations (resource_type, resource_id, language, title, body, translator_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.resource_type)
        .bind(input.resource_id)
        .bind(language)
        .bind(input.title.trim())
        .bind(input.body.unwrap_or_default())
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(translation)
    }

    pub async fn get(&self, id: Uuid) -> Result<Translation, ServiceError> {
        sqlx::query_as::<_, Translation>("SELECT * FROM translations WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Translation not found"))
    }

    pub async fn list_for_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Vec<Translation>, ServiceError> {
        let rows = sqlx::query_as::<_, Translation>(
            r#"
            SELECT * FROM translations
            WHERE resource_type = $1 AND resource_id = $2 AND is_active
            ORDER BY language ASC
            "#,
        )
        .bind(resource_type)
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update(
        &self,
        auth: &AuthUser,
        id: Uuid,
        input: UpdateTranslation,
    ) -> Result<Translation, ServiceError> {
        let translation = self.get(id).await?;

        if translation.translator_id != auth.user_id && auth.role < Role::Admin {
            return Err(ServiceError::forbidden("Only the translator may edit this translation"));
        }

        let updated = sqlx::query_as::<_, Translation>(
            r#"
            UPDATE translations
            SET title = COALESCE($2, title),
                body = COALESCE($3, body),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title)
        .bind(input.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE translations SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Translation not found"));
        }
        Ok(())
    }

    async fn ensure_resource_exists(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<(), ServiceError> {
        let table = match resource_type {
            "site" => "heritage_sites",
            "artifact" => "artifacts",
            "document" => "documents",
            _ => unreachable!("validated above"),
        };

        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = $1 AND is_active", table);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(resource_id)
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            return Err(ServiceError::not_found(format!("{} not found", resource_type)));
        }
        Ok(())
    }
}

/// Lowercase BCP-47 primary language tag, e.g. "fr" or "pt-br".
fn normalize_language(language: &str) -> Result<String, ServiceError> {
    let lang = language.trim().to_ascii_lowercase();
    let valid = (2..=8).contains(&lang.len())
        && lang.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        && !lang.starts_with('-')
        && !lang.ends_with('-');
    if !valid {
        return Err(ServiceError::validation("Invalid language tag"));
    }
    Ok(lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tags_normalize() {
        assert_eq!(normalize_language("FR").unwrap(), "fr");
        assert_eq!(normalize_language(" pt-BR ").unwrap(), "pt-br");
        assert!(normalize_language("x").is_err());
        assert!(normalize_language("-fr").is_err());
        assert!(normalize_language("fr_FR").is_err());
    }
}
