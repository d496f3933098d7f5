use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Localized title/body for a site, artifact, or document. Unique per
/// (resource_type, resource_id, language).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Translation {
    pub id: Uuid,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub language: String,
    pub title: String,
    pub body: String,
    pub translator_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
