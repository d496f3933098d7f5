use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::status::ModerationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumTopic {
    pub id: Uuid,
    pub site_id: Option<Uuid>,
    pub title: String,
    pub created_by: Uuid,
    pub is_locked: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumPost {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub status: ModerationStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per moderation decision, append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModerationHistory {
    pub id: Uuid,
    pub post_id: Uuid,
    pub moderator_id: Uuid,
    pub previous_status: ModerationStatus,
    pub new_status: ModerationStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
