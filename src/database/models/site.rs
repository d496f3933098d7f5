use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::status::SiteStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeritageSite {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub region: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub era: Option<String>,
    pub site_type: String,
    pub status: SiteStatus,
    pub created_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
