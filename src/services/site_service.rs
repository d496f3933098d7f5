use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::models::site::HeritageSite;
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::domain::status::SiteStatus;
use crate::events::{self, DomainEvent};
use crate::middleware::auth::AuthUser;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateSite {
    pub name: String,
    pub description: Option<String>,
    pub region: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub era: Option<String>,
    pub site_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub description: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub era: Option<String>,
    pub site_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteFilter {
    pub status: Option<SiteStatus>,
    pub region: Option<String>,
    pub search: Option<String>,
}

pub struct SiteService {
    pool: PgPool,
}

impl SiteService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(&self, auth: &AuthUser, input: CreateSite) -> Result<HeritageSite, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::validation("Site name is required"));
        }
        if input.region.trim().is_empty() {
            return Err(ServiceError::validation("Region is required"));
        }
        validate_coordinates(input.latitude, input.longitude)?;

        let site = sqlx::query_as::<_, HeritageSite>(
            r#"
            INSERT INTO heritage_sites
                (name, description, region, address, latitude, longitude, era, site_type, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'monument'), $9)
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(input.description.unwrap_or_default())
        .bind(input.region.trim())
        .bind(input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.era)
        .bind(input.site_type)
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(site)
    }

    /// Published sites are visible to everyone; drafts and review queue
    /// entries only to their owner and to moderators.
    pub async fn get(&self, auth: &AuthUser, id: Uuid) -> Result<HeritageSite, ServiceError> {
        let site = sqlx::query_as::<_, HeritageSite>(
            "SELECT * FROM heritage_sites WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Heritage site not found"))?;

        if !Self::can_view(auth, &site) {
            return Err(ServiceError::not_found("Heritage site not found"));
        }

        Ok(site)
    }

    pub async fn list(
        &self,
        auth: &AuthUser,
        filter: SiteFilter,
        params: PageParams,
    ) -> Result<Page<HeritageSite>, ServiceError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM heritage_sites WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM heritage_sites WHERE is_active");

        for builder in [&mut count, &mut query] {
            if let Some(status) = filter.status {
                builder.push(" AND status = ").push_bind(status);
            }
            if let Some(region) = &filter.region {
                builder.push(" AND region = ").push_bind(region.clone());
            }
            if let Some(search) = &filter.search {
                builder
                    .push(" AND name ILIKE ")
                    .push_bind(format!("%{}%", crate::services::escape_like(search)));
            }
            if auth.role < Role::Moderator {
                builder
                    .push(" AND (status = 'published' OR created_by = ")
                    .push_bind(auth.user_id)
                    .push(")");
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<HeritageSite>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    /// Field edits are limited to Draft and Rejected states; everything
    /// after submission goes through the status workflow.
    pub async fn update(
        &self,
        auth: &AuthUser,
        id: Uuid,
        input: UpdateSite,
    ) -> Result<HeritageSite, ServiceError> {
        let site = self.get(auth, id).await?;

        if site.created_by != auth.user_id && auth.role < Role::Admin {
            return Err(ServiceError::forbidden("Only the site owner may edit it"));
        }
        if !matches!(site.status, SiteStatus::Draft | SiteStatus::Rejected) {
            return Err(ServiceError::conflict(format!(
                "sites cannot be edited while {}",
                site.status
            )));
        }
        validate_coordinates(input.latitude, input.longitude)?;

        let updated = sqlx::query_as::<_, HeritageSite>(
            r#"
            UPDATE heritage_sites
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                region = COALESCE($4, region),
                address = COALESCE($5, address),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                era = COALESCE($8, era),
                site_type = COALESCE($9, site_type),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.region)
        .bind(input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.era)
        .bind(input.site_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Drive the status workflow. The transition table decides legality;
    /// who may perform it depends on the target state.
    pub async fn transition(
        &self,
        auth: &AuthUser,
        id: Uuid,
        next: SiteStatus,
    ) -> Result<HeritageSite, ServiceError> {
        let site = self.get(auth, id).await?;

        if !site.status.can_transition_to(next) {
            return Err(ServiceError::conflict(format!(
                "cannot move site from {} to {}",
                site.status, next
            )));
        }

        let is_owner = site.created_by == auth.user_id;
        let allowed = match next {
            // Submit and withdraw-to-draft belong to the owner
            SiteStatus::PendingReview | SiteStatus::Draft => is_owner || auth.role >= Role::Admin,
            // Review decisions and re-publishing archives are moderator work
            SiteStatus::Published | SiteStatus::Rejected => auth.role >= Role::Moderator,
            SiteStatus::Archived => auth.role >= Role::Admin,
        };
        if !allowed {
            return Err(ServiceError::forbidden(format!(
                "not permitted to move this site to {}",
                next
            )));
        }

        let is_review_decision = matches!(next, SiteStatus::Published | SiteStatus::Rejected);
        let reviewed_by = if is_review_decision { Some(auth.user_id) } else { site.reviewed_by };

        let updated = sqlx::query_as::<_, HeritageSite>(
            r#"
            UPDATE heritage_sites
            SET status = $2, reviewed_by = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(reviewed_by)
        .fetch_one(&self.pool)
        .await?;

        if is_review_decision {
            events::emit(DomainEvent::SiteReviewed {
                site_id: updated.id,
                site_name: updated.name.clone(),
                owner_id: updated.created_by,
                status: next,
                reviewer_id: auth.user_id,
            })
            .await;
        }

        Ok(updated)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE heritage_sites SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Heritage site not found"));
        }
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> Result<HeritageSite, ServiceError> {
        sqlx::query_as::<_, HeritageSite>(
            r#"
            UPDATE heritage_sites SET is_active = TRUE, updated_at = now()
            WHERE id = $1 AND NOT is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("No deleted site with that id"))
    }

    /// Used by other services to confirm a referenced site exists.
    pub async fn exists_active(&self, id: Uuid) -> Result<bool, ServiceError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM heritage_sites WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    fn can_view(auth: &AuthUser, site: &HeritageSite) -> bool {
        site.status == SiteStatus::Published
            || site.created_by == auth.user_id
            || auth.role >= Role::Moderator
    }
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), ServiceError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ServiceError::validation("Latitude must be between -90 and 90"));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ServiceError::validation("Longitude must be between -180 and 180"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_bounds() {
        assert!(validate_coordinates(Some(45.0), Some(12.5)).is_ok());
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(91.0), None).is_err());
        assert!(validate_coordinates(None, Some(-181.0)).is_err());
    }
}
