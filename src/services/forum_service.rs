use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::models::forum::{ForumPost, ForumTopic, ModerationHistory};
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::domain::status::ModerationStatus;
use crate::events::{self, DomainEvent};
use crate::middleware::auth::AuthUser;
use crate::services::site_service::SiteService;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateTopic {
    pub title: String,
    pub site_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeratePost {
    pub status: ModerationStatus,
    pub reason: Option<String>,
}

pub struct ForumService {
    pool: PgPool,
}

impl ForumService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    // ---- topics ----

    pub async fn create_topic(&self, auth: &AuthUser, input: CreateTopic) -> Result<ForumTopic, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Topic title is required"));
        }

        if let Some(site_id) = input.site_id {
            let sites = SiteService::new().await?;
            if !sites.exists_active(site_id).await? {
                return Err(ServiceError::not_found("Heritage site not found"));
            }
        }

        let topic = sqlx::query_as::<_, ForumTopic>(
            r#"
            INSERT INTO forum_topics (site_id, title, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(input.site_id)
        .bind(input.title.trim())
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }

    pub async fn get_topic(&self, id: Uuid) -> Result<ForumTopic, ServiceError> {
        sqlx::query_as::<_, ForumTopic>("SELECT * FROM forum_topics WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Topic not found"))
    }

    pub async fn list_topics(
        &self,
        site_id: Option<Uuid>,
        params: PageParams,
    ) -> Result<Page<ForumTopic>, ServiceError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM forum_topics WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM forum_topics WHERE is_active");

        for builder in [&mut count, &mut query] {
            if let Some(site_id) = site_id {
                builder.push(" AND site_id = ").push_bind(site_id);
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY updated_at DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<ForumTopic>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn set_topic_locked(&self, id: Uuid, locked: bool) -> Result<ForumTopic, ServiceError> {
        sqlx::query_as::<_, ForumTopic>(
            r#"
            UPDATE forum_topics SET is_locked = $2, updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(locked)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Topic not found"))
    }

    // ---- posts ----

    /// Posts by plain members enter the moderation queue; established
    /// contributors post straight to Approved.
    pub async fn create_post(
        &self,
        auth: &AuthUser,
        topic_id: Uuid,
        input: CreatePost,
    ) -> Result<ForumPost, ServiceError> {
        if input.body.trim().is_empty() {
            return Err(ServiceError::validation("Post body is required"));
        }

        let topic = self.get_topic(topic_id).await?;
        if topic.is_locked {
            return Err(ServiceError::conflict("Topic is locked"));
        }

        let initial = if auth.role >= Role::Contributor {
            ModerationStatus::Approved
        } else {
            ModerationStatus::Pending
        };

        let post = sqlx::query_as::<_, ForumPost>(
            r#"
            INSERT INTO forum_posts (topic_id, author_id, body, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(topic_id)
        .bind(auth.user_id)
        .bind(input.body.trim())
        .bind(initial)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn get_post(&self, auth: &AuthUser, id: Uuid) -> Result<ForumPost, ServiceError> {
        let post = sqlx::query_as::<_, ForumPost>(
            "SELECT * FROM forum_posts WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Post not found"))?;

        if !Self::can_view_post(auth, &post) {
            return Err(ServiceError::not_found("Post not found"));
        }
        Ok(post)
    }

    /// Visible posts of a topic: everything for moderators, otherwise
    /// Approved plus the caller's own non-Removed posts.
    pub async fn list_posts(
        &self,
        auth: &AuthUser,
        topic_id: Uuid,
        params: PageParams,
    ) -> Result<Page<ForumPost>, ServiceError> {
        self.get_topic(topic_id).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM forum_posts WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM forum_posts WHERE is_active");

        for builder in [&mut count, &mut query] {
            builder.push(" AND topic_id = ").push_bind(topic_id);
            if auth.role < Role::Moderator {
                builder
                    .push(" AND (status = 'approved' OR (author_id = ")
                    .push_bind(auth.user_id)
                    .push(" AND status <> 'removed'))");
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at ASC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<ForumPost>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn update_post(
        &self,
        auth: &AuthUser,
        id: Uuid,
        body: &str,
    ) -> Result<ForumPost, ServiceError> {
        if body.trim().is_empty() {
            return Err(ServiceError::validation("Post body is required"));
        }

        let post = self.get_post(auth, id).await?;
        if post.author_id != auth.user_id {
            return Err(ServiceError::forbidden("Only the author may edit a post"));
        }
        if post.status == ModerationStatus::Removed {
            return Err(ServiceError::conflict("Removed posts cannot be edited"));
        }

        let updated = sqlx::query_as::<_, ForumPost>(
            "UPDATE forum_posts SET body = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(body.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Member-facing flagging: Approved -> Flagged, queued for review.
    pub async fn flag_post(&self, auth: &AuthUser, id: Uuid) -> Result<ForumPost, ServiceError> {
        let post = self.get_post(auth, id).await?;

        if !post.status.can_transition_to(ModerationStatus::Flagged) {
            return Err(ServiceError::conflict(format!(
                "a {} post cannot be flagged",
                post.status
            )));
        }

        let updated = sqlx::query_as::<_, ForumPost>(
            "UPDATE forum_posts SET status = 'flagged', updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Moderator decision. The status update and history row commit
    /// together; the author notification rides the event dispatcher.
    pub async fn moderate_post(
        &self,
        auth: &AuthUser,
        id: Uuid,
        input: ModeratePost,
    ) -> Result<ForumPost, ServiceError> {
        let post = self.get_post(auth, id).await?;

        if !post.status.can_transition_to(input.status) {
            return Err(ServiceError::conflict(format!(
                "cannot move post from {} to {}",
                post.status, input.status
            )));
        }

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, ForumPost>(
            "UPDATE forum_posts SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.status)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO moderation_history (post_id, moderator_id, previous_status, new_status, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(auth.user_id)
        .bind(post.status)
        .bind(input.status)
        .bind(input.reason.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        events::emit(DomainEvent::PostModerated {
            post_id: id,
            author_id: post.author_id,
            previous: post.status,
            status: input.status,
            moderator_id: auth.user_id,
            reason: input.reason,
        })
        .await;

        Ok(updated)
    }

    pub async fn post_history(&self, post_id: Uuid) -> Result<Vec<ModerationHistory>, ServiceError> {
        let rows = sqlx::query_as::<_, ModerationHistory>(
            "SELECT * FROM moderation_history WHERE post_id = $1 ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_post(&self, auth: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        let post = self.get_post(auth, id).await?;

        if post.author_id != auth.user_id && auth.role < Role::Moderator {
            return Err(ServiceError::forbidden("Only the author or a moderator may delete a post"));
        }

        sqlx::query("UPDATE forum_posts SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn can_view_post(auth: &AuthUser, post: &ForumPost) -> bool {
        if auth.role >= Role::Moderator {
            return true;
        }
        match post.status {
            ModerationStatus::Approved => true,
            ModerationStatus::Removed => false,
            _ => post.author_id == auth.user_id,
        }
    }
}
