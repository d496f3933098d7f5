use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::auth;
use crate::database::models::user::User;
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::domain::status::UserStatus;
use crate::events::{self, DomainEvent};
use crate::services::ServiceError;

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    /// Register a new account. Lands in Pending with the Member role; an
    /// admin activates it through the status endpoint.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User, ServiceError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let salt = auth::new_salt();
        let digest = auth::hash_password(password, &salt);

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_digest, password_salt, display_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(digest)
        .bind(salt)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify credentials and record the login. Only Active accounts may
    /// log in; the error distinguishes bad credentials (401 upstream)
    /// from inactive accounts (403).
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND is_active",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::validation("Invalid username or password"))?;

        if !auth::verify_password(password, &user.password_salt, &user.password_digest) {
            return Err(ServiceError::validation("Invalid username or password"));
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Pending => {
                return Err(ServiceError::forbidden("Account is awaiting activation"))
            }
            UserStatus::Suspended => return Err(ServiceError::forbidden("Account is suspended")),
            UserStatus::Deactivated => {
                return Err(ServiceError::forbidden("Account is deactivated"))
            }
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET last_login_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Fetch for token refresh: the account must still be Active.
    pub async fn get_active(&self, id: Uuid) -> Result<User, ServiceError> {
        let user = self.get(id).await?;
        if user.status != UserStatus::Active {
            return Err(ServiceError::forbidden("Account is not active"));
        }
        Ok(user)
    }

    pub async fn list(
        &self,
        role: Option<Role>,
        status: Option<UserStatus>,
        params: PageParams,
    ) -> Result<Page<User>, ServiceError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE is_active");
        for builder in [&mut count, &mut query] {
            if let Some(role) = role {
                builder.push(" AND role = ").push_bind(role);
            }
            if let Some(status) = status {
                builder.push(" AND status = ").push_bind(status);
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, ServiceError> {
        if let Some(email) = email {
            validate_email(email)?;
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                email = COALESCE($3, email),
                updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

        Ok(user)
    }

    /// Admin status change, checked against the transition table.
    pub async fn set_status(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        next: UserStatus,
    ) -> Result<User, ServiceError> {
        let user = self.get(user_id).await?;

        if !user.status.can_transition_to(next) {
            return Err(ServiceError::conflict(format!(
                "cannot move user from {} to {}",
                user.status, next
            )));
        }

        let previous = user.status;
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(next)
        .fetch_one(&self.pool)
        .await?;

        events::emit(DomainEvent::UserStatusChanged {
            user_id,
            previous,
            status: next,
            actor_id,
        })
        .await;

        Ok(updated)
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<User, ServiceError> {
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 AND is_active RETURNING *",
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

        Ok(updated)
    }

    /// CLI bootstrap: create an already-Active admin account.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let salt = auth::new_salt();
        let digest = auth::hash_password(password, &salt);

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_digest, password_salt, role, status)
            VALUES ($1, $2, $3, $4, 'admin', 'active')
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(digest)
        .bind(salt)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.len() < 3 || username.len() > 40 {
        return Err(ServiceError::validation("Username must be 3-40 characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ServiceError::validation(
            "Username can only contain letters, numbers, hyphens, and underscores",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    // Deliverability is the mail server's problem; this catches typos
    let valid = email.len() <= 254
        && email.split_once('@').map_or(false, |(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if !valid {
        return Err(ServiceError::validation("Invalid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < 8 {
        return Err(ServiceError::validation("Password must be at least 8 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice-w_2").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("alice!").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@nodot").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }
}
