pub mod artifact_service;
pub mod document_service;
pub mod forum_service;
pub mod notification_service;
pub mod quiz_service;
pub mod site_service;
pub mod translation_service;
pub mod user_service;

use thiserror::Error;

use crate::database::DatabaseError;

/// Shared error type for the domain services. Converted to `ApiError`
/// (and therefore an HTTP status) at the handler boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Escape LIKE/ILIKE metacharacters so a search term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(escape_like("bronze age"), "bronze age");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("iron_age"), "iron\\_age");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
