use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Fixed role set, ordered by privilege. Comparisons use the derived
/// ordering, so variant order matters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Member,
    Contributor,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Contributor => "contributor",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "contributor" => Ok(Role::Contributor),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Sites,
    Artifacts,
    Documents,
    ForumTopics,
    ForumPosts,
    Moderation,
    Quizzes,
    QuizAttempts,
    Translations,
    Notifications,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Restore,
    Review,
    Moderate,
    Lock,
    Publish,
    Flag,
    Manage,
}

/// Minimum role per (resource, action). Deny-by-default: a pair missing
/// from this table is never allowed, whatever the caller's role.
/// Ownership checks (edit-own-post, read-own-notifications) are enforced
/// in the services on top of this table.
const PERMISSIONS: &[(Resource, Action, Role)] = &[
    // Heritage sites
    (Resource::Sites, Action::Read, Role::Member),
    (Resource::Sites, Action::Create, Role::Contributor),
    (Resource::Sites, Action::Update, Role::Contributor),
    (Resource::Sites, Action::Review, Role::Moderator),
    (Resource::Sites, Action::Delete, Role::Admin),
    (Resource::Sites, Action::Restore, Role::Admin),
    // Artifacts
    (Resource::Artifacts, Action::Read, Role::Member),
    (Resource::Artifacts, Action::Create, Role::Contributor),
    (Resource::Artifacts, Action::Update, Role::Contributor),
    (Resource::Artifacts, Action::Delete, Role::Admin),
    (Resource::Artifacts, Action::Restore, Role::Admin),
    // Documents
    (Resource::Documents, Action::Read, Role::Member),
    (Resource::Documents, Action::Create, Role::Contributor),
    (Resource::Documents, Action::Update, Role::Contributor),
    (Resource::Documents, Action::Delete, Role::Admin),
    // Forum
    (Resource::ForumTopics, Action::Read, Role::Member),
    (Resource::ForumTopics, Action::Create, Role::Member),
    (Resource::ForumTopics, Action::Lock, Role::Moderator),
    (Resource::ForumPosts, Action::Read, Role::Member),
    (Resource::ForumPosts, Action::Create, Role::Member),
    (Resource::ForumPosts, Action::Update, Role::Member),
    (Resource::ForumPosts, Action::Delete, Role::Member),
    (Resource::ForumPosts, Action::Flag, Role::Member),
    (Resource::Moderation, Action::Read, Role::Moderator),
    (Resource::Moderation, Action::Moderate, Role::Moderator),
    // Quizzes
    (Resource::Quizzes, Action::Read, Role::Member),
    (Resource::Quizzes, Action::Create, Role::Contributor),
    (Resource::Quizzes, Action::Update, Role::Contributor),
    (Resource::Quizzes, Action::Publish, Role::Contributor),
    (Resource::Quizzes, Action::Delete, Role::Admin),
    (Resource::QuizAttempts, Action::Create, Role::Member),
    (Resource::QuizAttempts, Action::Read, Role::Member),
    // Translations
    (Resource::Translations, Action::Read, Role::Member),
    (Resource::Translations, Action::Create, Role::Contributor),
    (Resource::Translations, Action::Update, Role::Contributor),
    (Resource::Translations, Action::Delete, Role::Admin),
    // Notifications (own-only, enforced in the service)
    (Resource::Notifications, Action::Read, Role::Member),
    (Resource::Notifications, Action::Update, Role::Member),
    // User administration
    (Resource::Users, Action::Read, Role::Admin),
    (Resource::Users, Action::Manage, Role::Admin),
];

pub fn allows(role: Role, resource: Resource, action: Action) -> bool {
    PERMISSIONS
        .iter()
        .find(|(r, a, _)| *r == resource && *a == action)
        .map(|(_, _, min)| role >= *min)
        .unwrap_or(false)
}

pub fn require(role: Role, resource: Resource, action: Action) -> Result<(), ApiError> {
    if allows(role, resource, action) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "role '{}' may not perform this action",
            role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering() {
        assert!(Role::Admin > Role::Moderator);
        assert!(Role::Moderator > Role::Contributor);
        assert!(Role::Contributor > Role::Member);
    }

    #[test]
    fn members_cannot_author_sites() {
        assert!(!allows(Role::Member, Resource::Sites, Action::Create));
        assert!(allows(Role::Contributor, Resource::Sites, Action::Create));
        assert!(allows(Role::Admin, Resource::Sites, Action::Create));
    }

    #[test]
    fn review_requires_moderator() {
        assert!(!allows(Role::Contributor, Resource::Sites, Action::Review));
        assert!(allows(Role::Moderator, Resource::Sites, Action::Review));
        assert!(!allows(Role::Contributor, Resource::Moderation, Action::Moderate));
    }

    #[test]
    fn unlisted_pairs_are_denied() {
        // No role, however privileged, gets an action the table omits
        assert!(!allows(Role::Admin, Resource::Notifications, Action::Delete));
        assert!(!allows(Role::Admin, Resource::Moderation, Action::Create));
    }

    #[test]
    fn user_admin_is_admin_only() {
        assert!(!allows(Role::Moderator, Resource::Users, Action::Manage));
        assert!(allows(Role::Admin, Resource::Users, Action::Manage));
    }
}
