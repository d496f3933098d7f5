use serde::{Deserialize, Serialize};

/// Publication workflow for heritage sites.
///
/// Contributors draft and submit; moderators publish or reject; admins
/// archive published entries. Anything not in the transition table is a
/// conflict at the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "site_status", rename_all = "snake_case")]
pub enum SiteStatus {
    Draft,
    PendingReview,
    Published,
    Rejected,
    Archived,
}

impl SiteStatus {
    pub fn allowed_transitions(self) -> &'static [SiteStatus] {
        match self {
            SiteStatus::Draft => &[SiteStatus::PendingReview],
            SiteStatus::PendingReview => &[SiteStatus::Published, SiteStatus::Rejected],
            SiteStatus::Published => &[SiteStatus::Archived],
            SiteStatus::Rejected => &[SiteStatus::Draft],
            SiteStatus::Archived => &[SiteStatus::Published],
        }
    }

    pub fn can_transition_to(self, next: SiteStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SiteStatus::Draft => "draft",
            SiteStatus::PendingReview => "pending_review",
            SiteStatus::Published => "published",
            SiteStatus::Rejected => "rejected",
            SiteStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle. Registration lands in Pending; Deactivated is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
    Deactivated,
}

impl UserStatus {
    pub fn allowed_transitions(self) -> &'static [UserStatus] {
        match self {
            UserStatus::Pending => &[UserStatus::Active, UserStatus::Deactivated],
            UserStatus::Active => &[UserStatus::Suspended, UserStatus::Deactivated],
            UserStatus::Suspended => &[UserStatus::Active, UserStatus::Deactivated],
            UserStatus::Deactivated => &[],
        }
    }

    pub fn can_transition_to(self, next: UserStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Deactivated => "deactivated",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forum post moderation. Posts by plain members start Pending; flagged
/// content cycles back through moderator review. Removed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "moderation_status", rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Flagged,
    Removed,
}

impl ModerationStatus {
    pub fn allowed_transitions(self) -> &'static [ModerationStatus] {
        match self {
            ModerationStatus::Pending => &[ModerationStatus::Approved, ModerationStatus::Removed],
            ModerationStatus::Approved => &[ModerationStatus::Flagged],
            ModerationStatus::Flagged => &[ModerationStatus::Approved, ModerationStatus::Removed],
            ModerationStatus::Removed => &[],
        }
    }

    pub fn can_transition_to(self, next: ModerationStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Flagged => "flagged",
            ModerationStatus::Removed => "removed",
        }
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_workflow_paths() {
        assert!(SiteStatus::Draft.can_transition_to(SiteStatus::PendingReview));
        assert!(SiteStatus::PendingReview.can_transition_to(SiteStatus::Published));
        assert!(SiteStatus::PendingReview.can_transition_to(SiteStatus::Rejected));
        assert!(SiteStatus::Rejected.can_transition_to(SiteStatus::Draft));
        assert!(SiteStatus::Published.can_transition_to(SiteStatus::Archived));
        assert!(SiteStatus::Archived.can_transition_to(SiteStatus::Published));
    }

    #[test]
    fn site_workflow_never_skips_review() {
        assert!(!SiteStatus::Draft.can_transition_to(SiteStatus::Published));
        assert!(!SiteStatus::Draft.can_transition_to(SiteStatus::Archived));
        assert!(!SiteStatus::Rejected.can_transition_to(SiteStatus::Published));
        assert!(!SiteStatus::Published.can_transition_to(SiteStatus::Draft));
    }

    #[test]
    fn deactivated_is_terminal() {
        assert!(UserStatus::Pending.can_transition_to(UserStatus::Active));
        assert!(UserStatus::Active.can_transition_to(UserStatus::Suspended));
        assert!(UserStatus::Suspended.can_transition_to(UserStatus::Active));
        assert!(UserStatus::Deactivated.allowed_transitions().is_empty());
        assert!(!UserStatus::Pending.can_transition_to(UserStatus::Suspended));
    }

    #[test]
    fn removed_posts_stay_removed() {
        assert!(ModerationStatus::Pending.can_transition_to(ModerationStatus::Approved));
        assert!(ModerationStatus::Approved.can_transition_to(ModerationStatus::Flagged));
        assert!(ModerationStatus::Flagged.can_transition_to(ModerationStatus::Removed));
        assert!(ModerationStatus::Removed.allowed_transitions().is_empty());
        assert!(!ModerationStatus::Approved.can_transition_to(ModerationStatus::Removed));
    }
}
