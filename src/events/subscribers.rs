use async_trait::async_trait;
use tracing::{info, warn};

use crate::config;
use crate::events::{DomainEvent, Subscriber};
use crate::services::notification_service::NotificationService;

/// Turns review/moderation/account events into user notifications.
pub struct NotificationWriter;

#[async_trait]
impl Subscriber for NotificationWriter {
    fn name(&self) -> &'static str {
        "notification-writer"
    }

    async fn handle(&self, event: &DomainEvent) {
        let service = match NotificationService::new().await {
            Ok(service) => service,
            Err(e) => {
                warn!("notification writer unavailable: {}", e);
                return;
            }
        };

        let outcome = match event {
            DomainEvent::SiteReviewed { site_id, site_name, owner_id, status, .. } => {
                let message =
                    format!("Your heritage site '{}' is now {}", site_name, status);
                service
                    .create(*owner_id, "site_reviewed", &message, Some("site"), Some(*site_id))
                    .await
            }
            DomainEvent::PostModerated { post_id, author_id, status, reason, .. } => {
                let message = match reason {
                    Some(reason) => {
                        format!("Your forum post was marked {}: {}", status, reason)
                    }
                    None => format!("Your forum post was marked {}", status),
                };
                service
                    .create(*author_id, "post_moderated", &message, Some("post"), Some(*post_id))
                    .await
            }
            DomainEvent::UserStatusChanged { user_id, status, .. } => {
                let message = format!("Your account status changed to {}", status);
                service.create(*user_id, "account_status", &message, None, None).await
            }
        };

        if let Err(e) = outcome {
            warn!("failed to write notification: {}", e);
        }
    }
}

/// Mirrors domain events to the log when audit logging is enabled.
pub struct AuditLogger;

#[async_trait]
impl Subscriber for AuditLogger {
    fn name(&self) -> &'static str {
        "audit-logger"
    }

    async fn handle(&self, event: &DomainEvent) {
        if !config::config().security.enable_audit_logging {
            return;
        }

        match event {
            DomainEvent::SiteReviewed { site_id, status, reviewer_id, .. } => {
                info!(audit = true, %site_id, %reviewer_id, status = %status, "site reviewed");
            }
            DomainEvent::PostModerated { post_id, previous, status, moderator_id, .. } => {
                info!(
                    audit = true,
                    %post_id,
                    %moderator_id,
                    from = %previous,
                    to = %status,
                    "post moderated"
                );
            }
            DomainEvent::UserStatusChanged { user_id, previous, status, actor_id } => {
                info!(
                    audit = true,
                    %user_id,
                    %actor_id,
                    from = %previous,
                    to = %status,
                    "user status changed"
                );
            }
        }
    }
}
