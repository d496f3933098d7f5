pub mod subscribers;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::domain::status::{ModerationStatus, SiteStatus, UserStatus};

/// Domain events that fan out to subscribers (notifications, audit log).
#[derive(Debug, Clone)]
pub enum DomainEvent {
    SiteReviewed {
        site_id: Uuid,
        site_name: String,
        owner_id: Uuid,
        status: SiteStatus,
        reviewer_id: Uuid,
    },
    PostModerated {
        post_id: Uuid,
        author_id: Uuid,
        previous: ModerationStatus,
        status: ModerationStatus,
        moderator_id: Uuid,
        reason: Option<String>,
    },
    UserStatusChanged {
        user_id: Uuid,
        previous: UserStatus,
        status: UserStatus,
        actor_id: Uuid,
    },
}

#[async_trait]
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent);
}

pub struct Dispatcher {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();

/// Install the subscriber set. Later calls are ignored; the first wiring
/// at startup wins.
pub fn install(subscribers: Vec<Arc<dyn Subscriber>>) {
    let _ = DISPATCHER.set(Dispatcher { subscribers });
}

/// Install the default production subscribers.
pub fn install_defaults() {
    install(vec![
        Arc::new(subscribers::NotificationWriter),
        Arc::new(subscribers::AuditLogger),
    ]);
}

/// Fan an event out to every subscriber. Subscriber failures are their
/// own problem to log; emit never fails the calling request.
pub async fn emit(event: DomainEvent) {
    if let Some(dispatcher) = DISPATCHER.get() {
        join_all(dispatcher.subscribers.iter().map(|s| s.handle(&event))).await;
    }
}
