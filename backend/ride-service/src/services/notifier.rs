/// Writes notification records and pushes the recipients' new unread counts.
///
/// Both steps are best-effort: they run after the request's own mutation has
/// committed, so failures are logged and reported but never turned into errors.
use super::notification_store::NotificationStore;
use crate::clock::LocalClock;
use crate::models::{NewNotification, UserId};
use crate::websocket::{ConnectionRegistry, FanOutSummary, PushOutcome};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub stored: bool,
    /// `None` when nothing was stored and so nothing was pushed
    pub push: Option<PushOutcome>,
}

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    registry: ConnectionRegistry,
    clock: LocalClock,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        registry: ConnectionRegistry,
        clock: LocalClock,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    pub async fn notify(
        &self,
        route_id: Option<Uuid>,
        recipient: UserId,
        text: impl Into<String>,
    ) -> DeliveryReport {
        if !self.store_one(route_id, recipient, text.into()).await {
            return DeliveryReport {
                stored: false,
                push: None,
            };
        }

        let push = match self.registry.push_unread_count(recipient).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(user_id = recipient, error = %e, "unread count lookup failed");
                None
            }
        };
        DeliveryReport { stored: true, push }
    }

    /// Stores one notification per distinct recipient, then pushes to all of them
    pub async fn notify_many(
        &self,
        route_id: Option<Uuid>,
        recipients: &[UserId],
        text: &str,
    ) -> FanOutSummary {
        let mut seen = HashSet::new();
        let mut stored = Vec::with_capacity(recipients.len());
        let mut failed = 0;
        for &recipient in recipients {
            if !seen.insert(recipient) {
                continue;
            }
            if self.store_one(route_id, recipient, text.to_string()).await {
                stored.push(recipient);
            } else {
                failed += 1;
            }
        }

        let mut summary = self.registry.push_unread_count_to_many(stored).await;
        summary.failed += failed;
        summary
    }

    async fn store_one(&self, route_id: Option<Uuid>, recipient: UserId, text: String) -> bool {
        let notification = NewNotification {
            route_id,
            user_id: recipient,
            text,
            created: self.clock.now_minute(),
        };
        match self.store.insert(&notification).await {
            Ok(id) => {
                tracing::debug!(user_id = recipient, notification_id = id, "notification stored");
                true
            }
            Err(e) => {
                tracing::warn!(user_id = recipient, error = %e, "failed to store notification");
                false
            }
        }
    }
}
