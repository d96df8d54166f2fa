use crate::domain_port::{FriendNotification, FriendNotifier};
use tracing::info;

/// Writes friend events to the log. Stands in until a delivery channel
/// (push, in-app inbox) is wired behind [`FriendNotifier`].
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl FriendNotifier for LogNotifier {
    async fn notify(&self, notifications: Vec<FriendNotification>) {
        for notification in notifications {
            match serde_json::to_string(&notification) {
                Ok(body) => info!(receiver = %notification.receiver(), %body, "friend notification"),
                Err(e) => info!(receiver = %notification.receiver(), "friend notification: {e}"),
            }
        }
    }
}
