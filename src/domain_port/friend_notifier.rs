use crate::domain_model::UserId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FriendNotification {
    /// `to` received a friend request from `from`.
    InviteReceived { from: UserId, to: UserId },
    /// `to`'s pending request was accepted by `by`.
    InviteAccepted { by: UserId, to: UserId },
}

impl FriendNotification {
    pub fn receiver(&self) -> UserId {
        match self {
            FriendNotification::InviteReceived { to, .. } => *to,
            FriendNotification::InviteAccepted { to, .. } => *to,
        }
    }
}

/// Post-commit delivery of friend events. Delivery is best effort and never
/// fails the request that produced the events.
#[async_trait::async_trait]
pub trait FriendNotifier: Send + Sync {
    async fn notify(&self, notifications: Vec<FriendNotification>);
}
