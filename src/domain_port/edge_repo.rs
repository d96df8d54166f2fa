use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

/// Row-level primitives over `user_edge` and `users.edge_count`.
///
/// Every mutating primitive returns the number of rows it affected. The
/// relationship engine decides what happened from those counts alone, so
/// implementations must report them exactly.
#[async_trait::async_trait]
pub trait EdgeRepo: Send + Sync {
    /// Deletes `source -> destination` only if it is `Blocked`.
    async fn delete_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError>;

    /// Sets `Accepted` on `inviter -> invitee` where it is `OutgoingRequest`
    /// and on `invitee -> inviter` where it is `Invited`.
    async fn accept_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        invitee: UserId,
        inviter: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    /// Inserts `actor -> target` as `OutgoingRequest` and `target -> actor`
    /// as `Invited`, both positioned at `now`. Inserts nothing when the target
    /// does not exist or when any edge between the two already exists.
    async fn insert_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    /// Adds one to `edge_count` of both users unless an edge between them
    /// carries a position other than `now`.
    async fn count_new_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    async fn adjust_edge_count_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    /// Deletes both directed edges between `a` and `b`, whatever their state.
    async fn delete_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<u64, RelationError>;

    async fn update_to_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    /// Inserts a `Blocked` edge if the destination exists and no
    /// `source -> destination` edge is present.
    async fn insert_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError>;

    /// Deletes `source -> destination` unless it is `Blocked`.
    async fn delete_unless_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError>;

    /// Every edge owned by `user_id`, joined with the destination's profile,
    /// ordered by position.
    async fn list_friends(&self, user_id: UserId) -> Result<Vec<Friend>, RelationError>;
}
