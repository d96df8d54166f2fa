use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RealRelationshipService {
    edge_repo: Arc<dyn EdgeRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRelationshipService {
    pub fn new(edge_repo: Arc<dyn EdgeRepo>, tx_manager: Arc<dyn TxManager>) -> Self {
        Self {
            edge_repo,
            tx_manager,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EdgeOp {
    Add,
    Delete,
    Block,
}

impl RealRelationshipService {
    async fn run_batch(
        &self,
        op: EdgeOp,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError> {
        // One timestamp per request; it doubles as the position of every edge
        // the batch creates, so a pair must not be visited twice.
        let now = Utc::now();
        let targets = dedup(targets);

        let mut tx = self.tx_manager.begin().await?;
        match self.apply(op, &mut *tx, actor, &targets, now).await {
            Ok(outcomes) => {
                tx.commit().await?;
                Ok(outcomes)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(user = %actor, "rollback after `{e}` failed: {rollback_err:#}");
                }
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        op: EdgeOp,
        tx: &mut dyn StorageTx,
        actor: UserId,
        targets: &[UserId],
        now: DateTime<Utc>,
    ) -> Result<EdgeOutcomes, RelationError> {
        let repo = self.edge_repo.as_ref();
        let mut outcomes = Vec::with_capacity(targets.len());
        for &target in targets {
            let outcome = match op {
                EdgeOp::Add => add_friend(repo, tx, actor, target, now).await?,
                EdgeOp::Delete => delete_friend(repo, tx, actor, target, now).await?,
                EdgeOp::Block => block_friend(repo, tx, actor, target, now).await?,
            };
            outcomes.push((target, outcome));
        }
        Ok(outcomes)
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn add_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError> {
        self.run_batch(EdgeOp::Add, actor, targets).await
    }

    async fn delete_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError> {
        self.run_batch(EdgeOp::Delete, actor, targets).await
    }

    async fn block_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError> {
        self.run_batch(EdgeOp::Block, actor, targets).await
    }

    async fn list_friends(&self, user_id: UserId) -> Result<FriendsList, RelationError> {
        let friends = self.edge_repo.list_friends(user_id).await.map_err(|e| {
            error!(user = %user_id, "Error retrieving friends: {e}");
            e
        })?;
        Ok(FriendsList { friends })
    }
}

fn dedup(targets: &[UserId]) -> Vec<UserId> {
    let mut seen = HashSet::with_capacity(targets.len());
    targets.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn inconsistent(user_id: UserId, friend_id: UserId, rows: u64, during: &str) -> RelationError {
    error!(
        user = %user_id,
        friend = %friend_id,
        rows_affected = rows,
        "Unexpected number of rows affected while {during}."
    );
    RelationError::Inconsistent(format!(
        "{rows} rows affected while {during} ({user_id} -> {friend_id})"
    ))
}

async fn adjust_edge_count(
    repo: &dyn EdgeRepo,
    tx: &mut dyn StorageTx,
    user_id: UserId,
    friend_id: UserId,
    delta: i32,
    now: DateTime<Utc>,
) -> Result<(), RelationError> {
    match repo.adjust_edge_count_in_tx(tx, user_id, delta, now).await? {
        1 => Ok(()),
        rows => Err(inconsistent(user_id, friend_id, rows, "updating the edge count")),
    }
}

async fn add_friend(
    repo: &dyn EdgeRepo,
    tx: &mut dyn StorageTx,
    user_id: UserId,
    friend_id: UserId,
    now: DateTime<Utc>,
) -> Result<EdgeOutcome, RelationError> {
    // Adding someone you blocked only lifts the block.
    if repo.delete_block_in_tx(tx, user_id, friend_id).await? == 1 {
        adjust_edge_count(repo, tx, user_id, friend_id, -1, now).await?;
        info!(user = %user_id, friend = %friend_id, "Unblocked user.");
        return Ok(EdgeOutcome::Unblocked);
    }

    match repo.accept_invite_in_tx(tx, user_id, friend_id, now).await? {
        0 => {}
        2 => {
            info!(user = %user_id, friend = %friend_id, "Accepting friend invitation.");
            return Ok(EdgeOutcome::Accepted);
        }
        rows => return Err(inconsistent(user_id, friend_id, rows, "accepting an invite")),
    }

    match repo.insert_invite_in_tx(tx, user_id, friend_id, now).await? {
        0 => {
            info!(
                user = %user_id,
                friend = %friend_id,
                "Did not add new friend as friend connection already exists, user is blocked or does not exist."
            );
            return Ok(EdgeOutcome::NoOp);
        }
        2 => {}
        rows => return Err(inconsistent(user_id, friend_id, rows, "inserting an invite")),
    }

    // Only rows stamped with this request's position may be counted; any
    // older edge between the pair means the relationship was already counted.
    match repo.count_new_pair_in_tx(tx, user_id, friend_id, now).await? {
        2 => {}
        rows => return Err(inconsistent(user_id, friend_id, rows, "counting a new invite")),
    }

    info!(user = %user_id, friend = %friend_id, "Added new friend invitation.");
    Ok(EdgeOutcome::Invited)
}

async fn delete_friend(
    repo: &dyn EdgeRepo,
    tx: &mut dyn StorageTx,
    user_id: UserId,
    friend_id: UserId,
    now: DateTime<Utc>,
) -> Result<EdgeOutcome, RelationError> {
    match repo.delete_pair_in_tx(tx, user_id, friend_id).await? {
        0 => {
            info!(
                user = %user_id,
                friend = %friend_id,
                "Could not delete user relationships as prior relationship did not exist."
            );
            Ok(EdgeOutcome::NoOp)
        }
        2 => {
            adjust_edge_count(repo, tx, user_id, friend_id, -1, now).await?;
            adjust_edge_count(repo, tx, friend_id, user_id, -1, now).await?;
            Ok(EdgeOutcome::Deleted)
        }
        rows => Err(inconsistent(user_id, friend_id, rows, "deleting a relationship")),
    }
}

async fn block_friend(
    repo: &dyn EdgeRepo,
    tx: &mut dyn StorageTx,
    user_id: UserId,
    friend_id: UserId,
    now: DateTime<Utc>,
) -> Result<EdgeOutcome, RelationError> {
    match repo.update_to_blocked_in_tx(tx, user_id, friend_id, now).await? {
        0 => {
            if repo.insert_block_in_tx(tx, user_id, friend_id, now).await? == 0 {
                info!(
                    user = %user_id,
                    friend = %friend_id,
                    "Could not block user as user may not exist."
                );
                return Ok(EdgeOutcome::NoOp);
            }
            adjust_edge_count(repo, tx, user_id, friend_id, 1, now).await?;
        }
        1 => {}
        rows => return Err(inconsistent(user_id, friend_id, rows, "blocking a user")),
    }

    // A block from the other side survives; mutual blocks are two edges.
    if repo.delete_unless_blocked_in_tx(tx, friend_id, user_id).await? == 1 {
        adjust_edge_count(repo, tx, friend_id, user_id, -1, now).await?;
    }

    info!(user = %user_id, friend = %friend_id, "Blocked user.");
    Ok(EdgeOutcome::Blocked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        assert_eq!(dedup(&[b, a, b, c, a]), vec![b, a, c]);
        assert!(dedup(&[]).is_empty());
    }
}
