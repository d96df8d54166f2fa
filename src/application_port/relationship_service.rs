use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Row counts contradicted the pairing or counting invariants. The
    /// surrounding transaction is always rolled back.
    #[error("inconsistent edge state: {0}")]
    Inconsistent(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for RelationError {
    fn from(e: anyhow::Error) -> Self {
        RelationError::Store(format!("{e:#}"))
    }
}

/// Per-target results of a batch, in request order.
pub type EdgeOutcomes = Vec<(UserId, EdgeOutcome)>;

/// Batch mutations run in a single transaction: either every target is
/// processed or none is. Targets that need no change report
/// [`EdgeOutcome::NoOp`] instead of failing the batch.
#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn add_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError>;
    async fn delete_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError>;
    async fn block_friends(
        &self,
        actor: UserId,
        targets: &[UserId],
    ) -> Result<EdgeOutcomes, RelationError>;
    async fn list_friends(&self, user_id: UserId) -> Result<FriendsList, RelationError>;
}
