use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// A live transaction. Dropping it without calling `commit` discards every
/// write made through it.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;

    /// Lets a backend's repositories recover their own transaction type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
