use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use anyhow::anyhow;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// The `users` and `user_edge` tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub(super) users: BTreeMap<UserId, User>,
    pub(super) edges: BTreeMap<(UserId, UserId), Edge>,
}

impl MemoryTables {
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    pub fn edge(&self, source: UserId, destination: UserId) -> Option<&Edge> {
        self.edges.get(&(source, destination))
    }

    pub fn edge_state(&self, source: UserId, destination: UserId) -> Option<EdgeState> {
        self.edge(source, destination).map(|e| e.state)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self, user_id: UserId) -> Option<i32> {
        self.user(user_id).map(|u| u.edge_count)
    }

    /// Edges whose source is `user_id`, counted directly from `user_edge`.
    pub fn owned_edges(&self, user_id: UserId) -> usize {
        self.edges.keys().filter(|(source, _)| *source == user_id).count()
    }

    /// Edges reference `users` on both ends, like the MySQL foreign keys.
    pub(super) fn user_exists(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub(super) fn has_edge_between(&self, a: UserId, b: UserId) -> bool {
        self.edges.contains_key(&(a, b)) || self.edges.contains_key(&(b, a))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state. Waits for the running transaction, if any.
    pub async fn snapshot(&self) -> MemoryTables {
        self.tables.lock().await.clone()
    }

    pub(super) async fn read<R>(&self, f: impl FnOnce(&MemoryTables) -> R) -> R {
        let tables = self.tables.lock().await;
        f(&tables)
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let guard = self.store.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

/// Holds the table lock for its whole life, so transactions never overlap.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryTables>,
    working: MemoryTables,
}

impl MemoryTx {
    pub(super) fn tables(&mut self) -> &mut MemoryTables {
        &mut self.working
    }
}

pub(super) fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MemoryTx> {
    tx.as_any_mut()
        .downcast_mut::<MemoryTx>()
        .ok_or_else(|| anyhow!("transaction was not opened by the memory backend"))
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
