use super::store::{MemoryStore, MemoryTables, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryEdgeRepo {
    store: MemoryStore,
}

impl MemoryEdgeRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryEdgeRepo { store }
    }
}

fn tables(tx: &mut dyn StorageTx) -> Result<&mut MemoryTables, RelationError> {
    Ok(downcast(tx)?.tables())
}

/// Deletes `(source, destination)` when `predicate` holds for it.
fn delete_where(
    t: &mut MemoryTables,
    source: UserId,
    destination: UserId,
    predicate: impl Fn(&Edge) -> bool,
) -> u64 {
    let key = (source, destination);
    match t.edges.get(&key) {
        Some(edge) if predicate(edge) => {
            t.edges.remove(&key);
            1
        }
        _ => 0,
    }
}

fn set_state_where(
    t: &mut MemoryTables,
    source: UserId,
    destination: UserId,
    from: Option<EdgeState>,
    to: EdgeState,
    now: DateTime<Utc>,
) -> u64 {
    match t.edges.get_mut(&(source, destination)) {
        Some(edge) if from.is_none_or(|s| s == edge.state) => {
            edge.state = to;
            edge.update_time = now;
            1
        }
        _ => 0,
    }
}

/// Inserts each row unless its key is taken, like `INSERT IGNORE`.
fn insert_ignore(t: &mut MemoryTables, rows: Vec<Edge>) -> u64 {
    let mut inserted = 0;
    for edge in rows {
        let key = (edge.source_id, edge.destination_id);
        if !t.edges.contains_key(&key) {
            t.edges.insert(key, edge);
            inserted += 1;
        }
    }
    inserted
}

fn new_edge(source: UserId, destination: UserId, state: EdgeState, now: DateTime<Utc>) -> Edge {
    Edge {
        source_id: source,
        destination_id: destination,
        state,
        position: position_of(now),
        update_time: now,
    }
}

#[async_trait::async_trait]
impl EdgeRepo for MemoryEdgeRepo {
    async fn delete_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        Ok(delete_where(t, source, destination, |e| {
            e.state == EdgeState::Blocked
        }))
    }

    async fn accept_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        invitee: UserId,
        inviter: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        let outgoing = set_state_where(
            t,
            inviter,
            invitee,
            Some(EdgeState::OutgoingRequest),
            EdgeState::Accepted,
            now,
        );
        let incoming = set_state_where(
            t,
            invitee,
            inviter,
            Some(EdgeState::Invited),
            EdgeState::Accepted,
            now,
        );
        Ok(outgoing + incoming)
    }

    async fn insert_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        if !t.user_exists(actor) || !t.user_exists(target) || t.has_edge_between(actor, target) {
            return Ok(0);
        }
        Ok(insert_ignore(
            t,
            vec![
                new_edge(actor, target, EdgeState::OutgoingRequest, now),
                new_edge(target, actor, EdgeState::Invited, now),
            ],
        ))
    }

    async fn count_new_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        let position = position_of(now);
        let counted_before = [(a, b), (b, a)]
            .iter()
            .filter_map(|key| t.edges.get(key))
            .any(|edge| edge.position != position);
        if counted_before {
            return Ok(0);
        }

        let mut rows = 0;
        for user_id in [a, b] {
            if let Some(user) = t.users.get_mut(&user_id) {
                user.edge_count += 1;
                user.update_time = now;
                rows += 1;
            }
        }
        Ok(rows)
    }

    async fn adjust_edge_count_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        match t.users.get_mut(&user_id) {
            Some(user) => {
                user.edge_count += delta;
                user.update_time = now;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        let forward = delete_where(t, a, b, |_| true);
        let backward = delete_where(t, b, a, |_| true);
        Ok(forward + backward)
    }

    async fn update_to_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        Ok(set_state_where(
            t,
            source,
            destination,
            None,
            EdgeState::Blocked,
            now,
        ))
    }

    async fn insert_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        if !t.user_exists(source) || !t.user_exists(destination) {
            return Ok(0);
        }
        Ok(insert_ignore(
            t,
            vec![new_edge(source, destination, EdgeState::Blocked, now)],
        ))
    }

    async fn delete_unless_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError> {
        let t = tables(tx)?;
        Ok(delete_where(t, source, destination, |e| {
            e.state != EdgeState::Blocked
        }))
    }

    async fn list_friends(&self, user_id: UserId) -> Result<Vec<Friend>, RelationError> {
        let friends: Vec<Friend> = self
            .store
            .read(|t| {
                let mut owned: Vec<&Edge> = t
                    .edges
                    .values()
                    .filter(|e| e.source_id == user_id)
                    .collect();
                owned.sort_by_key(|e| (e.position, e.destination_id));

                owned
                    .into_iter()
                    .filter_map(|e| {
                        t.users.get(&e.destination_id).map(|user| Friend {
                            user: user.clone(),
                            state: e.state,
                        })
                    })
                    .collect()
            })
            .await;
        Ok(friends)
    }
}
