use super::user_repo_mysql::row_to_user;
use super::util::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Database, Decode, Encode, MySql, MySqlPool, Row, Type};

impl<'r, DB: Database> Decode<'r, DB> for EdgeState
where
    i8: Decode<'r, DB>,
{
    fn decode(value: <DB as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let code = <i8 as Decode<DB>>::decode(value)?;
        Ok(EdgeState::try_from(code)?)
    }
}

impl<'q, DB: Database> Encode<'q, DB> for EdgeState
where
    i8: Encode<'q, DB>,
{
    fn encode_by_ref(
        &self,
        buf: &mut <DB as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        self.code().encode_by_ref(buf)
    }
}

impl<DB: Database> Type<DB> for EdgeState
where
    i8: Type<DB>,
{
    fn type_info() -> <DB as Database>::TypeInfo {
        <i8 as Type<DB>>::type_info()
    }

    fn compatible(ty: &<DB as Database>::TypeInfo) -> bool {
        <i8 as Type<DB>>::compatible(ty)
    }
}

pub struct MySqlEdgeRepo {
    pool: MySqlPool,
}

impl MySqlEdgeRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlEdgeRepo { pool }
    }

    fn row_to_friend(r: &MySqlRow) -> Result<Friend, sqlx::Error> {
        Ok(Friend {
            user: row_to_user(r)?,
            state: r.try_get::<EdgeState, _>("state")?,
        })
    }
}

async fn execute<'q>(
    tx: &mut dyn StorageTx,
    query: Query<'q, MySql, MySqlArguments>,
    what: &str,
) -> Result<u64, RelationError> {
    let tx = downcast(tx)?;
    let res = query
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("{what}: {e}")))?;
    Ok(res.rows_affected())
}

#[async_trait::async_trait]
impl EdgeRepo for MySqlEdgeRepo {
    async fn delete_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
DELETE FROM user_edge
WHERE source_id = ? AND destination_id = ? AND state = ?
"#,
        )
        .bind(source)
        .bind(destination)
        .bind(EdgeState::Blocked);

        execute(tx, query, "delete block edge").await
    }

    async fn accept_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        invitee: UserId,
        inviter: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
UPDATE user_edge SET state = ?, update_time = ?
WHERE (source_id = ? AND destination_id = ? AND state = ?)
   OR (source_id = ? AND destination_id = ? AND state = ?)
"#,
        )
        .bind(EdgeState::Accepted)
        .bind(now)
        .bind(inviter)
        .bind(invitee)
        .bind(EdgeState::OutgoingRequest)
        .bind(invitee)
        .bind(inviter)
        .bind(EdgeState::Invited);

        execute(tx, query, "accept invite").await
    }

    async fn insert_invite_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        // IGNORE absorbs the unique-key race with a concurrent invite for the
        // same pair; the NOT EXISTS keeps the two rows all-or-nothing.
        let query = sqlx::query(
            r#"
INSERT IGNORE INTO user_edge (source_id, destination_id, state, position, update_time)
SELECT ue.source_id, ue.destination_id, ue.state, ?, ?
FROM (
    SELECT ? AS source_id, ? AS destination_id, ? AS state
    UNION ALL
    SELECT ?, ?, ?
) AS ue
WHERE (SELECT COUNT(*) FROM users WHERE id IN (?, ?)) = 2
  AND NOT EXISTS (
    SELECT 1 FROM user_edge
    WHERE (source_id = ? AND destination_id = ?)
       OR (source_id = ? AND destination_id = ?)
  )
"#,
        )
        .bind(position_of(now))
        .bind(now)
        .bind(actor)
        .bind(target)
        .bind(EdgeState::OutgoingRequest)
        .bind(target)
        .bind(actor)
        .bind(EdgeState::Invited)
        .bind(actor)
        .bind(target)
        .bind(actor)
        .bind(target)
        .bind(target)
        .bind(actor);

        execute(tx, query, "insert invite edges").await
    }

    async fn count_new_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
UPDATE users SET edge_count = edge_count + 1, update_time = ?
WHERE id IN (?, ?)
  AND NOT EXISTS (
    SELECT 1 FROM user_edge
    WHERE ((source_id = ? AND destination_id = ?) OR (source_id = ? AND destination_id = ?))
      AND position <> ?
  )
"#,
        )
        .bind(now)
        .bind(a)
        .bind(b)
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .bind(position_of(now));

        execute(tx, query, "count new edges").await
    }

    async fn adjust_edge_count_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
UPDATE users SET edge_count = edge_count + ?, update_time = ?
WHERE id = ?
"#,
        )
        .bind(delta)
        .bind(now)
        .bind(user_id);

        execute(tx, query, "update edge count").await
    }

    async fn delete_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
DELETE FROM user_edge
WHERE (source_id = ? AND destination_id = ?)
   OR (source_id = ? AND destination_id = ?)
"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a);

        execute(tx, query, "delete edge pair").await
    }

    async fn update_to_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
UPDATE user_edge SET state = ?, update_time = ?
WHERE source_id = ? AND destination_id = ?
"#,
        )
        .bind(EdgeState::Blocked)
        .bind(now)
        .bind(source)
        .bind(destination);

        execute(tx, query, "update edge to blocked").await
    }

    async fn insert_block_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
INSERT IGNORE INTO user_edge (source_id, destination_id, state, position, update_time)
SELECT ?, ?, ?, ?, ? FROM DUAL
WHERE (SELECT COUNT(*) FROM users WHERE id IN (?, ?)) = 2
"#,
        )
        .bind(source)
        .bind(destination)
        .bind(EdgeState::Blocked)
        .bind(position_of(now))
        .bind(now)
        .bind(source)
        .bind(destination);

        execute(tx, query, "insert block edge").await
    }

    async fn delete_unless_blocked_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        source: UserId,
        destination: UserId,
    ) -> Result<u64, RelationError> {
        let query = sqlx::query(
            r#"
DELETE FROM user_edge
WHERE source_id = ? AND destination_id = ? AND state <> ?
"#,
        )
        .bind(source)
        .bind(destination)
        .bind(EdgeState::Blocked);

        execute(tx, query, "delete opposite edge").await
    }

    async fn list_friends(&self, user_id: UserId) -> Result<Vec<Friend>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT u.id, u.username, u.display_name, u.avatar_url,
       u.lang_tag, u.location, u.timezone, u.metadata, u.edge_count,
       u.create_time, u.update_time, e.state
FROM user_edge e
JOIN users u ON u.id = e.destination_id
WHERE e.source_id = ?
ORDER BY e.position, e.destination_id
"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("list friends: {e}")))?;

        rows.iter()
            .map(Self::row_to_friend)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RelationError::Store(format!("decode friend: {e}")))
    }
}
