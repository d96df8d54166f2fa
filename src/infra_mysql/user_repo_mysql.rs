use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

/// Decodes the profile columns shared by every `users` projection.
pub(super) fn row_to_user(r: &MySqlRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: r.try_get::<UserId, _>("id")?,
        username: r.try_get("username")?,
        display_name: r.try_get("display_name")?,
        avatar_url: r.try_get("avatar_url")?,
        lang_tag: r.try_get("lang_tag")?,
        location: r.try_get("location")?,
        timezone: r.try_get("timezone")?,
        metadata: r
            .try_get::<Option<String>, _>("metadata")?
            .unwrap_or_else(|| "{}".to_owned()),
        edge_count: r.try_get("edge_count")?,
        create_time: r.try_get::<DateTime<Utc>, _>("create_time")?,
        update_time: r.try_get::<DateTime<Utc>, _>("update_time")?,
        online: false,
    })
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx(&self, tx: &mut dyn StorageTx, user: &NewUser) -> Result<(), UserError> {
        let tx = downcast(tx).map_err(|e| UserError::Store(e.to_string()))?;
        let now = Utc::now();

        sqlx::query(
            r#"
INSERT INTO users (id, username, display_name, avatar_url, lang_tag, location, timezone,
                   metadata, edge_count, create_time, update_time)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.lang_tag)
        .bind(&user.location)
        .bind(&user.timezone)
        .bind(user.metadata_or_default())
        .bind(now)
        .bind(now)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                UserError::UsernameTaken
            } else {
                UserError::Store(format!("insert user: {e}"))
            }
        })?;

        Ok(())
    }

    async fn get_ids_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, UserError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new("SELECT id FROM users WHERE username IN (");
        let mut separated = builder.separated(", ");
        for username in usernames {
            separated.push_bind(username);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::Store(format!("query user ids: {e}")))?;

        rows.iter()
            .map(|row| row.try_get::<UserId, _>("id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| UserError::Store(format!("uuid decode: {e}")))
    }
}
