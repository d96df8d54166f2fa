use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// A row of the `users` table as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub lang_tag: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    /// Free-form JSON object, stored as text.
    pub metadata: String,
    /// Number of edges this user is the source of.
    pub edge_count: i32,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// Presence is owned by the session layer; the store always reports `false`.
    pub online: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub lang_tag: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub metadata: Option<String>,
}

impl NewUser {
    pub fn with_username(username: impl Into<String>) -> Self {
        NewUser {
            id: UserId::new(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn metadata_or_default(&self) -> &str {
        self.metadata.as_deref().unwrap_or("{}")
    }
}
