use crate::domain_model::{NewUser, UserId};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<UserId, UserError>;
    async fn resolve_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, UserError>;
}
