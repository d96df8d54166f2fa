use crate::application_port::{UserError, UserService};
use crate::domain_model::{NewUser, UserId};
use crate::domain_port::{TxManager, UserRepo};
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>, tx_manager: Arc<dyn TxManager>) -> RealUserService {
        RealUserService {
            user_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create_user(&self, user: NewUser) -> Result<UserId, UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        self.user_repo.create_in_tx(&mut *tx, &user).await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(user.id)
    }

    async fn resolve_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, UserError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        self.user_repo.get_ids_by_usernames(usernames).await
    }
}
