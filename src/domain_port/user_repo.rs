use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_in_tx(&self, tx: &mut dyn StorageTx, user: &NewUser) -> Result<(), UserError>;

    /// Ids of the users whose username is in `usernames`. Unknown names are
    /// skipped.
    async fn get_ids_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, UserError>;
}
