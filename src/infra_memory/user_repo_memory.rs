use super::store::{MemoryStore, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;

pub struct MemoryUserRepo {
    store: MemoryStore,
}

impl MemoryUserRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryUserRepo { store }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create_in_tx(&self, tx: &mut dyn StorageTx, user: &NewUser) -> Result<(), UserError> {
        let tables = downcast(tx)
            .map_err(|e| UserError::Store(e.to_string()))?
            .tables();

        if tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.username == user.username)
        {
            return Err(UserError::UsernameTaken);
        }

        let now = Utc::now();
        tables.users.insert(
            user.id,
            User {
                id: user.id,
                username: user.username.clone(),
                display_name: user.display_name.clone(),
                avatar_url: user.avatar_url.clone(),
                lang_tag: user.lang_tag.clone(),
                location: user.location.clone(),
                timezone: user.timezone.clone(),
                metadata: user.metadata_or_default().to_owned(),
                edge_count: 0,
                create_time: now,
                update_time: now,
                online: false,
            },
        );
        Ok(())
    }

    async fn get_ids_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, UserError> {
        let ids: Vec<UserId> = self
            .store
            .read(|t| {
                t.users
                    .values()
                    .filter(|u| usernames.contains(&u.username))
                    .map(|u| u.id)
                    .collect()
            })
            .await;
        Ok(ids)
    }
}
