use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::NewUser;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::LogNotifier;
use crate::settings::{Settings, StoreBackend};
use sqlx::MySqlPool;
use std::sync::Arc;

pub struct Server {
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub notifier: Arc<dyn FriendNotifier>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub fn new(
        user_service: Arc<dyn UserService>,
        relationship_service: Arc<dyn RelationshipService>,
        notifier: Arc<dyn FriendNotifier>,
    ) -> Self {
        Self {
            user_service,
            relationship_service,
            notifier,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (tx_manager, user_repo, edge_repo, pool): (
            Arc<dyn TxManager>,
            Arc<dyn UserRepo>,
            Arc<dyn EdgeRepo>,
            Option<MySqlPool>,
        ) = match settings.store.backend {
            StoreBackend::Mysql => {
                let pool = connect_pool(&settings.store).await?;
                (
                    Arc::new(MySqlTxManager::new(pool.clone())),
                    Arc::new(MySqlUserRepo::new(pool.clone())),
                    Arc::new(MySqlEdgeRepo::new(pool.clone())),
                    Some(pool),
                )
            }
            StoreBackend::Memory => {
                let store = MemoryStore::new();
                (
                    Arc::new(MemoryTxManager::new(store.clone())),
                    Arc::new(MemoryUserRepo::new(store.clone())),
                    Arc::new(MemoryEdgeRepo::new(store)),
                    None,
                )
            }
        };

        let user_service: Arc<dyn UserService> =
            Arc::new(RealUserService::new(user_repo, tx_manager.clone()));
        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(edge_repo, tx_manager));
        let notifier: Arc<dyn FriendNotifier> = Arc::new(LogNotifier::new());

        for username in &settings.store.seed_usernames {
            match user_service
                .create_user(NewUser::with_username(username.as_str()))
                .await
            {
                Ok(user_id) => info!(%user_id, %username, "seeded user"),
                Err(UserError::UsernameTaken) => debug!(%username, "seed user already exists"),
                Err(e) => return Err(e.into()),
            }
        }

        info!(backend = ?settings.store.backend, "server started");

        Ok(Self {
            user_service,
            relationship_service,
            notifier,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
