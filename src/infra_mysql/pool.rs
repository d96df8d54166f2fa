use crate::settings::Store;
use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

/// Opens the connection pool and, when configured, brings the schema up to
/// date with the embedded migrations.
pub async fn connect_pool(store: &Store) -> Result<MySqlPool> {
    let dsn = store
        .dsn
        .as_deref()
        .context("store.dsn is required for the mysql backend")?;

    let pool = MySqlPoolOptions::new()
        .max_connections(store.max_connections)
        .connect(dsn)
        .await
        .context("connect to mysql")?;

    if store.migrate {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        info!("schema migrations applied");
    }

    Ok(pool)
}
