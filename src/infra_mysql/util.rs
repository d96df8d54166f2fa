use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use anyhow::anyhow;
use sqlx::mysql::MySqlDatabaseError;

pub fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MySqlTx> {
    tx.as_any_mut()
        .downcast_mut::<MySqlTx>()
        .ok_or_else(|| anyhow!("transaction was not opened by the MySQL backend"))
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}
