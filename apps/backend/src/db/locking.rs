//! Transaction-scoped mutual exclusion for the contended resources: a
//! bucket's position sequence, a player's open deposit on a game, and a
//! squad's status and membership.
//!
//! On Postgres this is `pg_advisory_xact_lock`, released automatically at
//! commit or rollback. SQLite already serializes writers behind its database
//! lock, so the helper only logs there.

use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseTransaction, Statement};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::domain::Bucket;
use crate::errors::domain::DomainError;

pub fn pg_lock_id(key: &str) -> i64 {
    xxh3_64(key.as_bytes()) as i64
}

pub fn escrow_lock_key(home_game_id: i64, player_id: i64) -> String {
    format!("escrow:{home_game_id}:{player_id}")
}

pub fn squad_lock_key(group_id: i64) -> String {
    format!("squad:{group_id}")
}

/// Block until this transaction holds the lock for `key`.
pub async fn lock_for_txn(txn: &DatabaseTransaction, key: &str) -> Result<(), DomainError> {
    let backend = txn.get_database_backend();
    match backend {
        DatabaseBackend::Postgres => {
            let lock_id = pg_lock_id(key);
            txn.execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1)",
                vec![lock_id.into()],
            ))
            .await?;
            debug!(lock_key = key, lock_id, "advisory lock acquired");
        }
        _ => {
            debug!(lock_key = key, "writer lock held by database");
        }
    }
    Ok(())
}

pub async fn lock_bucket(txn: &DatabaseTransaction, bucket: &Bucket) -> Result<(), DomainError> {
    lock_for_txn(txn, &bucket.lock_key()).await
}

pub async fn lock_deposit(
    txn: &DatabaseTransaction,
    home_game_id: i64,
    player_id: i64,
) -> Result<(), DomainError> {
    lock_for_txn(txn, &escrow_lock_key(home_game_id, player_id)).await
}

/// Serializes every squad mutation.
/// Take it before any bucket lock.
pub async fn lock_squad(txn: &DatabaseTransaction, group_id: i64) -> Result<(), DomainError> {
    lock_for_txn(txn, &squad_lock_key(group_id)).await
}
