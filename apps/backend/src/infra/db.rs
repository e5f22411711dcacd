//! Connection setup and migration bootstrap.

use std::future::Future;
use std::time::Duration;

use migration::{migrate, MigrationCommand, Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{make_conn_spec, DbKind, DbOwner, RuntimeEnv};
use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;

/// Retry a connection attempt with fixed interval delays.
/// Returns the error of the last attempt once retries are exhausted.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(conn) => {
                if attempt > 1 {
                    info!(attempts = attempt, "connection retry succeeded");
                }
                return Ok(conn);
            }
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(_) => {
                warn!(attempt, max_attempts, interval_ms, "connection attempt failed");
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Per-connection statements applied right after connecting.
fn session_statements(kind: DbKind) -> Vec<&'static str> {
    match kind {
        DbKind::SqliteFile | DbKind::SqliteMemory => {
            vec!["PRAGMA foreign_keys = ON;", "PRAGMA busy_timeout = 5000;"]
        }
        DbKind::Postgres => vec!["SET timezone = 'UTC';"],
    }
}

/// Connect without running migrations.
///
/// SQLite pools hold a single connection: an in-memory database only exists
/// on the connection that created it, and SQLite serializes writers anyway.
pub async fn connect_db(
    env: RuntimeEnv,
    kind: DbKind,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let url = make_conn_spec(env, kind, owner)?;

    let mut opt = ConnectOptions::new(url);
    match kind {
        DbKind::Postgres => {
            opt.min_connections(1).max_connections(10);
        }
        DbKind::SqliteFile | DbKind::SqliteMemory => {
            opt.min_connections(1).max_connections(1);
        }
    }
    opt.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = retry_connection(
        || {
            let opt = opt.clone();
            async move { Database::connect(opt).await.map_err(AppError::from) }
        },
        CONNECT_ATTEMPTS,
        CONNECT_INTERVAL_MS,
    )
    .await?;

    for stmt in session_statements(kind) {
        conn.execute_unprepared(stmt).await?;
    }
    info!(engine = %kind, "database connected");
    Ok(conn)
}

/// Run pending migrations (idempotent).
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<(), AppError> {
    Migrator::up(conn, None).await?;
    Ok(())
}

/// Run one operator migration command as the owner role.
///
/// In-memory SQLite is rejected: the database would vanish with the process.
pub async fn orchestrate_migration(
    env: RuntimeEnv,
    kind: DbKind,
    command: MigrationCommand,
) -> Result<(), AppError> {
    if kind == DbKind::SqliteMemory {
        return Err(AppError::config("in-memory SQLite cannot be migrated from the CLI"));
    }
    let conn = connect_db(env, kind, DbOwner::Owner).await?;
    migrate(&conn, command).await?;
    let _ = conn.close().await;
    Ok(())
}

/// Connect as owner, migrate, and hand back a connection for the app role.
///
/// SQLite has no roles, so the migrated connection is reused.
pub async fn bootstrap_db(env: RuntimeEnv, kind: DbKind) -> Result<DatabaseConnection, AppError> {
    let owner_conn = connect_db(env, kind, DbOwner::Owner).await?;
    run_migrations(&owner_conn).await?;

    if kind.is_sqlite() {
        return Ok(owner_conn);
    }
    let _ = owner_conn.close().await;
    connect_db(env, kind, DbOwner::App).await
}
