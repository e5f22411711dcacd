use std::env;
use std::env::VarError;
use std::str::FromStr;

use seatline::config::db::{DbKind, RuntimeEnv};
use seatline::infra::state::{build_state, StateBuilder};
use seatline::state::app_state::AppState;
use seatline::AppError;

fn read_env_db_kind() -> Result<Option<String>, AppError> {
    match env::var("SEATLINE_TEST_DB_KIND") {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(AppError::from(err)),
    }
}

/// SQLite in-memory unless `SEATLINE_TEST_DB_KIND` says otherwise.
pub fn resolve_test_db_kind() -> Result<DbKind, AppError> {
    match read_env_db_kind()? {
        Some(ref raw) => DbKind::from_str(raw.as_str()),
        None => Ok(DbKind::SqliteMemory),
    }
}

pub fn test_state_builder() -> Result<StateBuilder, AppError> {
    let db_kind = resolve_test_db_kind()?;
    Ok(build_state().with_env(RuntimeEnv::Test).with_db(db_kind))
}

pub async fn build_test_state() -> Result<AppState, AppError> {
    test_state_builder()?.build().await
}
