//! SeaORM adapters. Functions here return `sea_orm::DbErr`; the repos layer
//! maps to `DomainError` via `From<DbErr>`.

pub mod escrow_sea;
pub mod squads_sea;
pub mod waitlist_sea;

use sea_orm::DbErr;

use crate::infra::db_errors::STALE_STATUS_PREFIX;

/// Error for a guarded update whose status precondition no longer held.
pub(crate) fn stale(what: impl std::fmt::Display) -> DbErr {
    DbErr::Custom(format!("{STALE_STATUS_PREFIX}{what}"))
}
