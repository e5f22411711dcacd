//! SeaORM -> DomainError translation helpers.
//!
//! Adapters return `sea_orm::DbErr`; repos convert it here into a
//! `DomainError`, and the façade maps that to `AppError` via `From`.
//!
//! Unique-index collisions on the two contended constraints (a player's active
//! entry in a bucket, a player's open deposit on a game) mean another request
//! won a race past our precondition check, so they surface as
//! `ConflictKind::ConcurrentWrite` and the caller may re-issue the request.

use sea_orm::DbErr;
use tracing::{error, warn};

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::logging::pii::Redacted;

/// Prefix for `DbErr::Custom` raised when a guarded status update matched no
/// rows because the row moved on underneath us.
pub const STALE_STATUS_PREFIX: &str = "STALE_STATUS:";

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// Column list from SQLite "UNIQUE constraint failed: t.a, t.b" messages.
fn sqlite_unique_columns(error_msg: &str) -> Option<&str> {
    let marker = "UNIQUE constraint failed: ";
    let start = error_msg.find(marker)? + marker.len();
    let rest = &error_msg[start..];
    Some(rest.lines().next().unwrap_or(rest).trim_end_matches('"'))
}

fn map_sqlite_columns_to_conflict(columns: &str) -> Option<(ConflictKind, &'static str)> {
    if columns.starts_with("waitlist_entries.venue_id")
        && columns.contains("waitlist_entries.player_id")
    {
        return Some((
            ConflictKind::ConcurrentWrite,
            "A concurrent join for this player won the race; retry to see the existing entry",
        ));
    }
    if columns.starts_with("waitlist_entries.group_id") {
        return Some((
            ConflictKind::ConcurrentWrite,
            "Squad was submitted concurrently; retry",
        ));
    }
    if columns.starts_with("escrow_transactions.home_game_id") {
        return Some((
            ConflictKind::ConcurrentWrite,
            "A concurrent deposit for this player won the race; retry",
        ));
    }
    if columns.starts_with("waitlist_group_members.group_id") {
        return Some((ConflictKind::AlreadyMember, "Player is already in this squad"));
    }
    if columns.contains("waitlist_groups.invite_code") {
        return Some((ConflictKind::InviteCodeConflict, "Invite code already exists"));
    }
    None
}

fn map_postgres_constraint_to_conflict(error_msg: &str) -> Option<(ConflictKind, &'static str)> {
    if error_msg.contains("waitlist_entries_active_player_uq") {
        return Some((
            ConflictKind::ConcurrentWrite,
            "A concurrent join for this player won the race; retry to see the existing entry",
        ));
    }
    if error_msg.contains("waitlist_entries_active_group_uq") {
        return Some((
            ConflictKind::ConcurrentWrite,
            "Squad was submitted concurrently; retry",
        ));
    }
    if error_msg.contains("escrow_transactions_open_uq") {
        return Some((
            ConflictKind::ConcurrentWrite,
            "A concurrent deposit for this player won the race; retry",
        ));
    }
    if error_msg.contains("waitlist_group_members_active_uq") {
        return Some((ConflictKind::AlreadyMember, "Player is already in this squad"));
    }
    if error_msg.contains("waitlist_groups_invite_code_uq") {
        return Some((ConflictKind::InviteCodeConflict, "Invite code already exists"));
    }
    None
}

/// Translate a `DbErr` into a `DomainError` with sanitized, PII-safe detail.
pub fn map_db_err(e: DbErr) -> DomainError {
    let error_msg = e.to_string();

    match &e {
        DbErr::RecordNotFound(_) => {
            return DomainError::not_found(
                NotFoundKind::Other("Record".into()),
                "Record not found",
            );
        }
        DbErr::RecordNotUpdated => {
            warn!("Guarded update matched no rows");
            return DomainError::conflict(
                ConflictKind::ConcurrentWrite,
                "Record was modified concurrently; re-fetch and retry",
            );
        }
        DbErr::Custom(msg) if msg.starts_with(STALE_STATUS_PREFIX) => {
            let what = msg.trim_start_matches(STALE_STATUS_PREFIX);
            warn!(target_row = %what, "Stale status on guarded update");
            return DomainError::conflict(
                ConflictKind::ConcurrentWrite,
                format!("{what} was modified concurrently; re-fetch and retry"),
            );
        }
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            warn!(raw_error = %Redacted(&error_msg), "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(raw_error = %Redacted(&error_msg), "Unique constraint violation");

        if let Some(columns) = sqlite_unique_columns(&error_msg) {
            if let Some((kind, detail)) = map_sqlite_columns_to_conflict(columns) {
                return DomainError::conflict(kind, detail);
            }
        }
        if let Some((kind, detail)) = map_postgres_constraint_to_conflict(&error_msg) {
            return DomainError::conflict(kind, detail);
        }
        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    // exclusion_violation: two active entries ended up on one position
    if mentions_sqlstate(&error_msg, "23P01")
        || error_msg.contains("waitlist_entries_active_position_excl")
    {
        warn!(raw_error = %Redacted(&error_msg), "Active position collision");
        return DomainError::conflict(
            ConflictKind::ConcurrentWrite,
            "Bucket positions changed concurrently; retry",
        );
    }

    // serialization_failure / deadlock_detected / sqlite busy
    if mentions_sqlstate(&error_msg, "40001")
        || mentions_sqlstate(&error_msg, "40P01")
        || error_msg.contains("database is locked")
    {
        warn!(raw_error = %Redacted(&error_msg), "Transaction lost a concurrency race");
        return DomainError::conflict(
            ConflictKind::ConcurrentWrite,
            "Concurrent update detected; retry the request",
        );
    }

    if mentions_sqlstate(&error_msg, "23503") || error_msg.contains("FOREIGN KEY constraint failed")
    {
        warn!(raw_error = %Redacted(&error_msg), "Foreign key constraint violation");
        return DomainError::validation(
            ValidationKind::Other("ForeignKey".into()),
            "Foreign key constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23514") || error_msg.contains("CHECK constraint failed") {
        warn!(raw_error = %Redacted(&error_msg), "Check constraint violation");
        return DomainError::validation(
            ValidationKind::Other("Check".into()),
            "Check constraint violation",
        );
    }

    if error_msg.contains("timeout") || error_msg.contains("pool timed out") {
        warn!(raw_error = %Redacted(&error_msg), "Database timeout or pool issue");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(raw_error = %Redacted(&error_msg), "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}
