//! Position Ledger: ordered seat claims per bucket.
//!
//! Positions among WAITING/CALLED entries in a bucket are always exactly
//! `1..=N`. Every change to that set (append, seat, remove) runs under the
//! bucket lock, and closing an entry shifts everyone behind it forward by one
//! in a single statement.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::{ensure, Action, Caller, Subject};
use crate::config::policy::SeatingPolicy;
use crate::db::locking::lock_bucket;
use crate::domain::{rules, Bucket};
use crate::entities::waitlist_entries::SignupMethod;
use crate::entities::waitlist_groups::GroupStatus;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::events::{DomainEvent, Outbox};
use crate::repos::squads as squad_repo;
use crate::repos::waitlist::{self as waitlist_repo, WaitlistEntry};

#[derive(Debug, Clone, Default)]
pub struct WaitlistService {
    policy: SeatingPolicy,
}

impl WaitlistService {
    pub fn new(policy: SeatingPolicy) -> Self {
        Self { policy }
    }

    /// Put `player_id` at the back of `bucket`.
    pub async fn join(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        bucket: &Bucket,
        player_id: i64,
        signup_method: SignupMethod,
    ) -> Result<WaitlistEntry, DomainError> {
        ensure(
            caller,
            Action::JoinWaitlist,
            &Subject::Bucket {
                venue_id: bucket.venue_id,
                player_id,
            },
        )?;
        if signup_method == SignupMethod::Squad {
            return Err(DomainError::validation(
                ValidationKind::Other("SignupMethod".into()),
                "Squad entries are created by submitting the squad",
            ));
        }

        lock_bucket(txn, bucket).await?;

        if let Some(existing) = waitlist_repo::find_active_for_player(txn, bucket, player_id).await?
        {
            warn!(
                entry_id = existing.id,
                player_id,
                bucket = %bucket,
                "Player already waiting in bucket"
            );
            return Err(DomainError::conflict(
                ConflictKind::DuplicateEntry,
                format!(
                    "Player already holds position {} in {bucket}",
                    existing.position
                ),
            ));
        }

        let entry = append(txn, bucket, Some(player_id), None, signup_method).await?;
        info!(
            entry_id = entry.id,
            player_id,
            position = entry.position,
            bucket = %bucket,
            "Player joined waitlist"
        );
        Ok(entry)
    }

    /// Page an entry. Calling a CALLED entry again bumps its call count.
    pub async fn call(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        entry_id: i64,
        outbox: &mut Outbox,
    ) -> Result<WaitlistEntry, DomainError> {
        let entry = require_entry(txn, entry_id).await?;
        ensure(
            caller,
            Action::CallEntry,
            &Subject::Entry {
                venue_id: entry.bucket.venue_id,
                owner_id: entry.player_id,
            },
        )?;
        rules::ensure_callable(entry.id, entry.status)?;

        let called = waitlist_repo::mark_called(txn, entry.id, OffsetDateTime::now_utc()).await?;
        info!(
            entry_id = called.id,
            call_count = called.call_count,
            called_by = caller.player_id,
            "Entry called"
        );
        outbox.push(DomainEvent::EntryCalled {
            entry_id: called.id,
            venue_id: called.bucket.venue_id,
            player_id: called.player_id,
            group_id: called.group_id,
            call_count: called.call_count,
        });
        Ok(called)
    }

    /// Withdraw an entry and close the gap behind it. A squad-backed entry
    /// has no owning player: only staff can remove it, and the squad goes
    /// with it.
    pub async fn remove(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        entry_id: i64,
        outbox: &mut Outbox,
    ) -> Result<WaitlistEntry, DomainError> {
        let entry = require_entry(txn, entry_id).await?;
        ensure(
            caller,
            Action::RemoveEntry,
            &Subject::Entry {
                venue_id: entry.bucket.venue_id,
                owner_id: entry.player_id,
            },
        )?;

        let entry = lock_and_reload(txn, entry).await?;
        rules::ensure_removable(entry.id, entry.status)?;
        let removed = close_and_shift(txn, &entry, Some(caller.player_id)).await?;

        if let Some(group_id) = entry.group_id {
            let member_ids = cancel_squad(txn, group_id).await?;
            outbox.push(DomainEvent::SquadDisbanded {
                group_id,
                venue_id: entry.bucket.venue_id,
                member_ids,
            });
        }
        outbox.push(DomainEvent::EntryRemoved {
            entry_id: removed.id,
            venue_id: removed.bucket.venue_id,
            removed_by: caller.player_id,
        });
        Ok(removed)
    }

    /// Mark a called entry seated. Seating is terminal, so the gap closes.
    pub async fn seat(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        entry_id: i64,
        outbox: &mut Outbox,
    ) -> Result<WaitlistEntry, DomainError> {
        let entry = require_entry(txn, entry_id).await?;
        ensure(
            caller,
            Action::SeatEntry,
            &Subject::Entry {
                venue_id: entry.bucket.venue_id,
                owner_id: entry.player_id,
            },
        )?;

        let entry = lock_and_reload(txn, entry).await?;
        rules::ensure_seatable(entry.id, entry.status)?;
        let seated = close_and_shift(txn, &entry, None).await?;
        outbox.push(DomainEvent::EntrySeated {
            entry_id: seated.id,
            venue_id: seated.bucket.venue_id,
        });

        if let Some(group_id) = entry.group_id {
            squad_repo::transition(txn, group_id, GroupStatus::Waiting, GroupStatus::Matched)
                .await?;
            info!(group_id, entry_id = seated.id, "Squad matched");
            outbox.push(DomainEvent::SquadMatched {
                group_id,
                entry_id: seated.id,
            });
        }
        Ok(seated)
    }

    pub async fn estimated_wait_minutes<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        bucket: &Bucket,
    ) -> Result<i64, DomainError> {
        let max_position = waitlist_repo::max_active_position(conn, bucket).await?;
        Ok(self.policy.estimated_wait_minutes(max_position))
    }

    pub async fn get_entry<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        entry_id: i64,
    ) -> Result<WaitlistEntry, DomainError> {
        require_entry(conn, entry_id).await
    }

    /// Active entries front to back.
    pub async fn list_bucket<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        bucket: &Bucket,
    ) -> Result<Vec<WaitlistEntry>, DomainError> {
        debug!(bucket = %bucket, "Listing bucket");
        waitlist_repo::list_active(conn, bucket).await
    }

    pub async fn find_active_entry<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        bucket: &Bucket,
        player_id: i64,
    ) -> Result<Option<WaitlistEntry>, DomainError> {
        waitlist_repo::find_active_for_player(conn, bucket, player_id).await
    }
}

async fn require_entry<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    entry_id: i64,
) -> Result<WaitlistEntry, DomainError> {
    waitlist_repo::find_entry(conn, entry_id)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Entry, format!("Entry {entry_id} not found"))
        })
}

/// Take the bucket lock, then re-read the entry: status and position may
/// have moved while another transaction held the lock.
async fn lock_and_reload(
    txn: &DatabaseTransaction,
    entry: WaitlistEntry,
) -> Result<WaitlistEntry, DomainError> {
    lock_bucket(txn, &entry.bucket).await?;
    let reloaded = require_entry(txn, entry.id).await?;
    if reloaded.position != entry.position {
        debug!(
            entry_id = entry.id,
            read_position = entry.position,
            locked_position = reloaded.position,
            "Entry moved while waiting for bucket lock"
        );
    }
    Ok(reloaded)
}

/// Insert at max + 1. The caller holds the bucket lock.
pub(crate) async fn append(
    txn: &DatabaseTransaction,
    bucket: &Bucket,
    player_id: Option<i64>,
    group_id: Option<i64>,
    signup_method: SignupMethod,
) -> Result<WaitlistEntry, DomainError> {
    let position = waitlist_repo::max_active_position(txn, bucket).await? + 1;
    waitlist_repo::insert_entry(txn, bucket, player_id, group_id, position, signup_method).await
}

/// Close `entry` (seated when `removed_by` is None) and shift the entries
/// behind it. The caller holds the bucket lock.
pub(crate) async fn close_and_shift(
    txn: &DatabaseTransaction,
    entry: &WaitlistEntry,
    removed_by: Option<i64>,
) -> Result<WaitlistEntry, DomainError> {
    let now = OffsetDateTime::now_utc();
    let closed = match removed_by {
        Some(by) => waitlist_repo::mark_removed(txn, entry.id, by, now).await?,
        None => waitlist_repo::mark_seated(txn, entry.id, now).await?,
    };
    let shifted = waitlist_repo::close_gap(txn, &entry.bucket, entry.position).await?;
    info!(
        entry_id = closed.id,
        status = ?closed.status,
        vacated_position = entry.position,
        shifted,
        "Entry left the waitlist"
    );
    Ok(closed)
}

/// Staff-side cancellation of a submitted squad: members go, group is disbanded.
async fn cancel_squad(txn: &DatabaseTransaction, group_id: i64) -> Result<Vec<i64>, DomainError> {
    let member_ids = squad_repo::list_members(txn, group_id)
        .await?
        .into_iter()
        .map(|m| m.player_id)
        .collect();
    squad_repo::remove_all_members(txn, group_id).await?;
    squad_repo::transition(txn, group_id, GroupStatus::Waiting, GroupStatus::Disbanded).await?;
    info!(group_id, "Squad cancelled with its waitlist entry");
    Ok(member_ids)
}
