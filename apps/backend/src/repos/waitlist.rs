//! Waitlist entry repository functions for domain layer.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::waitlist_sea as waitlist_adapter;
use crate::domain::Bucket;
use crate::entities::waitlist_entries::{self, EntryStatus, SignupMethod};
use crate::errors::domain::DomainError;

/// One player's (or squad's) claim to a seat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitlistEntry {
    pub id: i64,
    pub bucket: Bucket,
    pub player_id: Option<i64>,
    pub group_id: Option<i64>,
    pub position: i32,
    pub status: EntryStatus,
    pub signup_method: SignupMethod,
    pub call_count: i32,
    pub last_called_at: Option<OffsetDateTime>,
    pub seated_at: Option<OffsetDateTime>,
    pub removed_at: Option<OffsetDateTime>,
    pub removed_by: Option<i64>,
    pub created_at: OffsetDateTime,
}

impl WaitlistEntry {
    pub fn is_squad(&self) -> bool {
        self.group_id.is_some()
    }
}

pub async fn find_entry<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    entry_id: i64,
) -> Result<Option<WaitlistEntry>, DomainError> {
    let entry = waitlist_adapter::find_by_id(conn, entry_id).await?;
    Ok(entry.map(WaitlistEntry::from))
}

pub async fn find_active_for_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
    player_id: i64,
) -> Result<Option<WaitlistEntry>, DomainError> {
    let entry = waitlist_adapter::find_active_for_player(conn, bucket, player_id).await?;
    Ok(entry.map(WaitlistEntry::from))
}

pub async fn find_active_for_group<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Option<WaitlistEntry>, DomainError> {
    let entry = waitlist_adapter::find_active_for_group(conn, group_id).await?;
    Ok(entry.map(WaitlistEntry::from))
}

pub async fn max_active_position<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
) -> Result<i32, DomainError> {
    Ok(waitlist_adapter::max_active_position(conn, bucket)
        .await?
        .unwrap_or(0))
}

pub async fn list_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
) -> Result<Vec<WaitlistEntry>, DomainError> {
    let entries = waitlist_adapter::list_active(conn, bucket).await?;
    Ok(entries.into_iter().map(WaitlistEntry::from).collect())
}

/// Insert at `position`. The caller holds the bucket lock.
pub async fn insert_entry(
    txn: &DatabaseTransaction,
    bucket: &Bucket,
    player_id: Option<i64>,
    group_id: Option<i64>,
    position: i32,
    signup_method: SignupMethod,
) -> Result<WaitlistEntry, DomainError> {
    let dto = waitlist_adapter::EntryCreate {
        venue_id: bucket.venue_id,
        game_type: bucket.game_type.clone(),
        stakes: bucket.stakes.clone(),
        player_id,
        group_id,
        position,
        signup_method,
    };
    let entry = waitlist_adapter::create_entry(txn, dto).await?;
    Ok(WaitlistEntry::from(entry))
}

pub async fn mark_called(
    txn: &DatabaseTransaction,
    entry_id: i64,
    at: OffsetDateTime,
) -> Result<WaitlistEntry, DomainError> {
    let entry = waitlist_adapter::mark_called(txn, entry_id, at).await?;
    Ok(WaitlistEntry::from(entry))
}

pub async fn mark_seated(
    txn: &DatabaseTransaction,
    entry_id: i64,
    at: OffsetDateTime,
) -> Result<WaitlistEntry, DomainError> {
    let dto = waitlist_adapter::EntryClose::seated(entry_id, at);
    let entry = waitlist_adapter::close_entry(txn, dto).await?;
    Ok(WaitlistEntry::from(entry))
}

pub async fn mark_removed(
    txn: &DatabaseTransaction,
    entry_id: i64,
    removed_by: i64,
    at: OffsetDateTime,
) -> Result<WaitlistEntry, DomainError> {
    let dto = waitlist_adapter::EntryClose::removed(entry_id, removed_by, at);
    let entry = waitlist_adapter::close_entry(txn, dto).await?;
    Ok(WaitlistEntry::from(entry))
}

/// Close the gap left at `position`.
pub async fn close_gap(
    txn: &DatabaseTransaction,
    bucket: &Bucket,
    position: i32,
) -> Result<u64, DomainError> {
    Ok(waitlist_adapter::shift_positions_after(txn, bucket, position).await?)
}

impl From<waitlist_entries::Model> for WaitlistEntry {
    fn from(model: waitlist_entries::Model) -> Self {
        Self {
            id: model.id,
            bucket: Bucket {
                venue_id: model.venue_id,
                game_type: model.game_type,
                stakes: model.stakes,
            },
            player_id: model.player_id,
            group_id: model.group_id,
            position: model.position,
            status: model.status,
            signup_method: model.signup_method,
            call_count: model.call_count,
            last_called_at: model.last_called_at,
            seated_at: model.seated_at,
            removed_at: model.removed_at,
            removed_by: model.removed_by,
            created_at: model.created_at,
        }
    }
}
