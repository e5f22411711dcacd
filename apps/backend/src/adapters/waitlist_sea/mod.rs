//! SeaORM adapter for the Position Ledger.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use super::stale;
use crate::domain::Bucket;
use crate::entities::waitlist_entries::{self, EntryStatus};

pub mod dto;

pub use dto::{EntryClose, EntryCreate};

fn active_in_bucket(bucket: &Bucket) -> Select<waitlist_entries::Entity> {
    waitlist_entries::Entity::find()
        .filter(waitlist_entries::Column::VenueId.eq(bucket.venue_id))
        .filter(waitlist_entries::Column::GameType.eq(bucket.game_type.as_str()))
        .filter(waitlist_entries::Column::Stakes.eq(bucket.stakes.as_str()))
        .filter(waitlist_entries::Column::Status.is_in(EntryStatus::active()))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    entry_id: i64,
) -> Result<Option<waitlist_entries::Model>, DbErr> {
    waitlist_entries::Entity::find_by_id(entry_id).one(conn).await
}

pub async fn find_active_for_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
    player_id: i64,
) -> Result<Option<waitlist_entries::Model>, DbErr> {
    active_in_bucket(bucket)
        .filter(waitlist_entries::Column::PlayerId.eq(player_id))
        .one(conn)
        .await
}

pub async fn find_active_for_group<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Option<waitlist_entries::Model>, DbErr> {
    waitlist_entries::Entity::find()
        .filter(waitlist_entries::Column::GroupId.eq(group_id))
        .filter(waitlist_entries::Column::Status.is_in(EntryStatus::active()))
        .one(conn)
        .await
}

/// Highest position among active entries, or None for an empty bucket.
pub async fn max_active_position<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
) -> Result<Option<i32>, DbErr> {
    let max: Option<Option<i32>> = active_in_bucket(bucket)
        .select_only()
        .column_as(waitlist_entries::Column::Position.max(), "max_position")
        .into_tuple()
        .one(conn)
        .await?;
    Ok(max.flatten())
}

/// Active entries ordered front to back.
pub async fn list_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    bucket: &Bucket,
) -> Result<Vec<waitlist_entries::Model>, DbErr> {
    active_in_bucket(bucket)
        .order_by_asc(waitlist_entries::Column::Position)
        .all(conn)
        .await
}

pub async fn create_entry(
    txn: &DatabaseTransaction,
    dto: EntryCreate,
) -> Result<waitlist_entries::Model, DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let entry = waitlist_entries::ActiveModel {
        id: NotSet,
        venue_id: Set(dto.venue_id),
        game_type: Set(dto.game_type),
        stakes: Set(dto.stakes),
        player_id: Set(dto.player_id),
        group_id: Set(dto.group_id),
        position: Set(dto.position),
        status: Set(EntryStatus::Waiting),
        signup_method: Set(dto.signup_method),
        call_count: Set(0),
        last_called_at: Set(None),
        seated_at: Set(None),
        removed_at: Set(None),
        removed_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    entry.insert(txn).await
}

async fn require(
    txn: &DatabaseTransaction,
    entry_id: i64,
) -> Result<waitlist_entries::Model, DbErr> {
    find_by_id(txn, entry_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("waitlist entry {entry_id}")))
}

/// Set CALLED, bump call_count and stamp last_called_at, guarded on the
/// entry still being active.
pub async fn mark_called(
    txn: &DatabaseTransaction,
    entry_id: i64,
    at: time::OffsetDateTime,
) -> Result<waitlist_entries::Model, DbErr> {
    let result = waitlist_entries::Entity::update_many()
        .col_expr(
            waitlist_entries::Column::Status,
            Expr::value(EntryStatus::Called),
        )
        .col_expr(
            waitlist_entries::Column::CallCount,
            Expr::col(waitlist_entries::Column::CallCount).add(1),
        )
        .col_expr(waitlist_entries::Column::LastCalledAt, Expr::value(at))
        .col_expr(waitlist_entries::Column::UpdatedAt, Expr::value(at))
        .filter(waitlist_entries::Column::Id.eq(entry_id))
        .filter(waitlist_entries::Column::Status.is_in(EntryStatus::active()))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale(format_args!("waitlist entry {entry_id}")));
    }
    require(txn, entry_id).await
}

/// Move an active entry to SEATED or REMOVED.
pub async fn close_entry(
    txn: &DatabaseTransaction,
    dto: EntryClose,
) -> Result<waitlist_entries::Model, DbErr> {
    let mut update = waitlist_entries::Entity::update_many()
        .col_expr(waitlist_entries::Column::Status, Expr::value(dto.to))
        .col_expr(waitlist_entries::Column::UpdatedAt, Expr::value(dto.at));
    update = match dto.to {
        EntryStatus::Seated => {
            update.col_expr(waitlist_entries::Column::SeatedAt, Expr::value(dto.at))
        }
        _ => update
            .col_expr(waitlist_entries::Column::RemovedAt, Expr::value(dto.at))
            .col_expr(
                waitlist_entries::Column::RemovedBy,
                Expr::value(dto.removed_by),
            ),
    };
    let result = update
        .filter(waitlist_entries::Column::Id.eq(dto.id))
        .filter(waitlist_entries::Column::Status.is_in(EntryStatus::active()))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale(format_args!("waitlist entry {}", dto.id)));
    }
    require(txn, dto.id).await
}

/// Decrement every active position behind `position`; returns rows shifted.
pub async fn shift_positions_after(
    txn: &DatabaseTransaction,
    bucket: &Bucket,
    position: i32,
) -> Result<u64, DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = waitlist_entries::Entity::update_many()
        .col_expr(
            waitlist_entries::Column::Position,
            Expr::col(waitlist_entries::Column::Position).sub(1),
        )
        .col_expr(waitlist_entries::Column::UpdatedAt, Expr::value(now))
        .filter(waitlist_entries::Column::VenueId.eq(bucket.venue_id))
        .filter(waitlist_entries::Column::GameType.eq(bucket.game_type.as_str()))
        .filter(waitlist_entries::Column::Stakes.eq(bucket.stakes.as_str()))
        .filter(waitlist_entries::Column::Status.is_in(EntryStatus::active()))
        .filter(waitlist_entries::Column::Position.gt(position))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}
