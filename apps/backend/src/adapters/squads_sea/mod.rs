//! SeaORM adapter for squads and their members.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::stale;
use crate::entities::waitlist_group_members::{self, MemberStatus};
use crate::entities::waitlist_groups;

pub mod dto;

pub use dto::{GroupCreate, GroupTransition, MemberCreate};

pub async fn find_group<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Option<waitlist_groups::Model>, DbErr> {
    waitlist_groups::Entity::find_by_id(group_id).one(conn).await
}

pub async fn find_group_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    venue_id: i64,
    invite_code: &str,
) -> Result<Option<waitlist_groups::Model>, DbErr> {
    waitlist_groups::Entity::find()
        .filter(waitlist_groups::Column::VenueId.eq(venue_id))
        .filter(waitlist_groups::Column::InviteCode.eq(invite_code))
        .one(conn)
        .await
}

pub async fn create_group(
    txn: &DatabaseTransaction,
    dto: GroupCreate,
) -> Result<waitlist_groups::Model, DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let group = waitlist_groups::ActiveModel {
        id: NotSet,
        venue_id: Set(dto.venue_id),
        game_type: Set(dto.game_type),
        stakes: Set(dto.stakes),
        leader_id: Set(dto.leader_id),
        invite_code: Set(dto.invite_code),
        max_size: Set(dto.max_size),
        status: Set(waitlist_groups::GroupStatus::Forming),
        entry_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    group.insert(txn).await
}

pub async fn transition_group(
    txn: &DatabaseTransaction,
    dto: GroupTransition,
) -> Result<waitlist_groups::Model, DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let mut update = waitlist_groups::Entity::update_many()
        .col_expr(waitlist_groups::Column::Status, Expr::value(dto.to))
        .col_expr(waitlist_groups::Column::UpdatedAt, Expr::value(now));
    if let Some(entry_id) = dto.entry_id {
        update = update.col_expr(waitlist_groups::Column::EntryId, Expr::value(entry_id));
    }
    let result = update
        .filter(waitlist_groups::Column::Id.eq(dto.id))
        .filter(waitlist_groups::Column::Status.is_in(dto.from))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale(format_args!("squad {}", dto.id)));
    }
    find_group(txn, dto.id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("squad {}", dto.id)))
}

/// The player's non-declined row in the group, if any.
pub async fn find_active_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
    player_id: i64,
) -> Result<Option<waitlist_group_members::Model>, DbErr> {
    waitlist_group_members::Entity::find()
        .filter(waitlist_group_members::Column::GroupId.eq(group_id))
        .filter(waitlist_group_members::Column::PlayerId.eq(player_id))
        .filter(waitlist_group_members::Column::MemberStatus.ne(MemberStatus::Declined))
        .one(conn)
        .await
}

/// Every member row, declined ones included, in join order.
pub async fn list_members<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Vec<waitlist_group_members::Model>, DbErr> {
    waitlist_group_members::Entity::find()
        .filter(waitlist_group_members::Column::GroupId.eq(group_id))
        .order_by_asc(waitlist_group_members::Column::JoinedAt)
        .order_by_asc(waitlist_group_members::Column::Id)
        .all(conn)
        .await
}

pub async fn count_members_with_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
    statuses: &[MemberStatus],
) -> Result<u64, DbErr> {
    waitlist_group_members::Entity::find()
        .filter(waitlist_group_members::Column::GroupId.eq(group_id))
        .filter(waitlist_group_members::Column::MemberStatus.is_in(statuses.iter().copied()))
        .count(conn)
        .await
}

pub async fn create_member(
    txn: &DatabaseTransaction,
    dto: MemberCreate,
) -> Result<waitlist_group_members::Model, DbErr> {
    let member = waitlist_group_members::ActiveModel {
        id: NotSet,
        group_id: Set(dto.group_id),
        player_id: Set(dto.player_id),
        is_leader: Set(dto.is_leader),
        member_status: Set(dto.member_status),
        joined_at: Set(time::OffsetDateTime::now_utc()),
    };
    member.insert(txn).await
}

/// Guarded member status change from `from` to `to`.
pub async fn set_member_status(
    txn: &DatabaseTransaction,
    member_id: i64,
    from: MemberStatus,
    to: MemberStatus,
) -> Result<waitlist_group_members::Model, DbErr> {
    let result = waitlist_group_members::Entity::update_many()
        .col_expr(waitlist_group_members::Column::MemberStatus, Expr::value(to))
        .filter(waitlist_group_members::Column::Id.eq(member_id))
        .filter(waitlist_group_members::Column::MemberStatus.eq(from))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale(format_args!("squad member {member_id}")));
    }
    waitlist_group_members::Entity::find_by_id(member_id)
        .one(txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("squad member {member_id}")))
}

/// Deletes a non-leader row. Leader rows only go with the whole group.
pub async fn delete_member(txn: &DatabaseTransaction, member_id: i64) -> Result<u64, DbErr> {
    let result = waitlist_group_members::Entity::delete_many()
        .filter(waitlist_group_members::Column::Id.eq(member_id))
        .filter(waitlist_group_members::Column::IsLeader.eq(false))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_all_members(txn: &DatabaseTransaction, group_id: i64) -> Result<u64, DbErr> {
    let result = waitlist_group_members::Entity::delete_many()
        .filter(waitlist_group_members::Column::GroupId.eq(group_id))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}
