//! Squad repository functions for domain layer.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::squads_sea as squads_adapter;
use crate::domain::Bucket;
use crate::entities::waitlist_group_members::{self, MemberStatus};
use crate::entities::waitlist_groups::{self, GroupStatus};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Squad {
    pub id: i64,
    pub bucket: Bucket,
    pub leader_id: i64,
    pub invite_code: String,
    pub max_size: i32,
    pub status: GroupStatus,
    pub entry_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadMember {
    pub id: i64,
    pub group_id: i64,
    pub player_id: i64,
    pub is_leader: bool,
    pub member_status: MemberStatus,
    pub joined_at: OffsetDateTime,
}

pub async fn find_squad<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Option<Squad>, DomainError> {
    Ok(squads_adapter::find_group(conn, group_id)
        .await?
        .map(Squad::from))
}

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    venue_id: i64,
    invite_code: &str,
) -> Result<Option<Squad>, DomainError> {
    Ok(squads_adapter::find_group_by_code(conn, venue_id, invite_code)
        .await?
        .map(Squad::from))
}

/// Insert the group and its confirmed leader row.
pub async fn create_squad(
    txn: &DatabaseTransaction,
    bucket: &Bucket,
    leader_id: i64,
    invite_code: String,
    max_size: i32,
) -> Result<(Squad, SquadMember), DomainError> {
    let group = squads_adapter::create_group(
        txn,
        squads_adapter::GroupCreate {
            venue_id: bucket.venue_id,
            game_type: bucket.game_type.clone(),
            stakes: bucket.stakes.clone(),
            leader_id,
            invite_code,
            max_size,
        },
    )
    .await?;
    let leader = squads_adapter::create_member(
        txn,
        squads_adapter::MemberCreate {
            group_id: group.id,
            player_id: leader_id,
            is_leader: true,
            member_status: MemberStatus::Confirmed,
        },
    )
    .await?;
    Ok((Squad::from(group), SquadMember::from(leader)))
}

pub async fn transition(
    txn: &DatabaseTransaction,
    group_id: i64,
    from: GroupStatus,
    to: GroupStatus,
) -> Result<Squad, DomainError> {
    let dto = squads_adapter::GroupTransition::new(group_id, from, to);
    Ok(Squad::from(squads_adapter::transition_group(txn, dto).await?))
}

pub async fn transition_with_entry(
    txn: &DatabaseTransaction,
    group_id: i64,
    from: GroupStatus,
    to: GroupStatus,
    entry_id: Option<i64>,
) -> Result<Squad, DomainError> {
    let dto = squads_adapter::GroupTransition::new(group_id, from, to).with_entry(entry_id);
    Ok(Squad::from(squads_adapter::transition_group(txn, dto).await?))
}

pub async fn find_active_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
    player_id: i64,
) -> Result<Option<SquadMember>, DomainError> {
    Ok(squads_adapter::find_active_member(conn, group_id, player_id)
        .await?
        .map(SquadMember::from))
}

pub async fn list_members<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Vec<SquadMember>, DomainError> {
    let members = squads_adapter::list_members(conn, group_id).await?;
    Ok(members.into_iter().map(SquadMember::from).collect())
}

/// Pending plus confirmed rows: the seats a squad has promised.
pub async fn count_occupied<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<u64, DomainError> {
    Ok(squads_adapter::count_members_with_status(
        conn,
        group_id,
        &[MemberStatus::Pending, MemberStatus::Confirmed],
    )
    .await?)
}

pub async fn count_confirmed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<u64, DomainError> {
    Ok(
        squads_adapter::count_members_with_status(conn, group_id, &[MemberStatus::Confirmed])
            .await?,
    )
}

pub async fn add_member(
    txn: &DatabaseTransaction,
    group_id: i64,
    player_id: i64,
    member_status: MemberStatus,
) -> Result<SquadMember, DomainError> {
    let dto = squads_adapter::MemberCreate {
        group_id,
        player_id,
        is_leader: false,
        member_status,
    };
    Ok(SquadMember::from(
        squads_adapter::create_member(txn, dto).await?,
    ))
}

pub async fn set_member_status(
    txn: &DatabaseTransaction,
    member_id: i64,
    from: MemberStatus,
    to: MemberStatus,
) -> Result<SquadMember, DomainError> {
    Ok(SquadMember::from(
        squads_adapter::set_member_status(txn, member_id, from, to).await?,
    ))
}

pub async fn remove_member(txn: &DatabaseTransaction, member_id: i64) -> Result<u64, DomainError> {
    Ok(squads_adapter::delete_member(txn, member_id).await?)
}

pub async fn remove_all_members(
    txn: &DatabaseTransaction,
    group_id: i64,
) -> Result<u64, DomainError> {
    Ok(squads_adapter::delete_all_members(txn, group_id).await?)
}

impl From<waitlist_groups::Model> for Squad {
    fn from(model: waitlist_groups::Model) -> Self {
        Self {
            id: model.id,
            bucket: Bucket {
                venue_id: model.venue_id,
                game_type: model.game_type,
                stakes: model.stakes,
            },
            leader_id: model.leader_id,
            invite_code: model.invite_code,
            max_size: model.max_size,
            status: model.status,
            entry_id: model.entry_id,
            created_at: model.created_at,
        }
    }
}

impl From<waitlist_group_members::Model> for SquadMember {
    fn from(model: waitlist_group_members::Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            player_id: model.player_id,
            is_leader: model.is_leader,
            member_status: model.member_status,
            joined_at: model.joined_at,
        }
    }
}
