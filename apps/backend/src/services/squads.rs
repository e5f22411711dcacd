//! Squad Coordinator: group formation and promotion to a single waitlist entry.
//!
//! A squad moves FORMING → WAITING (submitted) → MATCHED (its entry seated),
//! or FORMING → DISBANDED (leader). The leader's member row is created with
//! the group and only leaves when the whole group does.
//!
//! Every mutation takes the squad lock before it looks at status or members,
//! and the squad lock is always taken before a bucket lock.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use tracing::{debug, info, warn};

use crate::auth::{ensure, Action, Caller, Subject};
use crate::config::policy::SeatingPolicy;
use crate::db::locking::{lock_bucket, lock_squad};
use crate::domain::{rules, Bucket};
use crate::entities::waitlist_entries::SignupMethod;
use crate::entities::waitlist_group_members::MemberStatus;
use crate::entities::waitlist_groups::GroupStatus;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::events::{DomainEvent, Outbox};
use crate::repos::squads::{self as squad_repo, Squad, SquadMember};
use crate::repos::waitlist::{self as waitlist_repo, WaitlistEntry};
use crate::services::waitlist::append;
use crate::utils::invite_code::{generate_invite_code, normalize_invite_code};

#[derive(Debug, Clone, Default)]
pub struct SquadService {
    policy: SeatingPolicy,
}

impl SquadService {
    pub fn new(policy: SeatingPolicy) -> Self {
        Self { policy }
    }

    /// Create a FORMING squad with `leader_id` as its confirmed leader.
    pub async fn create_squad(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        bucket: &Bucket,
        leader_id: i64,
        max_size: i32,
    ) -> Result<Squad, DomainError> {
        ensure(
            caller,
            Action::CreateSquad,
            &Subject::Squad {
                leader_id,
                member_id: None,
            },
        )?;
        rules::ensure_squad_size(max_size, &self.policy)?;

        // Look the code up before inserting: a failed INSERT would poison a Postgres txn.
        for attempt in 1..=self.policy.invite_code_attempts {
            let code = generate_invite_code(self.policy.invite_code_len);
            if squad_repo::find_by_code(txn, bucket.venue_id, &code)
                .await?
                .is_some()
            {
                debug!(attempt, venue_id = bucket.venue_id, "Invite code collision");
                continue;
            }
            let (squad, _leader) =
                squad_repo::create_squad(txn, bucket, leader_id, code, max_size).await?;
            info!(
                group_id = squad.id,
                leader_id,
                max_size,
                bucket = %bucket,
                "Squad created"
            );
            return Ok(squad);
        }

        warn!(
            venue_id = bucket.venue_id,
            attempts = self.policy.invite_code_attempts,
            "Could not find a free invite code"
        );
        Err(DomainError::conflict(
            ConflictKind::InviteCodeConflict,
            "Could not allocate a unique invite code; retry",
        ))
    }

    /// Add `player_id` to a forming squad. Self-joins count as direct joins
    /// for auto-confirmation; leader invites always start pending.
    pub async fn add_member(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::AddSquadMember,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: Some(player_id),
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        rules::ensure_forming(squad.id, squad.status)?;

        if squad_repo::find_active_member(txn, squad.id, player_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyMember,
                format!("Player {player_id} is already in squad {group_id}"),
            ));
        }
        let occupied = squad_repo::count_occupied(txn, squad.id).await?;
        if occupied >= u64::try_from(squad.max_size).unwrap_or(0) {
            return Err(DomainError::conflict(
                ConflictKind::GroupFull,
                format!("Squad {group_id} is full ({} players)", squad.max_size),
            ));
        }

        let direct = caller.player_id == player_id;
        let status = if direct && self.policy.auto_confirm_direct_join {
            MemberStatus::Confirmed
        } else {
            MemberStatus::Pending
        };
        let member = squad_repo::add_member(txn, squad.id, player_id, status).await?;
        info!(
            group_id,
            player_id,
            member_status = ?member.member_status,
            invited_by = caller.player_id,
            "Squad member added"
        );
        Ok(member)
    }

    /// Resolve an invite code and self-join.
    pub async fn join_by_code(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        venue_id: i64,
        invite_code: &str,
    ) -> Result<SquadMember, DomainError> {
        let code = normalize_invite_code(invite_code);
        let squad = squad_repo::find_by_code(txn, venue_id, &code)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Group, "No squad with that invite code")
            })?;
        self.add_member(txn, caller, squad.id, caller.player_id)
            .await
    }

    /// The invited player accepts.
    pub async fn confirm(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::RespondToInvite,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: Some(player_id),
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        rules::ensure_forming(squad.id, squad.status)?;
        let member = require_member(txn, squad.id, player_id).await?;
        rules::ensure_pending_member(player_id, member.member_status)?;

        let member = squad_repo::set_member_status(
            txn,
            member.id,
            MemberStatus::Pending,
            MemberStatus::Confirmed,
        )
        .await?;
        info!(group_id, player_id, "Squad invite confirmed");
        Ok(member)
    }

    /// The invited player refuses. The declined row stays; a later join
    /// creates a fresh one.
    pub async fn decline(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::RespondToInvite,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: Some(player_id),
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        let member = require_member(txn, squad.id, player_id).await?;
        rules::ensure_pending_member(player_id, member.member_status)?;

        let member = squad_repo::set_member_status(
            txn,
            member.id,
            MemberStatus::Pending,
            MemberStatus::Declined,
        )
        .await?;
        info!(group_id, player_id, "Squad invite declined");
        Ok(member)
    }

    pub async fn leave(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<(), DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::LeaveSquad,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: Some(player_id),
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        let member = require_member(txn, squad.id, player_id).await?;
        rules::ensure_can_leave(squad.id, squad.status, member.is_leader)?;

        if squad_repo::remove_member(txn, member.id).await? == 0 {
            return Err(DomainError::conflict(
                ConflictKind::ConcurrentWrite,
                format!("Membership for player {player_id} changed concurrently; retry"),
            ));
        }
        info!(group_id, player_id, "Player left squad");
        Ok(())
    }

    /// Leader-only teardown of a forming squad and its members. A forming
    /// squad never holds a waitlist entry, so there is no position to close.
    pub async fn disband(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        outbox: &mut Outbox,
    ) -> Result<Squad, DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::DisbandSquad,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: None,
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        rules::ensure_forming(squad.id, squad.status)?;

        let member_ids: Vec<i64> = squad_repo::list_members(txn, squad.id)
            .await?
            .into_iter()
            .map(|m| m.player_id)
            .collect();
        let deleted = squad_repo::remove_all_members(txn, squad.id).await?;
        let disbanded = squad_repo::transition_with_entry(
            txn,
            squad.id,
            GroupStatus::Forming,
            GroupStatus::Disbanded,
            None,
        )
        .await?;
        info!(group_id, deleted, "Squad disbanded");

        outbox.push(DomainEvent::SquadDisbanded {
            group_id,
            venue_id: squad.bucket.venue_id,
            member_ids,
        });
        Ok(disbanded)
    }

    /// Put the squad on the waitlist as one entry and move it to WAITING.
    pub async fn submit_to_waitlist(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        group_id: i64,
        outbox: &mut Outbox,
    ) -> Result<WaitlistEntry, DomainError> {
        let squad = require_squad(txn, group_id).await?;
        ensure(
            caller,
            Action::SubmitSquad,
            &Subject::Squad {
                leader_id: squad.leader_id,
                member_id: None,
            },
        )?;

        let squad = lock_and_reload(txn, squad.id).await?;
        rules::ensure_forming(squad.id, squad.status)?;
        let confirmed = squad_repo::count_confirmed(txn, squad.id).await?;
        rules::ensure_enough_confirmed(confirmed, &self.policy)?;

        lock_bucket(txn, &squad.bucket).await?;
        if let Some(existing) = waitlist_repo::find_active_for_group(txn, squad.id).await? {
            return Err(DomainError::conflict(
                ConflictKind::DuplicateEntry,
                format!("Squad {group_id} already holds entry {}", existing.id),
            ));
        }
        let entry = append(txn, &squad.bucket, None, Some(squad.id), SignupMethod::Squad).await?;
        squad_repo::transition_with_entry(
            txn,
            squad.id,
            GroupStatus::Forming,
            GroupStatus::Waiting,
            Some(entry.id),
        )
        .await?;
        info!(
            group_id,
            entry_id = entry.id,
            position = entry.position,
            confirmed,
            "Squad submitted to waitlist"
        );

        outbox.push(DomainEvent::SquadSubmitted {
            group_id,
            entry_id: entry.id,
        });
        Ok(entry)
    }

    pub async fn get_squad<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        group_id: i64,
    ) -> Result<Squad, DomainError> {
        require_squad(conn, group_id).await
    }

    pub async fn list_members<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        group_id: i64,
    ) -> Result<Vec<SquadMember>, DomainError> {
        require_squad(conn, group_id).await?;
        squad_repo::list_members(conn, group_id).await
    }
}

async fn require_squad<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
) -> Result<Squad, DomainError> {
    squad_repo::find_squad(conn, group_id)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Group, format!("Squad {group_id} not found"))
        })
}

/// Take the squad lock and re-read the row; status may have moved while we
/// waited.
async fn lock_and_reload(txn: &DatabaseTransaction, group_id: i64) -> Result<Squad, DomainError> {
    lock_squad(txn, group_id).await?;
    require_squad(txn, group_id).await
}

async fn require_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    group_id: i64,
    player_id: i64,
) -> Result<SquadMember, DomainError> {
    squad_repo::find_active_member(conn, group_id, player_id)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Member,
                format!("Player {player_id} is not in squad {group_id}"),
            )
        })
}
