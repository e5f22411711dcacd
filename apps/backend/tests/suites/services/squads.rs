use seatline::config::policy::SeatingPolicy;
use seatline::entities::waitlist_entries::{EntryStatus, SignupMethod};
use seatline::entities::waitlist_group_members::MemberStatus;
use seatline::entities::waitlist_groups::GroupStatus;
use seatline::{AppError, Caller, ErrorCode, ErrorKind};

use crate::support::factory::{fresh_bucket, player, staff_at, Harness};

/// A forming squad of size `max_size` led by a fresh player.
async fn forming_squad(h: &Harness, max_size: i32) -> Result<(Caller, i64), AppError> {
    let leader = player();
    let squad = h
        .core
        .create_squad(&leader, fresh_bucket(), leader.player_id, max_size)
        .await?;
    Ok((leader, squad.id))
}

#[tokio::test]
async fn leader_creates_and_is_confirmed() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let leader = player();
    let bucket = fresh_bucket();

    let squad = h
        .core
        .create_squad(&leader, bucket.clone(), leader.player_id, 4)
        .await?;
    assert_eq!(squad.status, GroupStatus::Forming);
    assert_eq!(squad.leader_id, leader.player_id);
    assert_eq!(squad.bucket, bucket);
    assert_eq!(squad.invite_code.len(), 8);
    assert!(squad.entry_id.is_none());

    let members = h.core.list_squad_members(squad.id).await?;
    assert_eq!(members.len(), 1);
    assert!(members[0].is_leader);
    assert_eq!(members[0].member_status, MemberStatus::Confirmed);

    // Only the named leader may create.
    let err = h
        .core
        .create_squad(&player(), bucket.clone(), leader.player_id, 4)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotSquadLeader);

    for size in [1, 11] {
        let err = h
            .core
            .create_squad(&leader, bucket.clone(), leader.player_id, size)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidGroupSize);
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
    }

    h.finish().await
}

#[tokio::test]
async fn invite_confirm_decline_and_capacity() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let (leader, group_id) = forming_squad(&h, 3).await?;
    let a = player();
    let b = player();

    let invited = h
        .core
        .add_squad_member(&leader, group_id, a.player_id)
        .await?;
    assert_eq!(invited.member_status, MemberStatus::Pending);
    assert!(!invited.is_leader);

    let err = h
        .core
        .add_squad_member(&leader, group_id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyMember);

    h.core
        .add_squad_member(&leader, group_id, b.player_id)
        .await?;

    // Pending invites occupy a slot.
    let err = h
        .core
        .add_squad_member(&leader, group_id, player().player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GroupFull);
    assert_eq!(err.kind(), ErrorKind::GroupFull);

    // Only the invitee answers their invite.
    let err = h
        .core
        .confirm_squad_invite(&leader, group_id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let confirmed = h
        .core
        .confirm_squad_invite(&a, group_id, a.player_id)
        .await?;
    assert_eq!(confirmed.member_status, MemberStatus::Confirmed);

    let err = h
        .core
        .confirm_squad_invite(&a, group_id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    let declined = h
        .core
        .decline_squad_invite(&b, group_id, b.player_id)
        .await?;
    assert_eq!(declined.member_status, MemberStatus::Declined);

    // A declined slot is free again.
    h.core
        .add_squad_member(&leader, group_id, player().player_id)
        .await?;

    h.finish().await
}

#[tokio::test]
async fn join_by_code_is_case_insensitive() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let leader = player();
    let bucket = fresh_bucket();
    let squad = h
        .core
        .create_squad(&leader, bucket.clone(), leader.player_id, 4)
        .await?;

    let joiner = player();
    let code = squad.invite_code.to_lowercase();
    let member = h
        .core
        .join_squad_by_code(&joiner, bucket.venue_id, &code)
        .await?;
    assert_eq!(member.player_id, joiner.player_id);
    assert_eq!(member.member_status, MemberStatus::Pending);

    let err = h
        .core
        .join_squad_by_code(&player(), bucket.venue_id + 1, &squad.invite_code)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GroupNotFound);

    h.finish().await
}

#[tokio::test]
async fn direct_join_auto_confirms_when_enabled() -> Result<(), AppError> {
    let policy = SeatingPolicy {
        auto_confirm_direct_join: true,
        ..SeatingPolicy::default()
    };
    let h = Harness::with_policy(policy).await?;
    let (leader, group_id) = forming_squad(&h, 4).await?;

    let joiner = player();
    let member = h
        .core
        .add_squad_member(&joiner, group_id, joiner.player_id)
        .await?;
    assert_eq!(member.member_status, MemberStatus::Confirmed);

    // Leader invites still need an answer.
    let invited = h
        .core
        .add_squad_member(&leader, group_id, player().player_id)
        .await?;
    assert_eq!(invited.member_status, MemberStatus::Pending);

    h.finish().await
}

#[tokio::test]
async fn leaving_rules() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let (leader, group_id) = forming_squad(&h, 4).await?;
    let a = player();
    h.core
        .add_squad_member(&leader, group_id, a.player_id)
        .await?;

    let err = h
        .core
        .leave_squad(&leader, group_id, leader.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LeaderCannotLeave);
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let err = h
        .core
        .leave_squad(&leader, group_id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);

    h.core.leave_squad(&a, group_id, a.player_id).await?;
    let members = h.core.list_squad_members(group_id).await?;
    assert_eq!(members.len(), 1);

    let err = h
        .core
        .leave_squad(&a, group_id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemberNotFound);

    h.finish().await
}

#[tokio::test]
async fn submit_requires_confirmed_members() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let leader = player();
    let bucket = fresh_bucket();
    let squad = h
        .core
        .create_squad(&leader, bucket.clone(), leader.player_id, 4)
        .await?;
    let a = player();
    h.core.add_squad_member(&leader, squad.id, a.player_id).await?;

    let err = h.core.submit_squad(&leader, squad.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotEnoughConfirmed);

    h.core
        .confirm_squad_invite(&a, squad.id, a.player_id)
        .await?;

    let err = h.core.submit_squad(&a, squad.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotSquadLeader);

    // A solo player is already waiting; the squad lands behind them.
    let solo = player();
    h.core
        .join_waitlist(&solo, bucket.clone(), solo.player_id, SignupMethod::App)
        .await?;

    let entry = h.core.submit_squad(&leader, squad.id).await?;
    assert_eq!(entry.position, 2);
    assert_eq!(entry.group_id, Some(squad.id));
    assert_eq!(entry.player_id, None);
    assert_eq!(entry.signup_method, SignupMethod::Squad);

    let submitted = h.core.get_squad(squad.id).await?;
    assert_eq!(submitted.status, GroupStatus::Waiting);
    assert_eq!(submitted.entry_id, Some(entry.id));

    // Membership is frozen once submitted.
    let err = h
        .core
        .add_squad_member(&leader, squad.id, player().player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    let err = h
        .core
        .leave_squad(&a, squad.id, a.player_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotLeave);
    let err = h.core.submit_squad(&leader, squad.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    assert_eq!(h.event_names(), vec!["squad_submitted"]);
    h.finish().await
}

#[tokio::test]
async fn seating_a_squad_entry_matches_the_squad() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let leader = player();
    let bucket = fresh_bucket();
    let squad = h
        .core
        .create_squad(&leader, bucket.clone(), leader.player_id, 2)
        .await?;
    let a = player();
    h.core.add_squad_member(&leader, squad.id, a.player_id).await?;
    h.core
        .confirm_squad_invite(&a, squad.id, a.player_id)
        .await?;
    let entry = h.core.submit_squad(&leader, squad.id).await?;

    let staff = staff_at(bucket.venue_id);
    h.core.call_entry(&staff, entry.id).await?;
    let seated = h.core.seat_entry(&staff, entry.id).await?;
    assert_eq!(seated.status, EntryStatus::Seated);

    let matched = h.core.get_squad(squad.id).await?;
    assert_eq!(matched.status, GroupStatus::Matched);
    assert_eq!(
        h.event_names(),
        vec![
            "squad_submitted",
            "entry_called",
            "entry_seated",
            "squad_matched"
        ]
    );
    h.finish().await
}

#[tokio::test]
async fn staff_removing_a_squad_entry_disbands_it() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let leader = player();
    let bucket = fresh_bucket();
    let squad = h
        .core
        .create_squad(&leader, bucket.clone(), leader.player_id, 2)
        .await?;
    let a = player();
    h.core.add_squad_member(&leader, squad.id, a.player_id).await?;
    h.core
        .confirm_squad_invite(&a, squad.id, a.player_id)
        .await?;
    let entry = h.core.submit_squad(&leader, squad.id).await?;

    let solo = player();
    let behind = h
        .core
        .join_waitlist(&solo, bucket.clone(), solo.player_id, SignupMethod::App)
        .await?;
    assert_eq!(behind.position, 2);

    // A submitted squad's entry belongs to no player, not even the leader.
    assert_eq!(entry.player_id, None);
    for caller in [&a, &leader] {
        let err = h.core.remove_entry(caller, entry.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotEntryOwner);
    }
    assert_eq!(h.core.get_squad(squad.id).await?.status, GroupStatus::Waiting);

    h.core
        .remove_entry(&staff_at(bucket.venue_id), entry.id)
        .await?;

    let disbanded = h.core.get_squad(squad.id).await?;
    assert_eq!(disbanded.status, GroupStatus::Disbanded);
    assert!(h.core.list_squad_members(squad.id).await?.is_empty());

    let remaining = h.core.list_bucket(bucket).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, behind.id);
    assert_eq!(remaining[0].position, 1);

    h.finish().await
}

#[tokio::test]
async fn disband_is_leader_only_while_forming() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let (leader, group_id) = forming_squad(&h, 4).await?;
    let a = player();
    h.core
        .add_squad_member(&leader, group_id, a.player_id)
        .await?;

    let err = h.core.disband_squad(&a, group_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotSquadLeader);

    let squad = h.core.disband_squad(&leader, group_id).await?;
    assert_eq!(squad.status, GroupStatus::Disbanded);
    assert!(h.core.list_squad_members(group_id).await?.is_empty());

    let err = h.core.disband_squad(&leader, group_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    let events = h.events.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        seatline::DomainEvent::SquadDisbanded { member_ids, .. } => {
            assert_eq!(member_ids.len(), 2);
            assert!(member_ids.contains(&a.player_id));
        }
        other => panic!("unexpected event {other:?}"),
    }

    h.finish().await
}

#[tokio::test]
async fn unknown_squad_is_not_found() -> Result<(), AppError> {
    let h = Harness::new().await?;

    let err = h.core.get_squad(i64::MAX).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::GroupNotFound);
    let err = h
        .core
        .add_squad_member(&player(), i64::MAX, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GroupNotFound);

    h.finish().await
}
