use seatline::entities::waitlist_entries::{EntryStatus, SignupMethod};
use seatline::{AppError, Caller, ErrorCode, ErrorKind};

use crate::support::factory::{fresh_bucket, player, staff_at, Harness};

#[tokio::test]
async fn joins_append_to_the_back() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();

    let mut positions = Vec::new();
    for _ in 0..3 {
        let p = player();
        let entry = h
            .core
            .join_waitlist(&p, bucket.clone(), p.player_id, SignupMethod::App)
            .await?;
        assert_eq!(entry.status, EntryStatus::Waiting);
        assert_eq!(entry.call_count, 0);
        positions.push(entry.position);
    }
    assert_eq!(positions, vec![1, 2, 3]);

    let wait = h.core.estimated_wait_minutes(bucket.clone()).await?;
    assert_eq!(wait, 45);

    let other = fresh_bucket();
    let p = player();
    let first = h
        .core
        .join_waitlist(&p, other.clone(), p.player_id, SignupMethod::Kiosk)
        .await?;
    assert_eq!(first.position, 1, "buckets are ordered independently");
    assert_eq!(h.core.estimated_wait_minutes(fresh_bucket()).await?, 0);

    h.finish().await
}

#[tokio::test]
async fn second_active_entry_is_rejected() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let p = player();

    h.core
        .join_waitlist(&p, bucket.clone(), p.player_id, SignupMethod::App)
        .await?;
    let err = h
        .core
        .join_waitlist(&p, bucket.clone(), p.player_id, SignupMethod::App)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateEntry);
    assert_eq!(err.kind(), ErrorKind::DuplicateEntry);
    assert!(!err.is_retryable());

    assert_eq!(h.core.list_bucket(bucket).await?.len(), 1);
    h.finish().await
}

#[tokio::test]
async fn staff_may_join_on_behalf_of_players() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let staff = staff_at(bucket.venue_id);
    let p = player();

    let entry = h
        .core
        .join_waitlist(&staff, bucket.clone(), p.player_id, SignupMethod::Staff)
        .await?;
    assert_eq!(entry.player_id, Some(p.player_id));

    // Another player without permissions cannot.
    let stranger = player();
    let err = h
        .core
        .join_waitlist(&stranger, bucket.clone(), player().player_id, SignupMethod::App)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingPermission);
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Squad entries only come from submitting a squad.
    let err = h
        .core
        .join_waitlist(&p, fresh_bucket(), p.player_id, SignupMethod::Squad)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    h.finish().await
}

#[tokio::test]
async fn call_then_seat_closes_the_gap() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let staff = staff_at(bucket.venue_id);
    let players: Vec<Caller> = (0..3).map(|_| player()).collect();

    let mut entries = Vec::new();
    for p in &players {
        entries.push(
            h.core
                .join_waitlist(p, bucket.clone(), p.player_id, SignupMethod::App)
                .await?,
        );
    }

    // Seating requires a prior call.
    let err = h.core.seat_entry(&staff, entries[0].id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let called = h.core.call_entry(&staff, entries[0].id).await?;
    assert_eq!(called.status, EntryStatus::Called);
    assert_eq!(called.call_count, 1);
    assert!(called.last_called_at.is_some());

    let again = h.core.call_entry(&staff, entries[0].id).await?;
    assert_eq!(again.call_count, 2);

    let seated = h.core.seat_entry(&staff, entries[0].id).await?;
    assert_eq!(seated.status, EntryStatus::Seated);
    assert!(seated.seated_at.is_some());

    let remaining = h.core.list_bucket(bucket.clone()).await?;
    let positions: Vec<i32> = remaining.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(remaining[0].id, entries[1].id);

    // Seated is terminal.
    let err = h.core.call_entry(&staff, entries[0].id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    assert_eq!(
        h.event_names(),
        vec!["entry_called", "entry_called", "entry_seated"]
    );
    h.finish().await
}

#[tokio::test]
async fn removal_shifts_everyone_behind() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let players: Vec<Caller> = (0..4).map(|_| player()).collect();

    let mut ids = Vec::new();
    for p in &players {
        ids.push(
            h.core
                .join_waitlist(p, bucket.clone(), p.player_id, SignupMethod::App)
                .await?
                .id,
        );
    }

    // Owner removes their own entry from the middle.
    let removed = h.core.remove_entry(&players[1], ids[1]).await?;
    assert_eq!(removed.status, EntryStatus::Removed);
    assert_eq!(removed.removed_by, Some(players[1].player_id));

    let remaining = h.core.list_bucket(bucket.clone()).await?;
    let by_id: Vec<(i64, i32)> = remaining.iter().map(|e| (e.id, e.position)).collect();
    assert_eq!(by_id, vec![(ids[0], 1), (ids[2], 2), (ids[3], 3)]);

    // A removed player may rejoin and lands at the back.
    let back = h
        .core
        .join_waitlist(
            &players[1],
            bucket.clone(),
            players[1].player_id,
            SignupMethod::App,
        )
        .await?;
    assert_eq!(back.position, 4);

    let found = h
        .core
        .find_active_entry(bucket.clone(), players[1].player_id)
        .await?;
    assert_eq!(found.map(|e| e.id), Some(back.id));

    h.finish().await
}

#[tokio::test]
async fn only_owner_or_staff_may_remove() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let owner = player();
    let entry = h
        .core
        .join_waitlist(&owner, bucket.clone(), owner.player_id, SignupMethod::App)
        .await?;

    let err = h.core.remove_entry(&player(), entry.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotEntryOwner);

    let err = h.core.call_entry(&owner, entry.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingPermission);

    // Staff of another venue hold no permission here.
    let elsewhere = staff_at(bucket.venue_id + 1);
    let err = h.core.seat_entry(&elsewhere, entry.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingPermission);

    let staff = staff_at(bucket.venue_id);
    let removed = h.core.remove_entry(&staff, entry.id).await?;
    assert_eq!(removed.removed_by, Some(staff.player_id));

    let err = h.core.remove_entry(&staff, entry.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    h.finish().await
}

#[tokio::test]
async fn unknown_entry_is_not_found() -> Result<(), AppError> {
    let h = Harness::new().await?;
    let staff = staff_at(1);

    let err = h.core.get_entry(i64::MAX).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EntryNotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h.core.call_entry(&staff, i64::MAX).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EntryNotFound);

    h.finish().await
}
