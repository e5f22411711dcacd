use backend_test_support::unique_helpers::unique_id;
use seatline::adapters::waitlist_sea::{self, EntryClose, EntryCreate};
use seatline::db::require_db;
use seatline::domain::Bucket;
use seatline::entities::waitlist_entries::{EntryStatus, SignupMethod};
use seatline::errors::domain::{ConflictKind, DomainError};
use seatline::infra::db_errors::map_db_err;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use time::OffsetDateTime;

use crate::support::factory::fresh_bucket;
use crate::support::test_state::build_test_state;

fn create(bucket: &Bucket, player_id: i64, position: i32) -> EntryCreate {
    EntryCreate {
        venue_id: bucket.venue_id,
        game_type: bucket.game_type.clone(),
        stakes: bucket.stakes.clone(),
        player_id: Some(player_id),
        group_id: None,
        position,
        signup_method: SignupMethod::App,
    }
}

async fn seed(txn: &DatabaseTransaction, bucket: &Bucket, n: i32) -> Vec<i64> {
    let mut ids = Vec::new();
    for position in 1..=n {
        let entry = waitlist_sea::create_entry(txn, create(bucket, unique_id(), position))
            .await
            .expect("insert entry");
        ids.push(entry.id);
    }
    ids
}

#[tokio::test]
async fn shift_only_touches_entries_behind() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let bucket = fresh_bucket();
    let other = fresh_bucket();

    let ids = seed(&txn, &bucket, 4).await;
    seed(&txn, &other, 3).await;

    waitlist_sea::close_entry(&txn, EntryClose::seated(ids[1], OffsetDateTime::now_utc()))
        .await?;
    let shifted = waitlist_sea::shift_positions_after(&txn, &bucket, 2).await?;
    assert_eq!(shifted, 2);

    let positions: Vec<(i64, i32)> = waitlist_sea::list_active(&txn, &bucket)
        .await?
        .iter()
        .map(|m| (m.id, m.position))
        .collect();
    assert_eq!(positions, vec![(ids[0], 1), (ids[2], 2), (ids[3], 3)]);

    // Neighbouring bucket is untouched.
    assert_eq!(waitlist_sea::max_active_position(&txn, &other).await?, Some(3));
    assert_eq!(
        waitlist_sea::max_active_position(&txn, &fresh_bucket()).await?,
        None
    );

    txn.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn guarded_updates_report_stale_rows() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let bucket = fresh_bucket();
    let ids = seed(&txn, &bucket, 1).await;
    let now = OffsetDateTime::now_utc();

    let called = waitlist_sea::mark_called(&txn, ids[0], now).await?;
    assert_eq!(called.status, EntryStatus::Called);
    assert_eq!(called.call_count, 1);

    let removed = waitlist_sea::close_entry(&txn, EntryClose::removed(ids[0], 7, now)).await?;
    assert_eq!(removed.status, EntryStatus::Removed);
    assert_eq!(removed.removed_by, Some(7));

    let err = waitlist_sea::mark_called(&txn, ids[0], now)
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));
    let err = waitlist_sea::close_entry(&txn, EntryClose::seated(ids[0], now))
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));

    txn.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn second_active_row_violates_the_partial_index() -> Result<(), Box<dyn std::error::Error>>
{
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let bucket = fresh_bucket();
    let player_id = unique_id();

    let first = waitlist_sea::create_entry(&txn, create(&bucket, player_id, 1)).await?;

    // A closed row does not count against the index.
    waitlist_sea::close_entry(
        &txn,
        EntryClose::removed(first.id, player_id, OffsetDateTime::now_utc()),
    )
    .await?;
    waitlist_sea::create_entry(&txn, create(&bucket, player_id, 1)).await?;

    // Postgres aborts the transaction on a failed insert, so this stays last.
    let err = waitlist_sea::create_entry(&txn, create(&bucket, player_id, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));

    txn.rollback().await?;
    Ok(())
}
