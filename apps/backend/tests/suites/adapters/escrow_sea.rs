use backend_test_support::unique_helpers::unique_id;
use seatline::adapters::escrow_sea::{self, DepositCreate, EscrowTransition};
use seatline::db::require_db;
use seatline::entities::escrow_transactions::EscrowStatus;
use seatline::errors::domain::{ConflictKind, DomainError};
use seatline::infra::db_errors::map_db_err;
use sea_orm::TransactionTrait;
use time::OffsetDateTime;

use crate::support::test_state::build_test_state;

fn deposit(home_game_id: i64, player_id: i64, amount: i64) -> DepositCreate {
    DepositCreate {
        home_game_id,
        player_id,
        amount,
        payment_method: "cash".into(),
        payment_reference: None,
    }
}

#[tokio::test]
async fn transitions_are_guarded_on_status() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let game = unique_id();
    let player = unique_id();
    let now = OffsetDateTime::now_utc();

    let tx = escrow_sea::create_deposit(&txn, deposit(game, player, 400)).await?;
    assert_eq!(tx.status, EscrowStatus::Pending);

    let held = escrow_sea::transition(
        &txn,
        EscrowTransition::held(tx.id, now, Some("ref-1".into())),
    )
    .await?;
    assert_eq!(held.status, EscrowStatus::Held);
    assert_eq!(held.payment_reference.as_deref(), Some("ref-1"));

    // HELD cannot be held again.
    let err = escrow_sea::transition(&txn, EscrowTransition::held(tx.id, now, None))
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));

    let released =
        escrow_sea::transition(&txn, EscrowTransition::released(tx.id, now, 99)).await?;
    assert_eq!(released.released_to, Some(99));

    let err = escrow_sea::transition(&txn, EscrowTransition::refunded(tx.id, now, None))
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));

    assert_eq!(escrow_sea::count_for_player(&txn, game, player).await?, 1);
    assert!(escrow_sea::find_open_for_player(&txn, game, player)
        .await?
        .is_none());

    txn.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn list_filters_by_status() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let game = unique_id();
    let now = OffsetDateTime::now_utc();

    let a = escrow_sea::create_deposit(&txn, deposit(game, unique_id(), 100)).await?;
    let b = escrow_sea::create_deposit(&txn, deposit(game, unique_id(), 200)).await?;
    escrow_sea::create_deposit(&txn, deposit(unique_id(), unique_id(), 300)).await?;
    escrow_sea::transition(&txn, EscrowTransition::refunded(b.id, now, Some("no show".into())))
        .await?;

    let all = escrow_sea::list_for_game(&txn, game, None).await?;
    assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id, b.id]);

    let refunded = escrow_sea::list_for_game(&txn, game, Some(EscrowStatus::Refunded)).await?;
    assert_eq!(refunded.len(), 1);
    assert_eq!(refunded[0].notes.as_deref(), Some("no show"));

    txn.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn second_open_deposit_violates_the_partial_index(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let txn = require_db(&state)?.begin().await?;
    let game = unique_id();
    let player = unique_id();

    let first = escrow_sea::create_deposit(&txn, deposit(game, player, 100)).await?;
    escrow_sea::transition(
        &txn,
        EscrowTransition::released(first.id, OffsetDateTime::now_utc(), 1),
    )
    .await?;
    escrow_sea::create_deposit(&txn, deposit(game, player, 100)).await?;

    // Postgres aborts the transaction on a failed insert, so this stays last.
    let err = escrow_sea::create_deposit(&txn, deposit(game, player, 100))
        .await
        .unwrap_err();
    assert!(matches!(
        map_db_err(err),
        DomainError::Conflict(ConflictKind::ConcurrentWrite, _)
    ));

    txn.rollback().await?;
    Ok(())
}
