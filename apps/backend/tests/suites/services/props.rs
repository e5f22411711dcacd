include!("../../common/proptest_prelude.rs");

use proptest::prelude::*;
use seatline::entities::waitlist_entries::SignupMethod;
use seatline::{AppError, Caller, ErrorCode, SeatingCore};

use crate::support::factory::{fresh_bucket, player, staff_at, Harness};

#[derive(Debug, Clone, Copy)]
enum Op {
    Join,
    Remove(usize),
    Seat(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Join),
        1 => (0usize..8).prop_map(Op::Remove),
        1 => (0usize..8).prop_map(Op::Seat),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

async fn active_positions(core: &SeatingCore, bucket: &seatline::Bucket) -> Vec<i32> {
    core.list_bucket(bucket.clone())
        .await
        .expect("list bucket")
        .iter()
        .map(|e| e.position)
        .collect()
}

async fn run_ops(ops: Vec<Op>) -> Result<(), AppError> {
    let h = Harness::new().await?;
    let bucket = fresh_bucket();
    let staff = staff_at(bucket.venue_id);
    let mut waiting: Vec<(Caller, i64)> = Vec::new();

    for op in ops {
        match op {
            Op::Join => {
                let p = player();
                let entry = h
                    .core
                    .join_waitlist(&p, bucket.clone(), p.player_id, SignupMethod::App)
                    .await?;
                assert_eq!(entry.position as usize, waiting.len() + 1);
                waiting.push((p, entry.id));
            }
            Op::Remove(i) if !waiting.is_empty() => {
                let (owner, id) = waiting.remove(i % waiting.len());
                h.core.remove_entry(&owner, id).await?;
            }
            Op::Seat(i) if !waiting.is_empty() => {
                let (_, id) = waiting.remove(i % waiting.len());
                h.core.call_entry(&staff, id).await?;
                h.core.seat_entry(&staff, id).await?;
            }
            _ => {}
        }

        let positions = active_positions(&h.core, &bucket).await;
        let expected: Vec<i32> = (1..=waiting.len() as i32).collect();
        assert_eq!(positions, expected, "positions must stay 1..=n");

        let ids: Vec<i64> = h
            .core
            .list_bucket(bucket.clone())
            .await?
            .iter()
            .map(|e| e.id)
            .collect();
        let order: Vec<i64> = waiting.iter().map(|(_, id)| *id).collect();
        assert_eq!(ids, order, "relative order is preserved");
    }

    h.finish().await
}

async fn deposit_attempts(amounts: Vec<i64>) -> Result<(), AppError> {
    let h = Harness::new().await?;
    let host = player();
    let game = h.home_game(host.player_id, None, None);
    let p = player();

    let mut open = 0;
    for amount in amounts {
        let request = seatline::DepositRequest {
            home_game_id: game,
            amount,
            payment_method: "cash".into(),
            payment_reference: None,
        };
        match h.core.deposit(&p, request).await {
            Ok(_) => open += 1,
            Err(err) => assert_eq!(err.code(), ErrorCode::ExistingDeposit),
        }
    }
    assert_eq!(open, 1, "exactly one open deposit per player and game");

    let listed = h.core.list_escrow(&host, game, None).await?;
    assert_eq!(listed.len(), 1);
    h.finish().await
}

proptest! {
    #![proptest_config(proptest_prelude_config())]

    #[test]
    fn waitlist_positions_stay_dense(ops in prop::collection::vec(op(), 1..16)) {
        runtime().block_on(run_ops(ops)).expect("ops succeed");
    }

    #[test]
    fn repeated_deposits_leave_one_open(amounts in prop::collection::vec(1i64..10_000, 1..6)) {
        runtime().block_on(deposit_attempts(amounts)).expect("deposits succeed");
    }
}
