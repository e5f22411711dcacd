// Two real transactions racing on one bucket, one squad and one deposit slot.
// The first side does its write and holds its transaction open; the second is
// spawned, must still be blocked on the lock after a pause, and only proceeds
// once the first commits. Postgres only: on SQLite the single writer never lets
// the two sides interleave. Rows written here are committed, and unique ids keep
// them apart from other runs.

use std::sync::Arc;
use std::time::Duration;

use seatline::config::db::DbKind;
use seatline::db::require_db;
use seatline::db::txn::SharedTxn;
use seatline::directory::{HomeGame, HomeGameStatus, StaticHomeGameDirectory};
use seatline::entities::escrow_transactions::EscrowStatus;
use seatline::entities::waitlist_entries::SignupMethod;
use seatline::entities::waitlist_groups::GroupStatus;
use seatline::{AppError, AppState, Caller, DepositRequest, ErrorCode, SeatingCore};
use tokio::task::JoinHandle;

use crate::support::factory::{fresh_bucket, player, staff_at};
use crate::support::test_state::{resolve_test_db_kind, test_state_builder};

const BLOCKED_FOR: Duration = Duration::from_millis(250);

fn skip_unless_postgres(test_name: &str) -> Result<bool, AppError> {
    let db_kind = resolve_test_db_kind()?;
    if db_kind != DbKind::Postgres {
        println!("Skipping {test_name} for DbKind::{db_kind:?}");
        return Ok(true);
    }
    Ok(false)
}

/// Committing state shared by both sides of a race.
struct Race {
    state: AppState,
    directory: Arc<StaticHomeGameDirectory>,
}

impl Race {
    async fn new() -> Result<Self, AppError> {
        let directory = Arc::new(StaticHomeGameDirectory::new());
        let state = test_state_builder()?
            .with_directory(directory.clone())
            .build()
            .await?;
        Ok(Self { state, directory })
    }

    /// A core bound to its own open transaction.
    async fn side(&self) -> Result<(SeatingCore, SharedTxn), AppError> {
        let txn = SharedTxn::open(require_db(&self.state)?).await?;
        let core = SeatingCore::new(self.state.clone()).with_shared_txn(txn.clone());
        Ok((core, txn))
    }

    /// Run `op` in a transaction of its own and commit it.
    async fn committed<T, F, Fut>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(SeatingCore) -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        let (core, txn) = self.side().await?;
        let out = op(core).await?;
        txn.commit().await?;
        Ok(out)
    }

    /// Reads outside either side's transaction.
    fn reader(&self) -> SeatingCore {
        SeatingCore::new(self.state.clone())
    }
}

/// Spawn `op` on its own transaction. It ends the way `op` did: commit on Ok,
/// rollback on Err.
fn spawn_side<T, F, Fut>(
    core: SeatingCore,
    txn: SharedTxn,
    op: F,
) -> JoinHandle<Result<T, AppError>>
where
    T: Send + 'static,
    F: FnOnce(SeatingCore) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<T, AppError>> + Send + 'static,
{
    tokio::spawn(async move {
        let out = op(core).await;
        match out {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    })
}

async fn assert_still_blocked<T>(handle: &JoinHandle<T>) {
    tokio::time::sleep(BLOCKED_FOR).await;
    assert!(
        !handle.is_finished(),
        "second transaction should wait for the first to commit"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn removals_racing_in_one_bucket_keep_positions_dense() -> Result<(), AppError> {
    if skip_unless_postgres("removals_racing_in_one_bucket_keep_positions_dense")? {
        return Ok(());
    }
    let race = Race::new().await?;
    let bucket = fresh_bucket();
    let staff = staff_at(bucket.venue_id);

    let players: Vec<Caller> = (0..4).map(|_| player()).collect();
    let mut entries = Vec::new();
    for p in &players {
        let b = bucket.clone();
        let entry = race
            .committed(|core| async move {
                core.join_waitlist(p, b, p.player_id, SignupMethod::App).await
            })
            .await?;
        entries.push(entry);
    }

    let (core_a, txn_a) = race.side().await?;
    core_a.remove_entry(&staff, entries[0].id).await?;

    // Read at position 3 before the lock, sits at 2 once A commits.
    let (core_b, txn_b) = race.side().await?;
    let (staff_b, third) = (staff.clone(), entries[2].id);
    let b = spawn_side(core_b, txn_b, move |core| async move {
        core.remove_entry(&staff_b, third).await
    });
    assert_still_blocked(&b).await;

    drop(core_a);
    txn_a.commit().await?;
    b.await.expect("side B panicked")?;

    let left = race.reader().list_bucket(bucket).await?;
    let positions: Vec<i32> = left.iter().map(|e| e.position).collect();
    let ids: Vec<i64> = left.iter().map(|e| e.id).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(ids, vec![entries[1].id, entries[3].id]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn join_behind_a_pending_removal_lands_at_the_back() -> Result<(), AppError> {
    if skip_unless_postgres("join_behind_a_pending_removal_lands_at_the_back")? {
        return Ok(());
    }
    let race = Race::new().await?;
    let bucket = fresh_bucket();
    let staff = staff_at(bucket.venue_id);

    let mut entries = Vec::new();
    for _ in 0..3 {
        let (p, b) = (player(), bucket.clone());
        let entry = race
            .committed(|core| async move {
                core.join_waitlist(&p, b, p.player_id, SignupMethod::Kiosk)
                    .await
            })
            .await?;
        entries.push(entry);
    }

    let (core_a, txn_a) = race.side().await?;
    core_a.remove_entry(&staff, entries[1].id).await?;

    let (core_b, txn_b) = race.side().await?;
    let (late, b_bucket) = (player(), bucket.clone());
    let b = spawn_side(core_b, txn_b, move |core| async move {
        core.join_waitlist(&late, b_bucket, late.player_id, SignupMethod::App)
            .await
    });
    assert_still_blocked(&b).await;

    drop(core_a);
    txn_a.commit().await?;
    let joined = b.await.expect("side B panicked")?;
    assert_eq!(joined.position, 3);

    let positions: Vec<i32> = race
        .reader()
        .list_bucket(bucket)
        .await?
        .iter()
        .map(|e| e.position)
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leaving_while_the_squad_is_submitted_is_refused() -> Result<(), AppError> {
    if skip_unless_postgres("leaving_while_the_squad_is_submitted_is_refused")? {
        return Ok(());
    }
    let race = Race::new().await?;
    let (leader, member) = (player(), player());
    let squad = {
        let (leader, member) = (leader.clone(), member.clone());
        race.committed(|core| async move {
            let squad = core
                .create_squad(&leader, fresh_bucket(), leader.player_id, 3)
                .await?;
            core.add_squad_member(&leader, squad.id, member.player_id)
                .await?;
            core.confirm_squad_invite(&member, squad.id, member.player_id)
                .await?;
            Ok(squad)
        })
        .await?
    };

    let (core_a, txn_a) = race.side().await?;
    core_a.submit_squad(&leader, squad.id).await?;

    let (core_b, txn_b) = race.side().await?;
    let (leaver, group_id) = (member.clone(), squad.id);
    let b = spawn_side(core_b, txn_b, move |core| async move {
        core.leave_squad(&leaver, group_id, leaver.player_id).await
    });
    assert_still_blocked(&b).await;

    // A late invite queues behind the same lock.
    let (core_c, txn_c) = race.side().await?;
    let (inviter, newcomer) = (leader.clone(), player().player_id);
    let c = spawn_side(core_c, txn_c, move |core| async move {
        core.add_squad_member(&inviter, group_id, newcomer).await
    });
    assert_still_blocked(&c).await;

    drop(core_a);
    txn_a.commit().await?;

    let err = b.await.expect("side B panicked").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotLeave);
    let err = c.await.expect("side C panicked").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTransition);

    let reader = race.reader();
    assert_eq!(reader.get_squad(squad.id).await?.status, GroupStatus::Waiting);
    assert_eq!(reader.list_squad_members(squad.id).await?.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn simultaneous_deposits_leave_one_open() -> Result<(), AppError> {
    if skip_unless_postgres("simultaneous_deposits_leave_one_open")? {
        return Ok(());
    }
    let race = Race::new().await?;
    let (host, depositor) = (player(), player());
    let game = backend_test_support::unique_helpers::unique_id();
    race.directory.upsert(HomeGame {
        id: game,
        host_id: host.player_id,
        venue_id: None,
        buyin_min: None,
        buyin_max: None,
        status: HomeGameStatus::Scheduled,
    });
    let request = || DepositRequest {
        home_game_id: game,
        amount: 200,
        payment_method: "card".to_string(),
        payment_reference: None,
    };

    let (core_a, txn_a) = race.side().await?;
    core_a.deposit(&depositor, request()).await?;

    let (core_b, txn_b) = race.side().await?;
    let (again, second) = (depositor.clone(), request());
    let b = spawn_side(core_b, txn_b, move |core| async move {
        core.deposit(&again, second).await
    });
    assert_still_blocked(&b).await;

    drop(core_a);
    txn_a.commit().await?;

    let err = b.await.expect("side B panicked").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExistingDeposit);

    let open = race
        .reader()
        .list_escrow(&host, game, Some(EscrowStatus::Pending))
        .await?;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].player_id, depositor.player_id);
    Ok(())
}
