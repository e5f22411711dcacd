//! `SeatingCore`: the synchronous operation surface collaborators call.
//!
//! Every operation runs in exactly one database transaction. Events gathered
//! by the services are published only after that transaction commits.

use sea_orm::DatabaseTransaction;
use tracing::debug;

use crate::auth::Caller;
use crate::db::txn::{with_txn, SharedTxn, TxnFuture};
use crate::domain::Bucket;
use crate::entities::escrow_transactions::EscrowStatus;
use crate::entities::waitlist_entries::SignupMethod;
use crate::error::AppError;
use crate::events::Outbox;
use crate::repos::escrow::EscrowTransaction;
use crate::repos::squads::{Squad, SquadMember};
use crate::repos::waitlist::WaitlistEntry;
use crate::services::{DepositRequest, EscrowService, EscrowSummary, SquadService, WaitlistService};
use crate::state::app_state::AppState;

#[derive(Clone)]
pub struct SeatingCore {
    state: AppState,
    shared: Option<SharedTxn>,
    waitlist: WaitlistService,
    squads: SquadService,
    escrow: EscrowService,
}

impl SeatingCore {
    pub fn new(state: AppState) -> Self {
        Self {
            waitlist: WaitlistService::new(state.policy.clone()),
            squads: SquadService::new(state.policy.clone()),
            escrow: EscrowService::new(state.directory.clone()),
            shared: None,
            state,
        }
    }

    /// Run every operation inside `shared` instead of a fresh transaction.
    pub fn with_shared_txn(mut self, shared: SharedTxn) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c DatabaseTransaction, &'c mut Outbox) -> TxnFuture<'c, T>
            + Send
            + 'static,
    {
        let (value, outbox) = with_txn(self.shared.as_ref(), &self.state, move |txn| {
            Box::pin(async move {
                let mut outbox = Outbox::new();
                let value = f(txn, &mut outbox).await?;
                Ok::<_, AppError>((value, outbox))
            })
        })
        .await?;

        debug!(op, events = outbox.len(), "seating op finished");
        outbox.publish_to(self.state.events.as_ref());
        Ok(value)
    }

    // ----- Position Ledger -----

    pub async fn join_waitlist(
        &self,
        caller: &Caller,
        bucket: Bucket,
        player_id: i64,
        signup_method: SignupMethod,
    ) -> Result<WaitlistEntry, AppError> {
        let svc = self.waitlist.clone();
        let caller = caller.clone();
        self.run("waitlist.join", move |txn, _| {
            Box::pin(async move {
                svc.join(txn, &caller, &bucket, player_id, signup_method)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn call_entry(
        &self,
        caller: &Caller,
        entry_id: i64,
    ) -> Result<WaitlistEntry, AppError> {
        let svc = self.waitlist.clone();
        let caller = caller.clone();
        self.run("waitlist.call", move |txn, outbox| {
            Box::pin(async move {
                svc.call(txn, &caller, entry_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn remove_entry(
        &self,
        caller: &Caller,
        entry_id: i64,
    ) -> Result<WaitlistEntry, AppError> {
        let svc = self.waitlist.clone();
        let caller = caller.clone();
        self.run("waitlist.remove", move |txn, outbox| {
            Box::pin(async move {
                svc.remove(txn, &caller, entry_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn seat_entry(
        &self,
        caller: &Caller,
        entry_id: i64,
    ) -> Result<WaitlistEntry, AppError> {
        let svc = self.waitlist.clone();
        let caller = caller.clone();
        self.run("waitlist.seat", move |txn, outbox| {
            Box::pin(async move {
                svc.seat(txn, &caller, entry_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn estimated_wait_minutes(&self, bucket: Bucket) -> Result<i64, AppError> {
        let svc = self.waitlist.clone();
        self.run("waitlist.estimate", move |txn, _| {
            Box::pin(async move {
                svc.estimated_wait_minutes(txn, &bucket)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn get_entry(&self, entry_id: i64) -> Result<WaitlistEntry, AppError> {
        let svc = self.waitlist.clone();
        self.run("waitlist.get", move |txn, _| {
            Box::pin(async move { svc.get_entry(txn, entry_id).await.map_err(AppError::from) })
        })
        .await
    }

    pub async fn list_bucket(&self, bucket: Bucket) -> Result<Vec<WaitlistEntry>, AppError> {
        let svc = self.waitlist.clone();
        self.run("waitlist.list", move |txn, _| {
            Box::pin(async move { svc.list_bucket(txn, &bucket).await.map_err(AppError::from) })
        })
        .await
    }

    pub async fn find_active_entry(
        &self,
        bucket: Bucket,
        player_id: i64,
    ) -> Result<Option<WaitlistEntry>, AppError> {
        let svc = self.waitlist.clone();
        self.run("waitlist.find_active", move |txn, _| {
            Box::pin(async move {
                svc.find_active_entry(txn, &bucket, player_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    // ----- Squad Coordinator -----

    pub async fn create_squad(
        &self,
        caller: &Caller,
        bucket: Bucket,
        leader_id: i64,
        max_size: i32,
    ) -> Result<Squad, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.create", move |txn, _| {
            Box::pin(async move {
                svc.create_squad(txn, &caller, &bucket, leader_id, max_size)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    /// Invite (leader) or join (self) a forming squad.
    pub async fn add_squad_member(
        &self,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.add_member", move |txn, _| {
            Box::pin(async move {
                svc.add_member(txn, &caller, group_id, player_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn join_squad_by_code(
        &self,
        caller: &Caller,
        venue_id: i64,
        invite_code: &str,
    ) -> Result<SquadMember, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        let code = invite_code.to_string();
        self.run("squad.join_by_code", move |txn, _| {
            Box::pin(async move {
                svc.join_by_code(txn, &caller, venue_id, &code)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn confirm_squad_invite(
        &self,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.confirm", move |txn, _| {
            Box::pin(async move {
                svc.confirm(txn, &caller, group_id, player_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn decline_squad_invite(
        &self,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<SquadMember, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.decline", move |txn, _| {
            Box::pin(async move {
                svc.decline(txn, &caller, group_id, player_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn leave_squad(
        &self,
        caller: &Caller,
        group_id: i64,
        player_id: i64,
    ) -> Result<(), AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.leave", move |txn, _| {
            Box::pin(async move {
                svc.leave(txn, &caller, group_id, player_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn disband_squad(&self, caller: &Caller, group_id: i64) -> Result<Squad, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.disband", move |txn, outbox| {
            Box::pin(async move {
                svc.disband(txn, &caller, group_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn submit_squad(
        &self,
        caller: &Caller,
        group_id: i64,
    ) -> Result<WaitlistEntry, AppError> {
        let svc = self.squads.clone();
        let caller = caller.clone();
        self.run("squad.submit", move |txn, outbox| {
            Box::pin(async move {
                svc.submit_to_waitlist(txn, &caller, group_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn get_squad(&self, group_id: i64) -> Result<Squad, AppError> {
        let svc = self.squads.clone();
        self.run("squad.get", move |txn, _| {
            Box::pin(async move { svc.get_squad(txn, group_id).await.map_err(AppError::from) })
        })
        .await
    }

    pub async fn list_squad_members(&self, group_id: i64) -> Result<Vec<SquadMember>, AppError> {
        let svc = self.squads.clone();
        self.run("squad.members", move |txn, _| {
            Box::pin(async move { svc.list_members(txn, group_id).await.map_err(AppError::from) })
        })
        .await
    }

    // ----- Escrow Ledger -----

    pub async fn deposit(
        &self,
        caller: &Caller,
        request: DepositRequest,
    ) -> Result<EscrowTransaction, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.deposit", move |txn, outbox| {
            Box::pin(async move {
                svc.deposit(txn, &caller, request, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn mark_held(
        &self,
        caller: &Caller,
        transaction_id: i64,
        payment_reference: Option<String>,
    ) -> Result<EscrowTransaction, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.hold", move |txn, outbox| {
            Box::pin(async move {
                svc.mark_held(txn, &caller, transaction_id, payment_reference, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn release(
        &self,
        caller: &Caller,
        transaction_id: i64,
    ) -> Result<EscrowTransaction, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.release", move |txn, outbox| {
            Box::pin(async move {
                svc.release(txn, &caller, transaction_id, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn refund(
        &self,
        caller: &Caller,
        transaction_id: i64,
        reason: Option<String>,
    ) -> Result<EscrowTransaction, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.refund", move |txn, outbox| {
            Box::pin(async move {
                svc.refund(txn, &caller, transaction_id, reason, outbox)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn list_escrow(
        &self,
        caller: &Caller,
        home_game_id: i64,
        status: Option<EscrowStatus>,
    ) -> Result<Vec<EscrowTransaction>, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.list", move |txn, _| {
            Box::pin(async move {
                svc.list(txn, &caller, home_game_id, status)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn get_transaction(
        &self,
        caller: &Caller,
        transaction_id: i64,
    ) -> Result<EscrowTransaction, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.get", move |txn, _| {
            Box::pin(async move {
                svc.get_transaction(txn, &caller, transaction_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }

    pub async fn game_escrow_summary(
        &self,
        caller: &Caller,
        home_game_id: i64,
    ) -> Result<EscrowSummary, AppError> {
        let svc = self.escrow.clone();
        let caller = caller.clone();
        self.run("escrow.summary", move |txn, _| {
            Box::pin(async move {
                svc.game_escrow_summary(txn, &caller, home_game_id)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await
    }
}

impl std::fmt::Debug for SeatingCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatingCore")
            .field("state", &self.state)
            .field("shared_txn", &self.shared.is_some())
            .finish_non_exhaustive()
    }
}
