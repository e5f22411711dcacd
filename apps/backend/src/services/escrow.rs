//! Escrow Ledger: buy-in deposits for player-hosted home games.
//!
//! A (game, player) pair has at most one open (PENDING or HELD) transaction.
//! The check runs under a per-pair lock and the partial unique index backs it
//! up. RELEASED and REFUNDED are terminal.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::{ensure, Action, Caller, Subject};
use crate::db::locking::lock_deposit;
use crate::directory::{HomeGame, HomeGameDirectory};
use crate::domain::rules;
use crate::entities::escrow_transactions::EscrowStatus;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::events::{DomainEvent, Outbox};
use crate::logging::pii::Redacted;
use crate::repos::escrow::{self as escrow_repo, EscrowTransaction};

/// Per-status amount totals for one home game, in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EscrowSummary {
    pub home_game_id: i64,
    pub transaction_count: usize,
    pub pending_total: i64,
    pub held_total: i64,
    pub released_total: i64,
    pub refunded_total: i64,
}

impl EscrowSummary {
    fn from_transactions(home_game_id: i64, transactions: &[EscrowTransaction]) -> Self {
        let mut summary = Self {
            home_game_id,
            transaction_count: transactions.len(),
            ..Self::default()
        };
        for tx in transactions {
            let bucket = match tx.status {
                EscrowStatus::Pending => &mut summary.pending_total,
                EscrowStatus::Held => &mut summary.held_total,
                EscrowStatus::Released => &mut summary.released_total,
                EscrowStatus::Refunded => &mut summary.refunded_total,
            };
            *bucket += tx.amount;
        }
        summary
    }

    /// Funds still under escrow.
    pub fn open_total(&self) -> i64 {
        self.pending_total + self.held_total
    }
}

/// A player's request to put a buy-in into escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub home_game_id: i64,
    pub amount: i64,
    pub payment_method: String,
    pub payment_reference: Option<String>,
}

#[derive(Clone)]
pub struct EscrowService {
    directory: Arc<dyn HomeGameDirectory>,
}

impl EscrowService {
    pub fn new(directory: Arc<dyn HomeGameDirectory>) -> Self {
        Self { directory }
    }

    /// Record a PENDING deposit by the caller.
    ///
    /// Preconditions in order: game open, amount within bounds, no open
    /// deposit by the same player.
    pub async fn deposit(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        request: DepositRequest,
        outbox: &mut Outbox,
    ) -> Result<EscrowTransaction, DomainError> {
        let DepositRequest {
            home_game_id,
            amount,
            payment_method,
            payment_reference,
        } = request;
        let game = self.require_game(home_game_id).await?;
        let player_id = caller.player_id;
        ensure(
            caller,
            Action::Deposit,
            &escrow_subject(&game, Some(player_id), false),
        )?;
        if game.status.is_closed() {
            return Err(DomainError::validation(
                ValidationKind::GameClosed,
                format!("Home game {home_game_id} is {:?}", game.status),
            ));
        }
        rules::ensure_amount_in_bounds(amount, game.buyin_min, game.buyin_max)?;
        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Other("PaymentMethod".into()),
                "Payment method is required",
            ));
        }

        lock_deposit(txn, home_game_id, player_id).await?;
        if let Some(open) = escrow_repo::find_open_for_player(txn, home_game_id, player_id).await?
        {
            warn!(
                transaction_id = open.id,
                home_game_id, player_id, "Open deposit already exists"
            );
            return Err(DomainError::conflict(
                ConflictKind::ExistingDeposit,
                format!(
                    "Player already has a {:?} deposit on home game {home_game_id}",
                    open.status
                ),
            ));
        }

        let reference_for_log = payment_reference.clone().unwrap_or_default();
        let tx = escrow_repo::create_deposit(
            txn,
            home_game_id,
            player_id,
            amount,
            payment_method.to_string(),
            payment_reference,
        )
        .await?;
        info!(
            transaction_id = tx.id,
            home_game_id,
            player_id,
            amount,
            payment_reference = %Redacted(&reference_for_log),
            "Deposit recorded"
        );

        outbox.push(DomainEvent::DepositCreated {
            transaction_id: tx.id,
            home_game_id,
            player_id,
            amount,
        });
        Ok(tx)
    }

    /// PENDING → HELD once the payment collaborator confirms funds.
    pub async fn mark_held(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        transaction_id: i64,
        payment_reference: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<EscrowTransaction, DomainError> {
        let (tx, game) = self.load(txn, transaction_id).await?;
        ensure(
            caller,
            Action::MarkHeld,
            &escrow_subject(&game, Some(tx.player_id), false),
        )?;
        rules::ensure_holdable(tx.id, tx.status)?;

        let held =
            escrow_repo::mark_held(txn, tx.id, OffsetDateTime::now_utc(), payment_reference)
                .await?;
        info!(
            transaction_id = held.id,
            home_game_id = held.home_game_id,
            confirmed_by = caller.player_id,
            "Deposit held"
        );
        outbox.push(DomainEvent::DepositHeld {
            transaction_id: held.id,
            home_game_id: held.home_game_id,
        });
        Ok(held)
    }

    /// The depositor releases their own funds to the host.
    pub async fn release(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        transaction_id: i64,
        outbox: &mut Outbox,
    ) -> Result<EscrowTransaction, DomainError> {
        let (tx, game) = self.load(txn, transaction_id).await?;
        ensure(
            caller,
            Action::Release,
            &escrow_subject(&game, Some(tx.player_id), false),
        )?;
        rules::ensure_open(tx.id, tx.status)?;

        let released =
            escrow_repo::mark_released(txn, tx.id, OffsetDateTime::now_utc(), game.host_id)
                .await?;
        info!(
            transaction_id = released.id,
            home_game_id = released.home_game_id,
            released_to = game.host_id,
            amount = released.amount,
            "Deposit released"
        );
        outbox.push(DomainEvent::DepositReleased {
            transaction_id: released.id,
            home_game_id: released.home_game_id,
            released_to: game.host_id,
            amount: released.amount,
        });
        Ok(released)
    }

    /// Host refunds any open deposit; a depositor only once the game is cancelled.
    pub async fn refund(
        &self,
        txn: &DatabaseTransaction,
        caller: &Caller,
        transaction_id: i64,
        reason: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<EscrowTransaction, DomainError> {
        let (tx, game) = self.load(txn, transaction_id).await?;
        ensure(
            caller,
            Action::Refund,
            &escrow_subject(&game, Some(tx.player_id), false),
        )?;
        rules::ensure_open(tx.id, tx.status)?;

        let refunded =
            escrow_repo::mark_refunded(txn, tx.id, OffsetDateTime::now_utc(), reason).await?;
        info!(
            transaction_id = refunded.id,
            home_game_id = refunded.home_game_id,
            refunded_by = caller.player_id,
            amount = refunded.amount,
            "Deposit refunded"
        );
        outbox.push(DomainEvent::DepositRefunded {
            transaction_id: refunded.id,
            home_game_id: refunded.home_game_id,
            player_id: refunded.player_id,
            amount: refunded.amount,
        });
        Ok(refunded)
    }

    /// Every transaction on the game, visible to the host and to participants.
    pub async fn list<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        caller: &Caller,
        home_game_id: i64,
        status: Option<EscrowStatus>,
    ) -> Result<Vec<EscrowTransaction>, DomainError> {
        let game = self.require_game(home_game_id).await?;
        self.ensure_can_view(conn, caller, &game).await?;
        escrow_repo::list_for_game(conn, home_game_id, status).await
    }

    pub async fn get_transaction<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        caller: &Caller,
        transaction_id: i64,
    ) -> Result<EscrowTransaction, DomainError> {
        let (tx, game) = self.load(conn, transaction_id).await?;
        self.ensure_can_view(conn, caller, &game).await?;
        Ok(tx)
    }

    pub async fn game_escrow_summary<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        caller: &Caller,
        home_game_id: i64,
    ) -> Result<EscrowSummary, DomainError> {
        let transactions = self.list(conn, caller, home_game_id, None).await?;
        Ok(EscrowSummary::from_transactions(
            home_game_id,
            &transactions,
        ))
    }

    async fn ensure_can_view<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        caller: &Caller,
        game: &HomeGame,
    ) -> Result<(), DomainError> {
        let is_participant = escrow_repo::is_participant(conn, game.id, caller.player_id).await?;
        ensure(
            caller,
            Action::ViewEscrow,
            &escrow_subject(game, None, is_participant),
        )
    }

    async fn require_game(&self, home_game_id: i64) -> Result<HomeGame, DomainError> {
        self.directory
            .find_home_game(home_game_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::HomeGame,
                    format!("Home game {home_game_id} not found"),
                )
            })
    }

    async fn load<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        transaction_id: i64,
    ) -> Result<(EscrowTransaction, HomeGame), DomainError> {
        let tx = escrow_repo::find_transaction(conn, transaction_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Transaction,
                    format!("Transaction {transaction_id} not found"),
                )
            })?;
        let game = self.require_game(tx.home_game_id).await?;
        Ok((tx, game))
    }
}

impl std::fmt::Debug for EscrowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowService").finish_non_exhaustive()
    }
}

fn escrow_subject(game: &HomeGame, depositor_id: Option<i64>, is_participant: bool) -> Subject {
    Subject::Escrow {
        host_id: game.host_id,
        venue_id: game.venue_id,
        depositor_id,
        game_status: game.status,
        is_participant,
    }
}
