//! Escrow transaction repository functions for domain layer.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::escrow_sea as escrow_adapter;
use crate::entities::escrow_transactions::{self, EscrowStatus};
use crate::errors::domain::DomainError;

/// One player's fund commitment toward a home game. Amounts are minor units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscrowTransaction {
    pub id: i64,
    pub home_game_id: i64,
    pub player_id: i64,
    pub amount: i64,
    pub status: EscrowStatus,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub created_at: OffsetDateTime,
    pub held_at: Option<OffsetDateTime>,
    pub released_at: Option<OffsetDateTime>,
    pub released_to: Option<i64>,
    pub refunded_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

pub async fn find_transaction<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    transaction_id: i64,
) -> Result<Option<EscrowTransaction>, DomainError> {
    Ok(escrow_adapter::find_by_id(conn, transaction_id)
        .await?
        .map(EscrowTransaction::from))
}

pub async fn find_open_for_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    player_id: i64,
) -> Result<Option<EscrowTransaction>, DomainError> {
    Ok(
        escrow_adapter::find_open_for_player(conn, home_game_id, player_id)
            .await?
            .map(EscrowTransaction::from),
    )
}

/// Whether the player has ever deposited on the game.
pub async fn is_participant<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    player_id: i64,
) -> Result<bool, DomainError> {
    Ok(escrow_adapter::count_for_player(conn, home_game_id, player_id).await? > 0)
}

pub async fn list_for_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    status: Option<EscrowStatus>,
) -> Result<Vec<EscrowTransaction>, DomainError> {
    let rows = escrow_adapter::list_for_game(conn, home_game_id, status).await?;
    Ok(rows.into_iter().map(EscrowTransaction::from).collect())
}

pub async fn create_deposit(
    txn: &DatabaseTransaction,
    home_game_id: i64,
    player_id: i64,
    amount: i64,
    payment_method: String,
    payment_reference: Option<String>,
) -> Result<EscrowTransaction, DomainError> {
    let dto = escrow_adapter::DepositCreate {
        home_game_id,
        player_id,
        amount,
        payment_method,
        payment_reference,
    };
    Ok(EscrowTransaction::from(
        escrow_adapter::create_deposit(txn, dto).await?,
    ))
}

pub async fn mark_held(
    txn: &DatabaseTransaction,
    transaction_id: i64,
    at: OffsetDateTime,
    payment_reference: Option<String>,
) -> Result<EscrowTransaction, DomainError> {
    let dto = escrow_adapter::EscrowTransition::held(transaction_id, at, payment_reference);
    Ok(EscrowTransaction::from(
        escrow_adapter::transition(txn, dto).await?,
    ))
}

pub async fn mark_released(
    txn: &DatabaseTransaction,
    transaction_id: i64,
    at: OffsetDateTime,
    host_id: i64,
) -> Result<EscrowTransaction, DomainError> {
    let dto = escrow_adapter::EscrowTransition::released(transaction_id, at, host_id);
    Ok(EscrowTransaction::from(
        escrow_adapter::transition(txn, dto).await?,
    ))
}

pub async fn mark_refunded(
    txn: &DatabaseTransaction,
    transaction_id: i64,
    at: OffsetDateTime,
    reason: Option<String>,
) -> Result<EscrowTransaction, DomainError> {
    let dto = escrow_adapter::EscrowTransition::refunded(transaction_id, at, reason);
    Ok(EscrowTransaction::from(
        escrow_adapter::transition(txn, dto).await?,
    ))
}

impl From<escrow_transactions::Model> for EscrowTransaction {
    fn from(model: escrow_transactions::Model) -> Self {
        Self {
            id: model.id,
            home_game_id: model.home_game_id,
            player_id: model.player_id,
            amount: model.amount,
            status: model.status,
            payment_method: model.payment_method,
            payment_reference: model.payment_reference,
            created_at: model.created_at,
            held_at: model.held_at,
            released_at: model.released_at,
            released_to: model.released_to,
            refunded_at: model.refunded_at,
            notes: model.notes,
        }
    }
}
