//! SeaORM adapter for the Escrow Ledger.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::stale;
use crate::entities::escrow_transactions::{self, EscrowStatus};

pub mod dto;

pub use dto::{DepositCreate, EscrowTransition};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    transaction_id: i64,
) -> Result<Option<escrow_transactions::Model>, DbErr> {
    escrow_transactions::Entity::find_by_id(transaction_id)
        .one(conn)
        .await
}

/// The player's PENDING or HELD transaction on the game, if any.
pub async fn find_open_for_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    player_id: i64,
) -> Result<Option<escrow_transactions::Model>, DbErr> {
    escrow_transactions::Entity::find()
        .filter(escrow_transactions::Column::HomeGameId.eq(home_game_id))
        .filter(escrow_transactions::Column::PlayerId.eq(player_id))
        .filter(escrow_transactions::Column::Status.is_in(EscrowStatus::open()))
        .one(conn)
        .await
}

pub async fn count_for_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    player_id: i64,
) -> Result<u64, DbErr> {
    escrow_transactions::Entity::find()
        .filter(escrow_transactions::Column::HomeGameId.eq(home_game_id))
        .filter(escrow_transactions::Column::PlayerId.eq(player_id))
        .count(conn)
        .await
}

/// Transactions on a game, oldest first.
pub async fn list_for_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    home_game_id: i64,
    status: Option<EscrowStatus>,
) -> Result<Vec<escrow_transactions::Model>, DbErr> {
    let mut query = escrow_transactions::Entity::find()
        .filter(escrow_transactions::Column::HomeGameId.eq(home_game_id));
    if let Some(status) = status {
        query = query.filter(escrow_transactions::Column::Status.eq(status));
    }
    query
        .order_by_asc(escrow_transactions::Column::CreatedAt)
        .order_by_asc(escrow_transactions::Column::Id)
        .all(conn)
        .await
}

pub async fn create_deposit(
    txn: &DatabaseTransaction,
    dto: DepositCreate,
) -> Result<escrow_transactions::Model, DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let deposit = escrow_transactions::ActiveModel {
        id: NotSet,
        home_game_id: Set(dto.home_game_id),
        player_id: Set(dto.player_id),
        amount: Set(dto.amount),
        status: Set(EscrowStatus::Pending),
        payment_method: Set(dto.payment_method),
        payment_reference: Set(dto.payment_reference),
        created_at: Set(now),
        held_at: Set(None),
        released_at: Set(None),
        released_to: Set(None),
        refunded_at: Set(None),
        notes: Set(None),
        updated_at: Set(now),
    };
    deposit.insert(txn).await
}

pub async fn transition(
    txn: &DatabaseTransaction,
    dto: EscrowTransition,
) -> Result<escrow_transactions::Model, DbErr> {
    let mut update = escrow_transactions::Entity::update_many()
        .col_expr(escrow_transactions::Column::Status, Expr::value(dto.to))
        .col_expr(escrow_transactions::Column::UpdatedAt, Expr::value(dto.at));
    update = match dto.to {
        EscrowStatus::Held => {
            let mut u = update.col_expr(escrow_transactions::Column::HeldAt, Expr::value(dto.at));
            if let Some(reference) = dto.payment_reference {
                u = u.col_expr(
                    escrow_transactions::Column::PaymentReference,
                    Expr::value(reference),
                );
            }
            u
        }
        EscrowStatus::Released => update
            .col_expr(escrow_transactions::Column::ReleasedAt, Expr::value(dto.at))
            .col_expr(
                escrow_transactions::Column::ReleasedTo,
                Expr::value(dto.released_to),
            ),
        EscrowStatus::Refunded => update
            .col_expr(escrow_transactions::Column::RefundedAt, Expr::value(dto.at))
            .col_expr(escrow_transactions::Column::Notes, Expr::value(dto.notes)),
        EscrowStatus::Pending => update,
    };

    let result = update
        .filter(escrow_transactions::Column::Id.eq(dto.id))
        .filter(escrow_transactions::Column::Status.is_in(dto.from))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(stale(format_args!("escrow transaction {}", dto.id)));
    }
    find_by_id(txn, dto.id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("escrow transaction {}", dto.id)))
}
