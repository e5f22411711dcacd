use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EscrowStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "HELD")]
    Held,
    #[sea_orm(string_value = "RELEASED")]
    Released,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

impl EscrowStatus {
    /// Pending and held transactions still commit funds.
    pub fn is_open(&self) -> bool {
        matches!(self, EscrowStatus::Pending | EscrowStatus::Held)
    }

    pub fn open() -> [EscrowStatus; 2] {
        [EscrowStatus::Pending, EscrowStatus::Held]
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "escrow_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "home_game_id")]
    pub home_game_id: i64,
    #[sea_orm(column_name = "player_id")]
    pub player_id: i64,
    /// Minor currency units
    pub amount: i64,
    pub status: EscrowStatus,
    #[sea_orm(column_name = "payment_method")]
    pub payment_method: String,
    #[sea_orm(column_name = "payment_reference")]
    pub payment_reference: Option<String>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "held_at")]
    pub held_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "released_at")]
    pub released_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "released_to")]
    pub released_to: Option<i64>,
    #[sea_orm(column_name = "refunded_at")]
    pub refunded_at: Option<OffsetDateTime>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
