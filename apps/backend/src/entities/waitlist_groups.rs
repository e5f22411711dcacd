use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum GroupStatus {
    #[sea_orm(string_value = "FORMING")]
    Forming,
    #[sea_orm(string_value = "WAITING")]
    Waiting,
    #[sea_orm(string_value = "MATCHED")]
    Matched,
    #[sea_orm(string_value = "DISBANDED")]
    Disbanded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "waitlist_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "venue_id")]
    pub venue_id: i64,
    #[sea_orm(column_name = "game_type")]
    pub game_type: String,
    pub stakes: String,
    #[sea_orm(column_name = "leader_id")]
    pub leader_id: i64,
    #[sea_orm(column_name = "invite_code")]
    pub invite_code: String,
    #[sea_orm(column_name = "max_size")]
    pub max_size: i32,
    pub status: GroupStatus,
    /// Position Ledger entry created on submit
    #[sea_orm(column_name = "entry_id")]
    pub entry_id: Option<i64>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::waitlist_group_members::Entity")]
    Members,
}

impl Related<super::waitlist_group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
