use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryStatus {
    #[sea_orm(string_value = "WAITING")]
    Waiting,
    #[sea_orm(string_value = "CALLED")]
    Called,
    #[sea_orm(string_value = "SEATED")]
    Seated,
    #[sea_orm(string_value = "REMOVED")]
    Removed,
}

impl EntryStatus {
    /// Waiting and called entries hold a position in their bucket.
    pub fn is_active(&self) -> bool {
        matches!(self, EntryStatus::Waiting | EntryStatus::Called)
    }

    pub fn active() -> [EntryStatus; 2] {
        [EntryStatus::Waiting, EntryStatus::Called]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SignupMethod {
    #[sea_orm(string_value = "app")]
    App,
    #[sea_orm(string_value = "kiosk")]
    Kiosk,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "squad")]
    Squad,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "waitlist_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "venue_id")]
    pub venue_id: i64,
    #[sea_orm(column_name = "game_type")]
    pub game_type: String,
    pub stakes: String,
    /// Null for squad-backed entries
    #[sea_orm(column_name = "player_id")]
    pub player_id: Option<i64>,
    #[sea_orm(column_name = "group_id")]
    pub group_id: Option<i64>,
    pub position: i32,
    pub status: EntryStatus,
    #[sea_orm(column_name = "signup_method")]
    pub signup_method: SignupMethod,
    #[sea_orm(column_name = "call_count")]
    pub call_count: i32,
    #[sea_orm(column_name = "last_called_at")]
    pub last_called_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "seated_at")]
    pub seated_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "removed_at")]
    pub removed_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "removed_by")]
    pub removed_by: Option<i64>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::waitlist_groups::Entity",
        from = "Column::GroupId",
        to = "super::waitlist_groups::Column::Id"
    )]
    Group,
}

impl Related<super::waitlist_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
