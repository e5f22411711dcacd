//! DTOs for squads_sea adapter.

use crate::entities::waitlist_group_members::MemberStatus;
use crate::entities::waitlist_groups::GroupStatus;

/// DTO for creating a squad in FORMING.
#[derive(Debug, Clone)]
pub struct GroupCreate {
    pub venue_id: i64,
    pub game_type: String,
    pub stakes: String,
    pub leader_id: i64,
    pub invite_code: String,
    pub max_size: i32,
}

/// DTO for adding a member row.
#[derive(Debug, Clone)]
pub struct MemberCreate {
    pub group_id: i64,
    pub player_id: i64,
    pub is_leader: bool,
    pub member_status: MemberStatus,
}

/// Guarded group status change, optionally linking or unlinking the entry.
#[derive(Debug, Clone)]
pub struct GroupTransition {
    pub id: i64,
    pub from: Vec<GroupStatus>,
    pub to: GroupStatus,
    pub entry_id: Option<Option<i64>>,
}

impl GroupTransition {
    pub fn new(id: i64, from: GroupStatus, to: GroupStatus) -> Self {
        Self {
            id,
            from: vec![from],
            to,
            entry_id: None,
        }
    }

    pub fn with_entry(mut self, entry_id: Option<i64>) -> Self {
        self.entry_id = Some(entry_id);
        self
    }
}
