//! DTOs for waitlist_sea adapter.

use time::OffsetDateTime;

use crate::entities::waitlist_entries::{EntryStatus, SignupMethod};

/// DTO for inserting a new waitlist entry at a known position.
#[derive(Debug, Clone)]
pub struct EntryCreate {
    pub venue_id: i64,
    pub game_type: String,
    pub stakes: String,
    pub player_id: Option<i64>,
    pub group_id: Option<i64>,
    pub position: i32,
    pub signup_method: SignupMethod,
}

/// DTO for moving an active entry to a terminal status.
#[derive(Debug, Clone)]
pub struct EntryClose {
    pub id: i64,
    pub to: EntryStatus,
    pub removed_by: Option<i64>,
    pub at: OffsetDateTime,
}

impl EntryClose {
    pub fn seated(id: i64, at: OffsetDateTime) -> Self {
        Self {
            id,
            to: EntryStatus::Seated,
            removed_by: None,
            at,
        }
    }

    pub fn removed(id: i64, by: i64, at: OffsetDateTime) -> Self {
        Self {
            id,
            to: EntryStatus::Removed,
            removed_by: Some(by),
            at,
        }
    }
}
