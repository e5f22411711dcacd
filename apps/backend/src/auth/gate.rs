//! Authorization gate.
//!
//! A single stateless decision function over (caller, subject, action). Every
//! mutating operation in the core calls [`ensure`] before touching storage, so
//! policy lives here instead of being spread across services.
//!
//! Two shapes recur:
//! - ownership: the caller id must equal a stored identity field
//!   (player, squad leader, depositor, host);
//! - role: the caller must hold a venue-scoped [`VenuePermission`].
//!
//! Anything not explicitly allowed is denied.

use crate::auth::identity::{Caller, VenuePermission};
use crate::directory::HomeGameStatus;
use crate::errors::domain::DomainError;
use crate::logging::security;

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    JoinWaitlist,
    CallEntry,
    RemoveEntry,
    SeatEntry,
    CreateSquad,
    AddSquadMember,
    RespondToInvite,
    LeaveSquad,
    DisbandSquad,
    SubmitSquad,
    Deposit,
    MarkHeld,
    Release,
    Refund,
    ViewEscrow,
}

/// The identity fields of the entity an action targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A new seat claim in a bucket on behalf of `player_id`.
    Bucket { venue_id: i64, player_id: i64 },
    /// An existing waitlist entry. `owner_id` is the entry's player; squad
    /// entries have none, which leaves them to staff.
    Entry { venue_id: i64, owner_id: Option<i64> },
    /// A squad, optionally narrowed to one member row.
    Squad {
        leader_id: i64,
        member_id: Option<i64>,
    },
    /// Escrow on a home game, optionally narrowed to one transaction.
    Escrow {
        host_id: i64,
        venue_id: Option<i64>,
        depositor_id: Option<i64>,
        game_status: HomeGameStatus,
        is_participant: bool,
    },
}

/// Why the gate said no. Each reason maps to one error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotEntryOwner,
    NotSelf,
    NotSquadLeader,
    NotDepositor,
    NotHost,
    MissingPermission(VenuePermission),
    NotParticipant,
    UnknownCaller,
    /// The action does not apply to the given subject.
    Unsupported,
}

impl DenyReason {
    pub fn message(&self) -> String {
        match self {
            DenyReason::NotEntryOwner => "Only the entry owner or venue staff may do this".into(),
            DenyReason::NotSelf => "Callers may only act on their own behalf".into(),
            DenyReason::NotSquadLeader => "Only the squad leader may do this".into(),
            DenyReason::NotDepositor => "Only the depositor may release these funds".into(),
            DenyReason::NotHost => "Only the home game host may do this".into(),
            DenyReason::MissingPermission(p) => format!("Missing venue permission {p}"),
            DenyReason::NotParticipant => {
                "Only the host or a participant may view this escrow".into()
            }
            DenyReason::UnknownCaller => "Caller could not be identified".into(),
            DenyReason::Unsupported => "Action is not permitted on this resource".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(DomainError::forbidden(reason, reason.message())),
        }
    }
}

fn allow_if(cond: bool, reason: DenyReason) -> Decision {
    if cond {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

/// Decide whether `caller` may perform `action` on `subject`.
pub fn authorize(caller: &Caller, action: Action, subject: &Subject) -> Decision {
    if caller.player_id <= 0 {
        return Decision::Deny(DenyReason::UnknownCaller);
    }
    let me = caller.player_id;

    match (action, subject) {
        (Action::JoinWaitlist, Subject::Bucket { venue_id, player_id }) => {
            if me == *player_id {
                Decision::Allow
            } else {
                allow_if(
                    caller.has_permission(*venue_id, VenuePermission::ManageWaitlist),
                    DenyReason::MissingPermission(VenuePermission::ManageWaitlist),
                )
            }
        }
        (Action::CallEntry | Action::SeatEntry, Subject::Entry { venue_id, .. }) => allow_if(
            caller.has_permission(*venue_id, VenuePermission::ManageWaitlist),
            DenyReason::MissingPermission(VenuePermission::ManageWaitlist),
        ),
        (Action::RemoveEntry, Subject::Entry { venue_id, owner_id }) => allow_if(
            *owner_id == Some(me)
                || caller.has_permission(*venue_id, VenuePermission::ManageWaitlist),
            DenyReason::NotEntryOwner,
        ),
        (
            Action::CreateSquad | Action::DisbandSquad | Action::SubmitSquad,
            Subject::Squad { leader_id, .. },
        ) => allow_if(me == *leader_id, DenyReason::NotSquadLeader),
        (
            Action::AddSquadMember,
            Subject::Squad {
                leader_id,
                member_id,
            },
        ) => allow_if(
            me == *leader_id || *member_id == Some(me),
            DenyReason::NotSquadLeader,
        ),
        (Action::RespondToInvite | Action::LeaveSquad, Subject::Squad { member_id, .. }) => {
            allow_if(*member_id == Some(me), DenyReason::NotSelf)
        }
        (Action::Deposit, Subject::Escrow { depositor_id, .. }) => {
            allow_if(*depositor_id == Some(me), DenyReason::NotSelf)
        }
        (
            Action::MarkHeld,
            Subject::Escrow {
                host_id, venue_id, ..
            },
        ) => allow_if(
            me == *host_id
                || venue_id.is_some_and(|v| caller.has_permission(v, VenuePermission::ManageEscrow)),
            DenyReason::NotHost,
        ),
        (Action::Release, Subject::Escrow { depositor_id, .. }) => {
            allow_if(*depositor_id == Some(me), DenyReason::NotDepositor)
        }
        (
            Action::Refund,
            Subject::Escrow {
                host_id,
                depositor_id,
                game_status,
                ..
            },
        ) => {
            if me == *host_id {
                Decision::Allow
            } else {
                // Depositors may self-refund only once the game is cancelled.
                allow_if(
                    *depositor_id == Some(me) && *game_status == HomeGameStatus::Cancelled,
                    DenyReason::NotHost,
                )
            }
        }
        (
            Action::ViewEscrow,
            Subject::Escrow {
                host_id,
                is_participant,
                ..
            },
        ) => allow_if(me == *host_id || *is_participant, DenyReason::NotParticipant),
        _ => Decision::Deny(DenyReason::Unsupported),
    }
}

/// [`authorize`] as a `Result`, logging denials.
pub fn ensure(caller: &Caller, action: Action, subject: &Subject) -> Result<(), DomainError> {
    let decision = authorize(caller, action, subject);
    if let Decision::Deny(reason) = decision {
        security::authorization_denied(caller.player_id, action, reason);
    }
    decision.into_result()
}
