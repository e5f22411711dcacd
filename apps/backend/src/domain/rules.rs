//! State-machine and bounds checks shared by the services.
//!
//! Every check runs before any mutation, so a failure never leaves partial state.

use crate::config::policy::{SeatingPolicy, MIN_SQUAD_SIZE};
use crate::entities::escrow_transactions::EscrowStatus;
use crate::entities::waitlist_entries::EntryStatus;
use crate::entities::waitlist_group_members::MemberStatus;
use crate::entities::waitlist_groups::GroupStatus;
use crate::errors::domain::{DomainError, ValidationKind};

// ----- Position Ledger -----

/// Waiting entries may be called; called entries may be paged again.
pub fn ensure_callable(entry_id: i64, status: EntryStatus) -> Result<(), DomainError> {
    if status.is_active() {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(format!(
            "Entry {entry_id} is {status:?} and can no longer be called"
        )))
    }
}

pub fn ensure_removable(entry_id: i64, status: EntryStatus) -> Result<(), DomainError> {
    if status.is_active() {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(format!(
            "Entry {entry_id} is {status:?} and can no longer be removed"
        )))
    }
}

/// Seating requires a prior call.
pub fn ensure_seatable(entry_id: i64, status: EntryStatus) -> Result<(), DomainError> {
    match status {
        EntryStatus::Called => Ok(()),
        EntryStatus::Waiting => Err(DomainError::invalid_transition(format!(
            "Entry {entry_id} must be called before it can be seated"
        ))),
        other => Err(DomainError::invalid_transition(format!(
            "Entry {entry_id} is {other:?} and cannot be seated"
        ))),
    }
}

// ----- Squad Coordinator -----

pub fn ensure_squad_size(max_size: i32, policy: &SeatingPolicy) -> Result<(), DomainError> {
    if (MIN_SQUAD_SIZE..=policy.max_squad_size).contains(&max_size) {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidGroupSize,
            format!(
                "Squad size must be between {MIN_SQUAD_SIZE} and {}",
                policy.max_squad_size
            ),
        ))
    }
}

/// Membership changes and submission are only legal while forming.
pub fn ensure_forming(group_id: i64, status: GroupStatus) -> Result<(), DomainError> {
    if status == GroupStatus::Forming {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(format!(
            "Squad {group_id} is {status:?}, not forming"
        )))
    }
}

pub fn ensure_can_leave(
    group_id: i64,
    status: GroupStatus,
    is_leader: bool,
) -> Result<(), DomainError> {
    if is_leader {
        return Err(DomainError::validation(
            ValidationKind::LeaderCannotLeave,
            "The leader cannot leave; disband the squad instead",
        ));
    }
    if status != GroupStatus::Forming {
        return Err(DomainError::validation(
            ValidationKind::CannotLeave,
            format!("Squad {group_id} has been submitted; only the leader can disband it"),
        ));
    }
    Ok(())
}

pub fn ensure_pending_member(player_id: i64, status: MemberStatus) -> Result<(), DomainError> {
    if status == MemberStatus::Pending {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(format!(
            "Membership for player {player_id} is {status:?}, not pending"
        )))
    }
}

pub fn ensure_enough_confirmed(confirmed: u64, policy: &SeatingPolicy) -> Result<(), DomainError> {
    if confirmed >= u64::from(policy.min_confirmed_members) {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::NotEnoughConfirmed,
            format!(
                "Squad needs {} confirmed members to submit, has {confirmed}",
                policy.min_confirmed_members
            ),
        ))
    }
}

// ----- Escrow Ledger -----

/// Amount must be positive and within the game's buy-in bounds when set.
pub fn ensure_amount_in_bounds(
    amount: i64,
    buyin_min: Option<i64>,
    buyin_max: Option<i64>,
) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidAmount,
            "Deposit amount must be positive",
        ));
    }
    if let Some(min) = buyin_min {
        if amount < min {
            return Err(DomainError::validation(
                ValidationKind::AmountTooLow,
                format!("Deposit of {amount} is below the buy-in minimum of {min}"),
            ));
        }
    }
    if let Some(max) = buyin_max {
        if amount > max {
            return Err(DomainError::validation(
                ValidationKind::AmountTooHigh,
                format!("Deposit of {amount} is above the buy-in maximum of {max}"),
            ));
        }
    }
    Ok(())
}

/// Release and refund close an open transaction. Closed ones stay closed.
pub fn ensure_open(transaction_id: i64, status: EscrowStatus) -> Result<(), DomainError> {
    if status.is_open() {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidStatus,
            format!("Transaction {transaction_id} is already {status:?}"),
        ))
    }
}

pub fn ensure_holdable(transaction_id: i64, status: EscrowStatus) -> Result<(), DomainError> {
    if status == EscrowStatus::Pending {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidStatus,
            format!("Transaction {transaction_id} is {status:?}, not pending"),
        ))
    }
}
