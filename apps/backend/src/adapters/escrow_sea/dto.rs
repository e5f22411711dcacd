//! DTOs for escrow_sea adapter.

use time::OffsetDateTime;

use crate::entities::escrow_transactions::EscrowStatus;

/// DTO for recording a new PENDING deposit.
#[derive(Debug, Clone)]
pub struct DepositCreate {
    pub home_game_id: i64,
    pub player_id: i64,
    pub amount: i64,
    pub payment_method: String,
    pub payment_reference: Option<String>,
}

/// Guarded escrow status change. Only the fields relevant to `to` are written.
#[derive(Debug, Clone)]
pub struct EscrowTransition {
    pub id: i64,
    pub from: Vec<EscrowStatus>,
    pub to: EscrowStatus,
    pub at: OffsetDateTime,
    pub released_to: Option<i64>,
    pub notes: Option<String>,
    pub payment_reference: Option<String>,
}

impl EscrowTransition {
    pub fn held(id: i64, at: OffsetDateTime, payment_reference: Option<String>) -> Self {
        Self {
            id,
            from: vec![EscrowStatus::Pending],
            to: EscrowStatus::Held,
            at,
            released_to: None,
            notes: None,
            payment_reference,
        }
    }

    pub fn released(id: i64, at: OffsetDateTime, host_id: i64) -> Self {
        Self {
            id,
            from: EscrowStatus::open().to_vec(),
            to: EscrowStatus::Released,
            at,
            released_to: Some(host_id),
            notes: None,
            payment_reference: None,
        }
    }

    pub fn refunded(id: i64, at: OffsetDateTime, reason: Option<String>) -> Self {
        Self {
            id,
            from: EscrowStatus::open().to_vec(),
            to: EscrowStatus::Refunded,
            at,
            released_to: None,
            notes: reason,
            payment_reference: None,
        }
    }
}
