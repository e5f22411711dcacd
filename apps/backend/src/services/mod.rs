//! Domain services. Each method runs inside the caller's transaction, checks
//! the authorization gate and state rules before mutating, and pushes domain
//! events into the supplied [`Outbox`](crate::events::Outbox).

pub mod escrow;
pub mod squads;
pub mod waitlist;

pub use escrow::{DepositRequest, EscrowService, EscrowSummary};
pub use squads::SquadService;
pub use waitlist::WaitlistService;
