//! Repository functions: domain models over the SeaORM adapters.

pub mod escrow;
pub mod squads;
pub mod waitlist;
