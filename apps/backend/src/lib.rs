#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Seatline: waitlist and squad seating for live poker rooms, plus the
//! escrow ledger for player-hosted home game buy-ins.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod events;
pub mod infra;
pub mod logging;
pub mod repos;
pub mod seating_core;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod utils;

// Re-exports for public API
pub use auth::{Caller, IdentityProvider, StaticIdentityProvider, VenuePermission};
pub use config::db::{DbKind, DbOwner, RuntimeEnv};
pub use config::policy::SeatingPolicy;
pub use directory::{HomeGame, HomeGameDirectory, HomeGameStatus, StaticHomeGameDirectory};
pub use domain::Bucket;
pub use error::AppError;
pub use errors::{ErrorCode, ErrorKind};
pub use events::{DomainEvent, EventSink, RecordingEventSink, TracingEventSink};
pub use infra::db::connect_db;
pub use infra::state::{build_state, StateBuilder};
pub use seating_core::SeatingCore;
pub use services::{DepositRequest, EscrowSummary};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
