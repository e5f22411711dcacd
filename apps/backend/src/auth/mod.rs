//! Caller identity and the authorization gate applied before every mutation.

pub mod gate;
pub mod identity;

pub use gate::{authorize, ensure, Action, Decision, DenyReason, Subject};
pub use identity::{Caller, IdentityProvider, StaticIdentityProvider, VenuePermission};
