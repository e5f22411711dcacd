//! Caller identity as resolved by the external Identity/Role Provider.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::auth::gate::DenyReason;
use crate::errors::domain::DomainError;
use crate::logging::security;

/// Venue-scoped permission held by staff accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VenuePermission {
    ManageWaitlist,
    ManageEscrow,
}

impl VenuePermission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VenuePermission::ManageWaitlist => "manage_waitlist",
            VenuePermission::ManageEscrow => "manage_escrow",
        }
    }
}

impl fmt::Display for VenuePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal behind a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub player_id: i64,
    pub venue_permissions: HashMap<i64, HashSet<VenuePermission>>,
}

impl Caller {
    /// A plain player with no staff permissions.
    pub fn player(player_id: i64) -> Self {
        Self {
            player_id,
            venue_permissions: HashMap::new(),
        }
    }

    /// A staff account holding every permission at `venue_id`.
    pub fn staff(player_id: i64, venue_id: i64) -> Self {
        Self::player(player_id)
            .with_permission(venue_id, VenuePermission::ManageWaitlist)
            .with_permission(venue_id, VenuePermission::ManageEscrow)
    }

    pub fn with_permission(mut self, venue_id: i64, permission: VenuePermission) -> Self {
        self.venue_permissions
            .entry(venue_id)
            .or_default()
            .insert(permission);
        self
    }

    pub fn has_permission(&self, venue_id: i64, permission: VenuePermission) -> bool {
        self.venue_permissions
            .get(&venue_id)
            .is_some_and(|perms| perms.contains(&permission))
    }
}

/// Resolves an opaque caller token into a [`Caller`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Caller, DomainError>;
}

/// In-memory provider keyed by token. Used by embedding services without an
/// identity backend and by tests.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    callers: RwLock<HashMap<String, Caller>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, caller: Caller) {
        self.callers.write().insert(token.into(), caller);
    }

    pub fn revoke(&self, token: &str) -> Option<Caller> {
        self.callers.write().remove(token)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Caller, DomainError> {
        self.callers.read().get(token).cloned().ok_or_else(|| {
            security::unknown_token(token.len());
            DomainError::forbidden(DenyReason::UnknownCaller, "Caller token is not recognized")
        })
    }
}
