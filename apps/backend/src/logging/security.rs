//! Security-relevant log events, tagged with a stable `event` field so they
//! can be filtered out of the general stream.

use tracing::warn;

use crate::auth::gate::{Action, DenyReason};

/// Log an authorization denial.
pub fn authorization_denied(caller_id: i64, action: Action, reason: DenyReason) {
    warn!(
        event = "SECURITY_AUTHZ_DENIED",
        caller_id,
        action = ?action,
        reason = ?reason,
        "Authorization denied"
    );
}

/// Log an identity token that resolved to no caller. The token itself is
/// never written.
pub fn unknown_token(token_len: usize) {
    warn!(
        event = "SECURITY_UNKNOWN_TOKEN",
        token_len, "Caller token could not be resolved"
    );
}
