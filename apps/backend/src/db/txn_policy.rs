//! Process-wide choice of what `with_txn` does with a successful closure.
//! Test binaries install `RollbackOnOk` from a ctor so nothing they write
//! outlives the run; services never touch it.

use std::sync::OnceLock;

/// Env var a test binary reads to pick its policy.
pub const TXN_POLICY_ENV: &str = "SEATLINE_TXN_POLICY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnPolicy {
    CommitOnOk,
    RollbackOnOk,
}

impl TxnPolicy {
    /// `commit` (any case) commits; anything else, or nothing, rolls back.
    pub fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("commit") => TxnPolicy::CommitOnOk,
            _ => TxnPolicy::RollbackOnOk,
        }
    }

    /// Read `SEATLINE_TXN_POLICY`.
    pub fn for_tests() -> Self {
        Self::from_env_value(std::env::var(TXN_POLICY_ENV).ok().as_deref())
    }
}

static POLICY: OnceLock<TxnPolicy> = OnceLock::new();

/// `CommitOnOk` until something is installed.
pub fn current() -> TxnPolicy {
    POLICY.get().copied().unwrap_or(TxnPolicy::CommitOnOk)
}

/// Install `policy` for the process. Returns false when one was already set;
/// the first install wins.
pub fn set_txn_policy(policy: TxnPolicy) -> bool {
    POLICY.set(policy).is_ok()
}
