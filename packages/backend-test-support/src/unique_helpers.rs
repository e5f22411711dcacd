//! Test helpers for generating unique test data
//!
//! Tests against a shared Postgres database must not reuse venue, player or
//! home game ids, since buckets and open deposits are keyed on them.

use std::sync::atomic::{AtomicI64, Ordering};

use once_cell::sync::Lazy;
use ulid::Ulid;

/// Seeded from the wall clock so separate runs start in different ranges.
static NEXT_ID: Lazy<AtomicI64> = Lazy::new(|| {
    let millis = Ulid::new().timestamp_ms() as i64;
    AtomicI64::new((millis % 1_000_000) * 1_000_000 + 1)
});

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let id1 = unique_str("stakes");
/// let id2 = unique_str("stakes");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("stakes-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// A positive id not handed out before in this process.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_id;
///
/// let a = unique_id();
/// let b = unique_id();
/// assert!(a > 0);
/// assert_ne!(a, b);
/// ```
pub fn unique_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A short label (at most 32 chars) usable as a stakes or game type.
pub fn unique_label(prefix: &str) -> String {
    let ulid = Ulid::new().to_string();
    let tail = &ulid[ulid.len() - 10..];
    let mut label = format!("{prefix}-{tail}");
    label.truncate(32);
    label
}
