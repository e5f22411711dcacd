//! Masking for payment references and other caller-supplied identifiers
//! before they reach a log line.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Email address
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap()
});

/// Card or account number: 12-19 digits, optionally grouped by spaces or dashes
static PAN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b\d(?:[ -]?\d){11,18}\b").unwrap()
});

/// Processor token, intent id, or similar opaque run (16+ chars)
static OPAQUE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b[A-Za-z0-9_+/=-]{16,}").unwrap()
});

fn mask_email(caps: &Captures) -> String {
    let full = &caps[0];
    match full.split_once('@') {
        Some((local, domain)) if !local.is_empty() => format!("{}***@{domain}", &local[..1]),
        Some((_, domain)) => format!("@{domain}"),
        None => full.to_string(),
    }
}

fn mask_pan(caps: &Captures) -> String {
    let digits: String = caps[0].chars().filter(char::is_ascii_digit).collect();
    let last4 = &digits[digits.len().saturating_sub(4)..];
    format!("****{last4}")
}

/// Masks emails (first character kept), card-like digit runs (last four kept),
/// then any remaining long opaque token.
pub fn redact(input: &str) -> String {
    let step = EMAIL.replace_all(input, mask_email);
    let step = PAN.replace_all(&step, mask_pan);
    OPAQUE.replace_all(&step, "[REDACTED]").into_owned()
}

/// Display wrapper that redacts on format, for use in `tracing` fields.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", redact(self.0))
    }
}
