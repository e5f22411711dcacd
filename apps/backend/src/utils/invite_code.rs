//! Squad invite code generation.
//!
//! Codes use Crockford's Base32 alphabet so they survive being read aloud
//! across a card room. Uniqueness per venue is enforced by the database; the
//! squad service regenerates on collision.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

/// Generate a random invite code of `len` characters.
pub fn generate_invite_code(len: usize) -> String {
    let mut rng = StdRng::from_os_rng();
    (0..len)
        .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char)
        .collect()
}

/// Upper-case and strip separators so `ab12-cd34` matches `AB12CD34`.
pub fn normalize_invite_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
