//! Pure seating and escrow rules, free of storage concerns.

pub mod bucket;
pub mod rules;

pub use bucket::Bucket;
