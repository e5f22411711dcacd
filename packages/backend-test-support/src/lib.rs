//! Backend test support utilities
//!
//! Shared by the seatline unit and integration tests: one logging
//! initializer and helpers for ids that never collide across test runs.

pub mod logging;
pub mod unique_helpers;
