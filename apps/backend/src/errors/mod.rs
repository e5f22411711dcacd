//! Error handling for the Seatline core.

pub mod domain;
pub mod error_code;

pub use domain::DomainError;
pub use error_code::{ErrorCode, ErrorKind};

#[cfg(test)]
mod tests_error_mapping;
