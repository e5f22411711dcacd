//! Error codes for the Seatline core.
//!
//! This module defines all error codes used throughout the crate.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that collaborators receive.

use core::fmt;

/// Coarse failure kind consumed by callers to decide what to do next.
///
/// Several codes share one kind; callers branch on the kind and show the code
/// and detail to humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Forbidden,
    DuplicateEntry,
    ExistingDeposit,
    AlreadyMember,
    OutOfBounds,
    GroupFull,
    GameClosed,
    /// Lost a race on a contended constraint; re-issuing the same request is safe.
    ConcurrentWrite,
    Validation,
    Internal,
}

/// Centralized error codes for the Seatline core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Resource Not Found
    EntryNotFound,
    GroupNotFound,
    MemberNotFound,
    TransactionNotFound,
    HomeGameNotFound,
    /// Generic DB-driven not found
    RecordNotFound,

    // State machine
    /// Requested state change is not legal from the current status
    InvalidTransition,
    /// Escrow transaction is already closed
    InvalidStatus,
    /// Squad does not have enough confirmed members to submit
    NotEnoughConfirmed,
    LeaderCannotLeave,
    /// Squad already submitted; members can no longer leave individually
    CannotLeave,
    GameClosed,

    // Authorization
    Forbidden,
    NotEntryOwner,
    NotSquadLeader,
    NotDepositor,
    NotHost,
    MissingPermission,
    NotParticipant,

    // Uniqueness
    DuplicateEntry,
    ExistingDeposit,
    AlreadyMember,
    GroupFull,
    InviteCodeConflict,
    /// Concurrent write lost a race on a unique index or serialization check
    ConcurrentWrite,
    /// Generic conflict (fallback for unmatched constraints)
    Conflict,

    // Bounds
    AmountTooLow,
    AmountTooHigh,
    InvalidAmount,
    InvalidGroupSize,

    // Request Validation
    ValidationError,

    // System Errors
    DbError,
    DbUnavailable,
    DbTimeout,
    ConfigError,
    Internal,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EntryNotFound => "ENTRY_NOT_FOUND",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            Self::HomeGameNotFound => "HOME_GAME_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",

            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::NotEnoughConfirmed => "NOT_ENOUGH_CONFIRMED",
            Self::LeaderCannotLeave => "LEADER_CANNOT_LEAVE",
            Self::CannotLeave => "CANNOT_LEAVE",
            Self::GameClosed => "GAME_CLOSED",

            Self::Forbidden => "FORBIDDEN",
            Self::NotEntryOwner => "NOT_ENTRY_OWNER",
            Self::NotSquadLeader => "NOT_SQUAD_LEADER",
            Self::NotDepositor => "NOT_DEPOSITOR",
            Self::NotHost => "NOT_HOST",
            Self::MissingPermission => "MISSING_PERMISSION",
            Self::NotParticipant => "NOT_PARTICIPANT",

            Self::DuplicateEntry => "DUPLICATE_ENTRY",
            Self::ExistingDeposit => "EXISTING_DEPOSIT",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::GroupFull => "GROUP_FULL",
            Self::InviteCodeConflict => "INVITE_CODE_CONFLICT",
            Self::ConcurrentWrite => "CONCURRENT_WRITE",
            Self::Conflict => "CONFLICT",

            Self::AmountTooLow => "AMOUNT_TOO_LOW",
            Self::AmountTooHigh => "AMOUNT_TOO_HIGH",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidGroupSize => "INVALID_GROUP_SIZE",

            Self::ValidationError => "VALIDATION_ERROR",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    /// The failure kind this code belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EntryNotFound
            | Self::GroupNotFound
            | Self::MemberNotFound
            | Self::TransactionNotFound
            | Self::HomeGameNotFound
            | Self::RecordNotFound => ErrorKind::NotFound,

            Self::InvalidTransition
            | Self::InvalidStatus
            | Self::NotEnoughConfirmed
            | Self::LeaderCannotLeave
            | Self::CannotLeave => ErrorKind::InvalidTransition,
            Self::GameClosed => ErrorKind::GameClosed,

            Self::Forbidden
            | Self::NotEntryOwner
            | Self::NotSquadLeader
            | Self::NotDepositor
            | Self::NotHost
            | Self::MissingPermission
            | Self::NotParticipant => ErrorKind::Forbidden,

            Self::DuplicateEntry => ErrorKind::DuplicateEntry,
            Self::ExistingDeposit => ErrorKind::ExistingDeposit,
            Self::AlreadyMember => ErrorKind::AlreadyMember,
            Self::GroupFull => ErrorKind::GroupFull,
            Self::InviteCodeConflict | Self::ConcurrentWrite => ErrorKind::ConcurrentWrite,

            Self::AmountTooLow
            | Self::AmountTooHigh
            | Self::InvalidAmount
            | Self::InvalidGroupSize => ErrorKind::OutOfBounds,

            Self::ValidationError | Self::Conflict => ErrorKind::Validation,

            Self::DbError
            | Self::DbUnavailable
            | Self::DbTimeout
            | Self::ConfigError
            | Self::Internal => ErrorKind::Internal,
        }
    }

    /// Every code, for uniqueness checks.
    pub const ALL: &'static [ErrorCode] = &[
        Self::EntryNotFound,
        Self::GroupNotFound,
        Self::MemberNotFound,
        Self::TransactionNotFound,
        Self::HomeGameNotFound,
        Self::RecordNotFound,
        Self::InvalidTransition,
        Self::InvalidStatus,
        Self::NotEnoughConfirmed,
        Self::LeaderCannotLeave,
        Self::CannotLeave,
        Self::GameClosed,
        Self::Forbidden,
        Self::NotEntryOwner,
        Self::NotSquadLeader,
        Self::NotDepositor,
        Self::NotHost,
        Self::MissingPermission,
        Self::NotParticipant,
        Self::DuplicateEntry,
        Self::ExistingDeposit,
        Self::AlreadyMember,
        Self::GroupFull,
        Self::InviteCodeConflict,
        Self::ConcurrentWrite,
        Self::Conflict,
        Self::AmountTooLow,
        Self::AmountTooHigh,
        Self::InvalidAmount,
        Self::InvalidGroupSize,
        Self::ValidationError,
        Self::DbError,
        Self::DbUnavailable,
        Self::DbTimeout,
        Self::ConfigError,
        Self::Internal,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
