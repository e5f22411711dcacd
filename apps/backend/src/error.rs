use thiserror::Error;

use crate::auth::gate::DenyReason;
use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::{ErrorCode, ErrorKind};

/// Caller-facing error: a machine-readable code plus a human-readable detail.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Forbidden: {detail}")]
    Forbidden { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
    #[error("Database unavailable: {detail}")]
    DbUnavailable { detail: String },
    #[error("Database timeout: {detail}")]
    Timeout { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    /// Machine-readable error code
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Forbidden { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::Db { .. } => ErrorCode::DbError,
            AppError::DbUnavailable { .. } => ErrorCode::DbUnavailable,
            AppError::Timeout { .. } => ErrorCode::DbTimeout,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Human-readable detail
    pub fn detail(&self) -> &str {
        match self {
            AppError::Validation { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Forbidden { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::Db { detail }
            | AppError::DbUnavailable { detail }
            | AppError::Timeout { detail }
            | AppError::Config { detail }
            | AppError::Internal { detail } => detail,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// True only when the request lost a race on a contended constraint and
    /// may be re-issued unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentWrite
    }

    pub fn invalid(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn forbidden(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn db(detail: impl Into<String>) -> Self {
        Self::Db {
            detail: detail.into(),
        }
    }

    pub fn db_unavailable() -> Self {
        Self::DbUnavailable {
            detail: "Database is not configured".to_string(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(kind, detail) => {
                let code = match kind {
                    ValidationKind::InvalidTransition => ErrorCode::InvalidTransition,
                    ValidationKind::InvalidStatus => ErrorCode::InvalidStatus,
                    ValidationKind::NotEnoughConfirmed => ErrorCode::NotEnoughConfirmed,
                    ValidationKind::LeaderCannotLeave => ErrorCode::LeaderCannotLeave,
                    ValidationKind::CannotLeave => ErrorCode::CannotLeave,
                    ValidationKind::GameClosed => ErrorCode::GameClosed,
                    ValidationKind::AmountTooLow => ErrorCode::AmountTooLow,
                    ValidationKind::AmountTooHigh => ErrorCode::AmountTooHigh,
                    ValidationKind::InvalidAmount => ErrorCode::InvalidAmount,
                    ValidationKind::InvalidGroupSize => ErrorCode::InvalidGroupSize,
                    ValidationKind::Other(_) => ErrorCode::ValidationError,
                };
                AppError::Validation { code, detail }
            }
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::DuplicateEntry => ErrorCode::DuplicateEntry,
                    ConflictKind::ExistingDeposit => ErrorCode::ExistingDeposit,
                    ConflictKind::AlreadyMember => ErrorCode::AlreadyMember,
                    ConflictKind::GroupFull => ErrorCode::GroupFull,
                    ConflictKind::InviteCodeConflict => ErrorCode::InviteCodeConflict,
                    ConflictKind::ConcurrentWrite => ErrorCode::ConcurrentWrite,
                    ConflictKind::Other(_) => ErrorCode::Conflict,
                };
                AppError::Conflict { code, detail }
            }
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::Entry => ErrorCode::EntryNotFound,
                    NotFoundKind::Group => ErrorCode::GroupNotFound,
                    NotFoundKind::Member => ErrorCode::MemberNotFound,
                    NotFoundKind::Transaction => ErrorCode::TransactionNotFound,
                    NotFoundKind::HomeGame => ErrorCode::HomeGameNotFound,
                    NotFoundKind::Other(_) => ErrorCode::RecordNotFound,
                };
                AppError::NotFound { code, detail }
            }
            DomainError::Forbidden(reason, detail) => {
                let code = match reason {
                    DenyReason::NotEntryOwner => ErrorCode::NotEntryOwner,
                    DenyReason::NotSquadLeader => ErrorCode::NotSquadLeader,
                    DenyReason::NotDepositor => ErrorCode::NotDepositor,
                    DenyReason::NotHost => ErrorCode::NotHost,
                    DenyReason::MissingPermission(_) => ErrorCode::MissingPermission,
                    DenyReason::NotParticipant => ErrorCode::NotParticipant,
                    DenyReason::NotSelf | DenyReason::UnknownCaller | DenyReason::Unsupported => {
                        ErrorCode::Forbidden
                    }
                };
                AppError::Forbidden { code, detail }
            }
            DomainError::Infra(kind, detail) => match kind {
                InfraErrorKind::Timeout => AppError::Timeout { detail },
                InfraErrorKind::DbUnavailable => AppError::DbUnavailable { detail },
                InfraErrorKind::Config => AppError::Config { detail },
                InfraErrorKind::DataCorruption | InfraErrorKind::Other(_) => {
                    AppError::Db { detail }
                }
            },
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::from(crate::infra::db_errors::map_db_err(e))
    }
}

impl From<std::env::VarError> for AppError {
    fn from(e: std::env::VarError) -> Self {
        AppError::config(format!("env var error: {e}"))
    }
}
