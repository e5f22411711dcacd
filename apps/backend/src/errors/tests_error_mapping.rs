// Unit tests for error mapping - pure domain logic without database dependencies
use crate::auth::gate::DenyReason;
use crate::auth::identity::VenuePermission;
use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::ErrorKind;
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_kinds() {
    let de = DomainError::invalid_transition("entry is seated");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::InvalidTransition);
    assert_eq!(app.kind(), ErrorKind::InvalidTransition);

    let closed = DomainError::validation(ValidationKind::GameClosed, "cancelled");
    let app: AppError = closed.into();
    assert_eq!(app.code(), ErrorCode::GameClosed);
    assert_eq!(app.kind(), ErrorKind::GameClosed);

    let low = DomainError::validation(ValidationKind::AmountTooLow, "below min");
    let app: AppError = low.into();
    assert_eq!(app.code().as_str(), "AMOUNT_TOO_LOW");
    assert_eq!(app.kind(), ErrorKind::OutOfBounds);
    assert!(!app.is_retryable());
}

#[test]
fn maps_conflicts() {
    let dup = DomainError::conflict(ConflictKind::DuplicateEntry, "already queued");
    let app: AppError = dup.into();
    assert_eq!(app.code().as_str(), "DUPLICATE_ENTRY");
    assert_eq!(app.kind(), ErrorKind::DuplicateEntry);

    let full = DomainError::conflict(ConflictKind::GroupFull, "full");
    let app: AppError = full.into();
    assert_eq!(app.kind(), ErrorKind::GroupFull);

    let other = DomainError::conflict(ConflictKind::Other("Unique".into()), "unique");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "CONFLICT");
}

#[test]
fn concurrent_write_is_the_only_retryable_kind() {
    let race = DomainError::conflict(ConflictKind::ConcurrentWrite, "lost race");
    let app: AppError = race.into();
    assert!(app.is_retryable());

    let existing = DomainError::conflict(ConflictKind::ExistingDeposit, "open deposit");
    let app: AppError = existing.into();
    assert!(!app.is_retryable());
    assert_eq!(app.kind(), ErrorKind::ExistingDeposit);
}

#[test]
fn maps_not_found() {
    let nf = DomainError::not_found(NotFoundKind::Transaction, "no such transaction");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "TRANSACTION_NOT_FOUND");
    assert_eq!(app.kind(), ErrorKind::NotFound);
    assert_eq!(app.detail(), "no such transaction");
}

#[test]
fn maps_forbidden_reasons() {
    let cases = [
        (DenyReason::NotEntryOwner, "NOT_ENTRY_OWNER"),
        (DenyReason::NotSquadLeader, "NOT_SQUAD_LEADER"),
        (DenyReason::NotDepositor, "NOT_DEPOSITOR"),
        (DenyReason::NotHost, "NOT_HOST"),
        (
            DenyReason::MissingPermission(VenuePermission::ManageWaitlist),
            "MISSING_PERMISSION",
        ),
        (DenyReason::NotParticipant, "NOT_PARTICIPANT"),
        (DenyReason::UnknownCaller, "FORBIDDEN"),
    ];
    for (reason, code) in cases {
        let app: AppError = DomainError::forbidden(reason, "denied").into();
        assert_eq!(app.code().as_str(), code);
        assert_eq!(app.kind(), ErrorKind::Forbidden);
    }
}

#[test]
fn maps_infra() {
    let t = DomainError::infra(InfraErrorKind::Timeout, "timeout");
    let app: AppError = t.into();
    assert_eq!(app.code().as_str(), "DB_TIMEOUT");
    assert!(matches!(app, AppError::Timeout { .. }));

    let down = DomainError::infra(InfraErrorKind::DbUnavailable, "down");
    let app: AppError = down.into();
    assert_eq!(app.code().as_str(), "DB_UNAVAILABLE");
    assert_eq!(app.kind(), ErrorKind::Internal);
}
