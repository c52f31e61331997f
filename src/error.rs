//! Error kinds raised by the custody engine and its collaborators
use crate::device::{Role, Status};

pub type Result<T> = std::result::Result<T, CustodyError>;

#[derive(thiserror::Error, Debug)]
pub enum CustodyError {
    #[error("invalid identifier {identifier:?}: expected two letters followed by seven digits")]
    InvalidIdentifier { identifier: String },
    #[error("device {identifier} already exists")]
    DuplicateAsset { identifier: String },
    #[error("no device record for {identifier}")]
    NotFound { identifier: String },
    #[error("corrupt record under {identifier}: {reason}")]
    CorruptRecord { identifier: String, reason: String },
    #[error("permission denied for {operation}: {reason}")]
    PermissionDenied {
        operation: String,
        reason: DenialReason,
    },
    #[error("failed to persist {key}")]
    PersistenceError {
        key: String,
        #[source]
        source: LedgerError,
    },
    #[error("caller identity unavailable: {0}")]
    IdentityUnavailable(String),
    #[error("unknown operation {name:?}")]
    UnknownOperation { name: String },
    #[error("invalid argument for {operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },
}

/// The first authorization comparison that failed. Owner ids are never
/// included, only whether the caller matched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    #[error("device is {actual}, expected {expected}")]
    Status { expected: Status, actual: Status },
    #[error("caller is not the recorded owner")]
    NotOwner,
    #[error("caller is not the recorded seller")]
    NotSeller,
    #[error("caller affiliation {actual:?} does not match {expected}")]
    CallerAffiliation { expected: Role, actual: String },
    #[error("recipient affiliation {actual:?} does not match {expected}")]
    RecipientAffiliation { expected: Role, actual: String },
    #[error("caller is neither the owner nor a manufacturer")]
    NotEntitled,
}

/// Failures of the underlying key/value substrate.
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("ledger lock poisoned")]
    Poisoned,
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("{0}")]
    Backend(String),
}

impl CustodyError {
    pub(crate) fn denied(operation: &str, reason: DenialReason) -> Self {
        CustodyError::PermissionDenied {
            operation: operation.to_string(),
            reason,
        }
    }

    pub(crate) fn invalid_argument(operation: &str, reason: impl Into<String>) -> Self {
        CustodyError::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
