//! Failure taxonomy shared by every scenario

use thiserror::Error;

use crate::collections::CollectionError;
use crate::diagnostics::NullReference;
use crate::scoped::ScopeError;
use crate::tasks::{GroupError, PoolError};

/// Category of a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedOperation,
    InvalidArgument,
    NullReference,
    InvalidState,
    ChildTaskFailure,
    Executor,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedOperation => "UnsupportedOperation",
            FailureKind::InvalidArgument => "InvalidArgument",
            FailureKind::NullReference => "NullReference",
            FailureKind::InvalidState => "InvalidState",
            FailureKind::ChildTaskFailure => "ChildTaskFailure",
            FailureKind::Executor => "Executor",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure raised by the showcase primitives
#[derive(Debug, Error)]
pub enum ShowcaseError {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    NullReference(#[from] NullReference),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl ShowcaseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ShowcaseError::Collection(CollectionError::UnsupportedOperation(_)) => {
                FailureKind::UnsupportedOperation
            }
            ShowcaseError::Collection(CollectionError::InvalidArgument(_)) => {
                FailureKind::InvalidArgument
            }
            ShowcaseError::NullReference(_) => FailureKind::NullReference,
            ShowcaseError::Scope(_) => FailureKind::InvalidState,
            ShowcaseError::Group(GroupError::ChildTaskFailure { .. }) => {
                FailureKind::ChildTaskFailure
            }
            ShowcaseError::Group(GroupError::Closed) => FailureKind::InvalidState,
            ShowcaseError::Pool(_) => FailureKind::Executor,
        }
    }
}
