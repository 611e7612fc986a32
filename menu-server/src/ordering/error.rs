//! Ordering errors

use thiserror::Error;

use super::scope::{EntityKind, MemberRef, ScopeKey};
use super::store::RepoError;

/// Failure of an ordering operation
///
/// Every variant leaves the affected scopes exactly as they were.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The member (or the parent of a target scope) does not exist
    #[error("{resource} not found")]
    NotFound {
        kind: Option<EntityKind>,
        resource: String,
    },

    /// The requested position cannot be applied to the scope
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The target scope holds a different kind of record
    #[error("{member} cannot be placed in {scope}")]
    ScopeMismatch { member: MemberRef, scope: ScopeKey },

    /// Concurrent modification detected; safe to retry
    #[error("Ordering conflict: {0}")]
    Conflict(String),

    /// The record still owns children
    #[error("{message}")]
    InUse { kind: EntityKind, message: String },

    /// Storage failed; nothing was applied
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn not_found(member: MemberRef) -> Self {
        Self::NotFound {
            kind: Some(member.kind),
            resource: format!("{} {}", member.kind.label(), member.id),
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { kind, resource } => Self::NotFound { kind, resource },
            RepoError::Conflict(msg) => Self::Conflict(msg),
            RepoError::InUse { kind, message } => Self::InUse { kind, message },
            RepoError::Database(msg) => Self::Storage(msg),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
