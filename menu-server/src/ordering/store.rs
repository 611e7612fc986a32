//! Storage seam
//!
//! The engine never talks to a database directly. A [`SiblingStore`] hands
//! out transactions; everything written through a [`SiblingTx`] becomes
//! visible on [`SiblingTx::commit`] and is discarded when the transaction
//! is dropped uncommitted.

use async_trait::async_trait;
use thiserror::Error;

use super::scope::{EntityKind, MemberRef, ScopeKey};
use super::{PositionChange, Sibling};

/// Repository-level failure
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{resource} not found")]
    NotFound {
        kind: Option<EntityKind>,
        resource: String,
    },

    /// Serialization failure or deadlock; the transaction can be retried
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{message}")]
    InUse { kind: EntityKind, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl RepoError {
    pub fn not_found(member: MemberRef) -> Self {
        Self::NotFound {
            kind: Some(member.kind),
            resource: format!("{} {}", member.kind.label(), member.id),
        }
    }

    /// The parent a scope points at is missing
    pub fn missing_parent(scope: ScopeKey) -> Self {
        match (scope.kind().parent_kind(), scope.parent()) {
            (Some(kind), Some(id)) => Self::NotFound {
                kind: Some(kind),
                resource: format!("{} {}", kind.label(), id),
            },
            _ => Self::NotFound {
                kind: None,
                resource: format!("Scope {scope}"),
            },
        }
    }

    pub fn in_use(member: MemberRef) -> Self {
        let children = member
            .kind
            .child_kind()
            .map_or("children", |kind| kind.table());
        Self::InUse {
            kind: member.kind,
            message: format!(
                "{} {} still has {}",
                member.kind.label(),
                member.id,
                children.replace('_', " ")
            ),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Source of ordering transactions
#[async_trait]
pub trait SiblingStore: Send + Sync + 'static {
    type Tx: SiblingTx;

    /// Current scope of a member, read without locks
    ///
    /// Only used to decide which scope to lock; the answer is re-checked
    /// inside the transaction.
    async fn scope_of(&self, member: MemberRef) -> RepoResult<Option<ScopeKey>>;

    async fn begin(&self) -> RepoResult<Self::Tx>;
}

/// One storage transaction
#[async_trait]
pub trait SiblingTx: Send {
    /// Exclusive storage-level lock on a scope, held until the transaction ends
    async fn lock_scope(&mut self, scope: ScopeKey) -> RepoResult<()>;

    async fn scope_of(&mut self, member: MemberRef) -> RepoResult<Option<ScopeKey>>;

    /// All members of a scope in `(position, created_at, id)` order
    async fn load(&mut self, scope: ScopeKey) -> RepoResult<Vec<Sibling>>;

    async fn write_positions(
        &mut self,
        kind: EntityKind,
        changes: &[PositionChange],
    ) -> RepoResult<()>;

    async fn delete(&mut self, member: MemberRef) -> RepoResult<()>;

    /// Move a member into another scope at the given position
    async fn rescope(&mut self, member: MemberRef, to: ScopeKey, position: i32) -> RepoResult<()>;

    async fn commit(self) -> RepoResult<()>;
}
