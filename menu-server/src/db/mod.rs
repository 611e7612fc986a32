//! Database access layer
//!
//! - [`sibling`]: PostgreSQL implementation of the ordering storage seam
//! - [`menu`] / [`story`]: record CRUD; positions are only ever written
//!   through the reorder engine

pub mod menu;
pub mod sibling;
pub mod story;

pub use sibling::{PgSiblingStore, PgSiblingTx};

use crate::ordering::{RepoError, ScopeKey};

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error()
            && matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
        {
            return RepoError::Conflict(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

/// Inserting or moving into a scope whose parent row is gone
pub(crate) fn missing_parent(err: sqlx::Error, scope: ScopeKey) -> RepoError {
    if is_foreign_key_violation(&err) {
        RepoError::missing_parent(scope)
    } else {
        err.into()
    }
}
