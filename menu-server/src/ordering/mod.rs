//! Sibling ordering
//!
//! Keeps the `sort_order` of every orderable record dense (`0..n-1`) within
//! its scope and applies user-driven reorders atomically.
//!
//! The core is scope-agnostic: [`scope`] maps entity kinds to sibling groups,
//! [`checker`] and [`plan`] are pure functions over a loaded scope, and
//! [`ReorderEngine`] runs them inside a locked storage transaction
//! provided by a [`SiblingStore`].

pub mod checker;
pub mod engine;
pub mod error;
pub mod locks;
pub mod memory;
pub mod plan;
pub mod scope;
pub mod store;

#[cfg(test)]
mod tests;

pub use checker::{Normalized, inspect, is_dense};
pub use engine::ReorderEngine;
pub use error::{OrderError, OrderResult};
pub use memory::{MemoryStore, MemoryTx};
pub use scope::{EntityKind, MemberRef, ScopeKey};
pub use shared::request::MoveDirection;
pub use store::{RepoError, RepoResult, SiblingStore, SiblingTx};

/// The orderable view of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling {
    pub id: i64,
    pub position: i32,
    /// Epoch milliseconds; first tie-breaker when positions collide
    pub created_at: i64,
}

/// One position write produced by the checker or the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChange {
    pub id: i64,
    pub from: i32,
    pub to: i32,
}
