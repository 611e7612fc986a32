//! Reorder engine
//!
//! Every operation runs the same pipeline:
//! resolve scope → in-process scope lock → begin → storage scope lock →
//! re-check membership → normalize → plan → write → commit.
//! A failure at any step drops the transaction, so nothing is applied.

use futures::FutureExt;
use futures::future::BoxFuture;

use super::checker::{self, Normalized};
use super::error::{OrderError, OrderResult};
use super::locks::ScopeLocks;
use super::plan;
use super::scope::{MemberRef, ScopeKey};
use super::store::{RepoResult, SiblingStore, SiblingTx};
use super::{MoveDirection, Sibling};

pub struct ReorderEngine<S> {
    store: S,
    locks: ScopeLocks,
}

impl<S: SiblingStore> ReorderEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: ScopeLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scopes with an operation running or queued in this process
    pub fn active_scopes(&self) -> usize {
        self.locks.len()
    }

    async fn resolve(&self, member: MemberRef) -> OrderResult<ScopeKey> {
        self.store
            .scope_of(member)
            .await?
            .ok_or_else(|| OrderError::not_found(member))
    }

    async fn begin_locked(&self, scopes: &[ScopeKey]) -> OrderResult<S::Tx> {
        let mut ordered = scopes.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut tx = self.store.begin().await?;
        for scope in ordered {
            tx.lock_scope(scope).await?;
        }
        Ok(tx)
    }

    /// The member must still be where it was resolved before locking
    async fn confirm_scope(tx: &mut S::Tx, member: MemberRef, expected: ScopeKey) -> OrderResult<()> {
        match tx.scope_of(member).await? {
            Some(scope) if scope == expected => Ok(()),
            Some(scope) => Err(OrderError::Conflict(format!(
                "{member} moved from {expected} to {scope}"
            ))),
            None => Err(OrderError::not_found(member)),
        }
    }

    async fn normalize_in(tx: &mut S::Tx, scope: ScopeKey) -> OrderResult<Normalized> {
        let normalized = checker::inspect(tx.load(scope).await?);
        if normalized.was_repaired() {
            tracing::warn!(
                scope = %scope,
                repaired = normalized.changes.len(),
                members = normalized.len(),
                "Repairing sibling positions"
            );
            tx.write_positions(scope.kind(), &normalized.changes).await?;
        }
        Ok(normalized)
    }

    /// Load a scope, persisting repairs when its positions are not dense
    pub async fn normalize(&self, scope: ScopeKey) -> OrderResult<Normalized> {
        let _guard = self.locks.acquire(scope).await;
        let mut tx = self.begin_locked(&[scope]).await?;
        let normalized = Self::normalize_in(&mut tx, scope).await?;
        tx.commit().await?;
        Ok(normalized)
    }

    /// Swap a member with its neighbour
    ///
    /// At the first (up) or last (down) position this is a successful no-op.
    pub async fn move_adjacent(
        &self,
        member: MemberRef,
        direction: MoveDirection,
    ) -> OrderResult<Sibling> {
        let scope = self.resolve(member).await?;
        let _guard = self.locks.acquire(scope).await;
        let mut tx = self.begin_locked(&[scope]).await?;
        Self::confirm_scope(&mut tx, member, scope).await?;

        let normalized = Self::normalize_in(&mut tx, scope).await?;
        let changes = plan::move_adjacent(&normalized.members, member, direction)?;
        tx.write_positions(scope.kind(), &changes).await?;
        tx.commit().await?;

        let updated = placed(&normalized, &changes, member)?;
        tracing::debug!(
            member = %member,
            direction = %direction,
            position = updated.position,
            moved = !changes.is_empty(),
            "Moved sibling"
        );
        Ok(updated)
    }

    /// Put a member at `target` (clamped into the scope)
    pub async fn reorder_explicit(&self, member: MemberRef, target: i64) -> OrderResult<Sibling> {
        let scope = self.resolve(member).await?;
        let _guard = self.locks.acquire(scope).await;
        let mut tx = self.begin_locked(&[scope]).await?;
        Self::confirm_scope(&mut tx, member, scope).await?;

        let normalized = Self::normalize_in(&mut tx, scope).await?;
        let changes = plan::reorder_explicit(&normalized.members, member, target)?;
        tx.write_positions(scope.kind(), &changes).await?;
        tx.commit().await?;

        let updated = placed(&normalized, &changes, member)?;
        tracing::debug!(
            member = %member,
            requested = target,
            position = updated.position,
            shifted = changes.len(),
            "Reordered sibling"
        );
        Ok(updated)
    }

    /// Delete a member and close the gap it leaves
    pub async fn remove(&self, member: MemberRef) -> OrderResult<()> {
        let scope = self.resolve(member).await?;
        let _guard = self.locks.acquire(scope).await;
        let mut tx = self.begin_locked(&[scope]).await?;
        Self::confirm_scope(&mut tx, member, scope).await?;

        let normalized = Self::normalize_in(&mut tx, scope).await?;
        let changes = plan::close_gap(&normalized.members, member)?;
        tx.delete(member).await?;
        tx.write_positions(scope.kind(), &changes).await?;
        tx.commit().await?;

        tracing::info!(member = %member, scope = %scope, shifted = changes.len(), "Removed sibling");
        Ok(())
    }

    /// Move a member into another scope of the same kind
    ///
    /// The old scope closes its gap and the new scope opens a slot at
    /// `insert_position` (appending when `None`), in one transaction.
    pub async fn change_scope(
        &self,
        member: MemberRef,
        to: ScopeKey,
        insert_position: Option<i64>,
    ) -> OrderResult<Sibling> {
        self.change_scope_with(member, to, insert_position, |_, placed| {
            async move { Ok(placed) }.boxed()
        })
        .await
    }

    /// [`change_scope`](Self::change_scope) followed by `update` in the same
    /// transaction
    ///
    /// `update` receives the member as placed in `to`. If it fails the move
    /// is rolled back with it. Within the same scope a position reorders the
    /// member and no position leaves it where it is.
    pub async fn change_scope_with<T, F>(
        &self,
        member: MemberRef,
        to: ScopeKey,
        insert_position: Option<i64>,
        update: F,
    ) -> OrderResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx, Sibling) -> BoxFuture<'t, RepoResult<T>> + Send,
    {
        if to.kind() != member.kind {
            return Err(OrderError::ScopeMismatch { member, scope: to });
        }

        let from = self.resolve(member).await?;
        let _guards = self.locks.acquire_many(&[from, to]).await;
        let mut tx = self.begin_locked(&[from, to]).await?;
        Self::confirm_scope(&mut tx, member, from).await?;

        let updated = if from == to {
            let normalized = Self::normalize_in(&mut tx, from).await?;
            let changes = match insert_position {
                Some(target) => plan::reorder_explicit(&normalized.members, member, target)?,
                None => Vec::new(),
            };
            tx.write_positions(member.kind, &changes).await?;
            placed(&normalized, &changes, member)?
        } else {
            let source = Self::normalize_in(&mut tx, from).await?;
            let target = Self::normalize_in(&mut tx, to).await?;
            let leaving = source
                .find(member.id)
                .copied()
                .ok_or_else(|| OrderError::not_found(member))?;

            let closing = plan::close_gap(&source.members, member)?;
            let (slot, opening) = plan::open_slot(&target.members, insert_position);

            tx.write_positions(member.kind, &opening).await?;
            tx.rescope(member, to, slot).await?;
            tx.write_positions(member.kind, &closing).await?;
            Sibling {
                position: slot,
                ..leaving
            }
        };

        let output = update(&mut tx, updated).await?;
        tx.commit().await?;

        tracing::info!(
            member = %member,
            from = %from,
            to = %to,
            position = updated.position,
            "Changed sibling scope"
        );
        Ok(output)
    }

    /// Create a record at the end of `scope`
    ///
    /// The scope is locked and normalized first; `insert` then runs inside
    /// the same transaction and receives the position to store.
    pub async fn admit<T, F>(&self, scope: ScopeKey, insert: F) -> OrderResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx, i32) -> BoxFuture<'t, RepoResult<T>> + Send,
    {
        let _guard = self.locks.acquire(scope).await;
        let mut tx = self.begin_locked(&[scope]).await?;

        let normalized = Self::normalize_in(&mut tx, scope).await?;
        let position = normalized.len() as i32;
        let created = insert(&mut tx, position).await?;
        tx.commit().await?;

        tracing::debug!(scope = %scope, position, "Admitted sibling");
        Ok(created)
    }
}

/// The member as it stands after `changes`
fn placed(
    normalized: &Normalized,
    changes: &[super::PositionChange],
    member: MemberRef,
) -> OrderResult<Sibling> {
    let current = normalized
        .find(member.id)
        .copied()
        .ok_or_else(|| OrderError::not_found(member))?;
    let position = changes
        .iter()
        .find(|c| c.id == member.id)
        .map_or(current.position, |c| c.to);
    Ok(Sibling { position, ..current })
}
