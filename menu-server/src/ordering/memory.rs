//! In-memory sibling store
//!
//! A complete [`SiblingStore`] backed by a map. A transaction works on a
//! snapshot and journals its writes; commit replays the journal onto the
//! shared map, so an uncommitted transaction leaves no trace. `lock_scope`
//! takes a real per-scope lock and refreshes the snapshot, which lets
//! transactions on different scopes run side by side. Used by the
//! test-suite, which also relies on raw seeding (to build corrupted scopes)
//! and write-fault injection.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::locks::{ScopeGuard, ScopeLocks};
use super::scope::{EntityKind, MemberRef, ScopeKey};
use super::store::{RepoError, RepoResult, SiblingStore, SiblingTx};
use super::{PositionChange, Sibling};

const UNLIMITED: usize = usize::MAX;

type RowKey = (EntityKind, i64);

#[derive(Debug, Clone)]
struct Row {
    scope: ScopeKey,
    position: i32,
    created_at: i64,
}

/// A committed-on-replay write
#[derive(Debug, Clone)]
enum Effect {
    Insert(RowKey, Row),
    Positions(EntityKind, Vec<(i64, i32)>),
    Rescope(RowKey, ScopeKey, i32),
    Delete(MemberRef),
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    rows: BTreeMap<RowKey, Row>,
}

impl MemoryState {
    fn parent_exists(&self, scope: ScopeKey) -> bool {
        match (scope.kind().parent_kind(), scope.parent()) {
            (Some(kind), Some(id)) => self.rows.contains_key(&(kind, id)),
            _ => true,
        }
    }

    fn scope_of(&self, member: MemberRef) -> Option<ScopeKey> {
        self.rows.get(&(member.kind, member.id)).map(|row| row.scope)
    }

    fn load(&self, scope: ScopeKey) -> Vec<Sibling> {
        let mut members: Vec<Sibling> = self
            .rows
            .iter()
            .filter(|(_, row)| row.scope == scope)
            .map(|((_, id), row)| Sibling {
                id: *id,
                position: row.position,
                created_at: row.created_at,
            })
            .collect();
        members.sort_by_key(|m| (m.position, m.created_at, m.id));
        members
    }

    fn children_of(&self, member: MemberRef) -> Vec<RowKey> {
        let Some(child_kind) = member.kind.child_kind() else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|(key, row)| key.0 == child_kind && row.scope.parent() == Some(member.id))
            .map(|(key, _)| *key)
            .collect()
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::Insert(key, row) => {
                self.rows.insert(*key, row.clone());
            }
            Effect::Positions(kind, moves) => {
                for (id, position) in moves {
                    if let Some(row) = self.rows.get_mut(&(*kind, *id)) {
                        row.position = *position;
                    }
                }
            }
            Effect::Rescope(key, scope, position) => {
                if let Some(row) = self.rows.get_mut(key) {
                    row.scope = *scope;
                    row.position = *position;
                }
            }
            Effect::Delete(member) => {
                if member.kind == EntityKind::StoryCategory {
                    for key in self.children_of(*member) {
                        self.rows.remove(&key);
                    }
                }
                self.rows.remove(&(member.kind, member.id));
            }
        }
    }
}

/// Map-backed store; clones share state
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    scope_locks: ScopeLocks,
    sequence: Arc<AtomicI64>,
    write_budget: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            scope_locks: ScopeLocks::new(),
            sequence: Arc::new(AtomicI64::new(0)),
            write_budget: Arc::new(AtomicUsize::new(UNLIMITED)),
        }
    }

    /// Ids double as creation timestamps, so creation order is id order
    fn new_row(&self, scope: ScopeKey, position: i32) -> (RowKey, Row) {
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let row = Row {
            scope,
            position,
            created_at: id,
        };
        ((scope.kind(), id), row)
    }

    /// Insert a member at a raw position, bypassing every check
    pub async fn seed(&self, scope: ScopeKey, position: i32) -> i64 {
        let (key, row) = self.new_row(scope, position);
        self.state.lock().await.rows.insert(key, row);
        key.1
    }

    /// Seed one member per position, in creation order
    pub async fn seed_many(&self, scope: ScopeKey, positions: &[i32]) -> Vec<i64> {
        let mut state = self.state.lock().await;
        positions
            .iter()
            .map(|&position| {
                let (key, row) = self.new_row(scope, position);
                state.rows.insert(key, row);
                key.1
            })
            .collect()
    }

    /// Seed `count` members with dense positions
    pub async fn seed_dense(&self, scope: ScopeKey, count: usize) -> Vec<i64> {
        let positions: Vec<i32> = (0..count as i32).collect();
        self.seed_many(scope, &positions).await
    }

    /// Stored members of a scope in load order
    pub async fn members(&self, scope: ScopeKey) -> Vec<Sibling> {
        self.state.lock().await.load(scope)
    }

    /// Member ids of a scope in load order
    pub async fn order(&self, scope: ScopeKey) -> Vec<i64> {
        self.members(scope).await.iter().map(|m| m.id).collect()
    }

    /// Stored positions of a scope in load order
    pub async fn positions(&self, scope: ScopeKey) -> Vec<i32> {
        self.members(scope).await.iter().map(|m| m.position).collect()
    }

    pub async fn contains(&self, member: MemberRef) -> bool {
        self.state
            .lock()
            .await
            .rows
            .contains_key(&(member.kind, member.id))
    }

    /// Let the next `writes` mutating calls succeed, then fail every one after
    pub fn fail_writes_after(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.write_budget.store(UNLIMITED, Ordering::SeqCst);
    }
}

#[async_trait]
impl SiblingStore for MemoryStore {
    type Tx = MemoryTx;

    async fn scope_of(&self, member: MemberRef) -> RepoResult<Option<ScopeKey>> {
        Ok(self.state.lock().await.scope_of(member))
    }

    async fn begin(&self) -> RepoResult<MemoryTx> {
        let working = self.state.lock().await.clone();
        Ok(MemoryTx {
            store: self.clone(),
            working,
            journal: Vec::new(),
            held: Vec::new(),
        })
    }
}

/// Transaction over a snapshot of the store
pub struct MemoryTx {
    store: MemoryStore,
    working: MemoryState,
    journal: Vec<Effect>,
    held: Vec<ScopeGuard>,
}

impl MemoryTx {
    fn spend_write(&self) -> RepoResult<()> {
        self.store
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            })
            .map(|_| ())
            .map_err(|_| RepoError::Database("injected write failure".to_string()))
    }

    fn record(&mut self, effect: Effect) {
        self.working.apply(&effect);
        self.journal.push(effect);
    }

    /// Insert a new member, as an entity repository would inside `admit`
    pub fn insert(&mut self, scope: ScopeKey, position: i32) -> RepoResult<i64> {
        self.spend_write()?;
        if !self.working.parent_exists(scope) {
            return Err(RepoError::missing_parent(scope));
        }
        let (key, row) = self.store.new_row(scope, position);
        self.record(Effect::Insert(key, row));
        Ok(key.1)
    }
}

#[async_trait]
impl SiblingTx for MemoryTx {
    async fn lock_scope(&mut self, scope: ScopeKey) -> RepoResult<()> {
        let guard = self.store.scope_locks.acquire(scope).await;
        self.held.push(guard);

        // see everything committed before the lock was granted
        let mut working = self.store.state.lock().await.clone();
        for effect in &self.journal {
            working.apply(effect);
        }
        self.working = working;
        Ok(())
    }

    async fn scope_of(&mut self, member: MemberRef) -> RepoResult<Option<ScopeKey>> {
        Ok(self.working.scope_of(member))
    }

    async fn load(&mut self, scope: ScopeKey) -> RepoResult<Vec<Sibling>> {
        Ok(self.working.load(scope))
    }

    async fn write_positions(
        &mut self,
        kind: EntityKind,
        changes: &[PositionChange],
    ) -> RepoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.spend_write()?;
        if let Some(missing) = changes
            .iter()
            .find(|c| !self.working.rows.contains_key(&(kind, c.id)))
        {
            return Err(RepoError::not_found(MemberRef::new(kind, missing.id)));
        }
        let moves = changes.iter().map(|c| (c.id, c.to)).collect();
        self.record(Effect::Positions(kind, moves));
        Ok(())
    }

    async fn delete(&mut self, member: MemberRef) -> RepoResult<()> {
        self.spend_write()?;
        if !self.working.rows.contains_key(&(member.kind, member.id)) {
            return Err(RepoError::not_found(member));
        }
        // stories go with their category, menu records must be emptied first
        if member.kind != EntityKind::StoryCategory && !self.working.children_of(member).is_empty()
        {
            return Err(RepoError::in_use(member));
        }
        self.record(Effect::Delete(member));
        Ok(())
    }

    async fn rescope(&mut self, member: MemberRef, to: ScopeKey, position: i32) -> RepoResult<()> {
        self.spend_write()?;
        if !self.working.parent_exists(to) {
            return Err(RepoError::missing_parent(to));
        }
        let key = (member.kind, member.id);
        if !self.working.rows.contains_key(&key) {
            return Err(RepoError::not_found(member));
        }
        self.record(Effect::Rescope(key, to, position));
        Ok(())
    }

    async fn commit(self) -> RepoResult<()> {
        let MemoryTx {
            store,
            journal,
            held,
            ..
        } = self;
        {
            let mut state = store.state.lock().await;
            for effect in &journal {
                state.apply(effect);
            }
        }
        drop(held);
        Ok(())
    }
}
