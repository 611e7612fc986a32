//! In-process scope locks
//!
//! Serializes operations on the same scope inside one server process, so
//! concurrent requests queue here instead of piling up on database locks.
//! Operations on different scopes never wait on each other. A scope's entry
//! lives only while someone holds or waits for it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::scope::ScopeKey;

type Registry = DashMap<ScopeKey, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct ScopeLocks {
    inner: Arc<Registry>,
}

/// Exclusive hold on one scope; releasing the last hold evicts the entry
#[derive(Debug)]
pub struct ScopeGuard {
    scope: ScopeKey,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<Registry>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold their own clone, so the count only reaches 1 when idle
        self.registry
            .remove_if(&self.scope, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, scope: ScopeKey) -> ScopeGuard {
        let lock = self.inner.entry(scope).or_default().clone();
        let guard = lock.lock_owned().await;
        ScopeGuard {
            scope,
            guard: Some(guard),
            registry: self.inner.clone(),
        }
    }

    /// Lock several scopes in `ScopeKey` order
    pub async fn acquire_many(&self, scopes: &[ScopeKey]) -> Vec<ScopeGuard> {
        let mut ordered = scopes.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for scope in ordered {
            guards.push(self.acquire(scope).await);
        }
        guards
    }

    /// Number of scopes currently held or awaited
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
