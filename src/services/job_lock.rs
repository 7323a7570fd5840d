use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};

/// Key held while a bulk reconciliation run is in flight
pub const RECONCILIATION_JOB_KEY: &str = "reconciliation-job";

/// A held job lock. Call `release` when the job finishes; dropping the
/// lease without releasing frees local locks immediately and leaves
/// distributed locks to expire.
#[async_trait::async_trait]
pub trait JobLease: Send {
    async fn release(self: Box<Self>) -> AppResult<()>;
}

/// Run-level mutual exclusion for background jobs
#[async_trait::async_trait]
pub trait JobLock: Send + Sync {
    /// Returns `None` when another holder owns `key`
    async fn try_acquire(&self, key: &str) -> AppResult<Option<Box<dyn JobLease>>>;
}

type LockTable<K> = Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>;

/// Async mutexes created on demand per key. An entry lives only while
/// someone holds or waits for its key.
pub struct KeyedMutex<K> {
    locks: LockTable<K>,
}

impl<K: Eq + Hash + Clone> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedMutex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &K) -> AppResult<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AppError::Internal("Keyed lock table poisoned".to_string()))?;
        Ok(locks.entry(key.clone()).or_default().clone())
    }

    fn guard(&self, key: &K, guard: OwnedMutexGuard<()>) -> KeyedGuard<K> {
        KeyedGuard {
            guard: Some(guard),
            key: key.clone(),
            locks: self.locks.clone(),
        }
    }

    /// Waits until `key` is free and holds it until the guard drops
    pub async fn lock(&self, key: &K) -> AppResult<KeyedGuard<K>> {
        let guard = self.entry(key)?.lock_owned().await;
        Ok(self.guard(key, guard))
    }

    /// Takes `key` only if nobody holds it
    pub fn try_lock(&self, key: &K) -> AppResult<Option<KeyedGuard<K>>> {
        Ok(self
            .entry(key)?
            .try_lock_owned()
            .ok()
            .map(|guard| self.guard(key, guard)))
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

/// Holds one key of a `KeyedMutex`. Dropping it frees the key and removes
/// the table entry when no other task is waiting on it.
pub struct KeyedGuard<K: Eq + Hash> {
    guard: Option<OwnedMutexGuard<()>>,
    key: K,
    locks: LockTable<K>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        // The table lock is held across the release so no task can clone
        // the entry between the count check and the removal.
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        self.guard.take();
        if locks
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// In-process job lock, sufficient for a single service instance
#[derive(Default)]
pub struct LocalJobLock {
    keys: KeyedMutex<String>,
}

impl LocalJobLock {
    pub fn new() -> Self {
        Self::default()
    }
}

struct LocalLease {
    _guard: KeyedGuard<String>,
}

#[async_trait::async_trait]
impl JobLease for LocalLease {
    async fn release(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobLock for LocalJobLock {
    async fn try_acquire(&self, key: &str) -> AppResult<Option<Box<dyn JobLease>>> {
        Ok(self
            .keys
            .try_lock(&key.to_string())?
            .map(|guard| Box::new(LocalLease { _guard: guard }) as Box<dyn JobLease>))
    }
}
