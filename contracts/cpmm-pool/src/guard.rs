use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::error::PoolError;

/// Mutual exclusion for one pool, with explicit rejection of reentry.
///
/// Other threads queue on the inner mutex. The thread already holding it is
/// recorded in `holder`, so a collaborator calling back into the pool gets
/// `PoolError::Reentrancy` instead of deadlocking on its own lock.
#[derive(Debug)]
pub(crate) struct ExclusiveLock<T> {
    inner: Mutex<T>,
    holder: Mutex<Option<ThreadId>>,
}

impl<T> ExclusiveLock<T> {
    pub fn new(value: T) -> Self {
        ExclusiveLock {
            inner: Mutex::new(value),
            holder: Mutex::new(None),
        }
    }

    /// Blocks until no other operation is in flight.
    pub fn acquire(&self) -> Result<LockGuard<'_, T>, PoolError> {
        let me = thread::current().id();
        if *self.holder() == Some(me) {
            tracing::warn!("rejected reentrant pool access");
            return Err(PoolError::Reentrancy {});
        }
        let inner = self.inner.lock().map_err(|_| PoolError::LockPoisoned {})?;
        *self.holder() = Some(me);
        Ok(LockGuard {
            inner,
            holder: &self.holder,
        })
    }

    /// Like `acquire`, but reports contention instead of waiting.
    #[cfg(test)]
    pub fn try_acquire(&self) -> Result<Option<LockGuard<'_, T>>, PoolError> {
        let me = thread::current().id();
        if *self.holder() == Some(me) {
            return Err(PoolError::Reentrancy {});
        }
        let inner = match self.inner.try_lock() {
            Ok(inner) => inner,
            Err(std::sync::TryLockError::WouldBlock) => return Ok(None),
            Err(std::sync::TryLockError::Poisoned(_)) => return Err(PoolError::LockPoisoned {}),
        };
        *self.holder() = Some(me);
        Ok(Some(LockGuard {
            inner,
            holder: &self.holder,
        }))
    }

    fn holder(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct LockGuard<'a, T> {
    inner: MutexGuard<'a, T>,
    holder: &'a Mutex<Option<ThreadId>>,
}

impl<T> Deref for LockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for LockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T> Drop for LockGuard<'_, T> {
    fn drop(&mut self) {
        // Cleared before `inner` is released so the next holder never sees a stale id
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
