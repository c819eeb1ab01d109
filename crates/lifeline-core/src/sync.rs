//! Lock primitives shared by every runtime component.
//!
//! A [`LockSet`] bundles the guarded value behind a shared/exclusive lock
//! with a condition variable and a counting barrier, so a component owns a
//! single synchronization object instead of three loose ones.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Shared/exclusive lock plus condition and barrier primitives.
pub struct LockSet<T> {
    value: RwLock<T>,
    generation: Mutex<u64>,
    cond: Condvar,
    pending: Mutex<usize>,
    idle: Condvar,
}

impl<T> LockSet<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            generation: Mutex::new(0),
            cond: Condvar::new(),
            pending: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    /// Take the shared lock.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read()
    }

    /// Take the exclusive lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write()
    }

    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.value.try_read()
    }

    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.value.try_write()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Block until the next [`notify_one`](Self::notify_one) or
    /// [`notify_all`](Self::notify_all).
    pub fn wait(&self) {
        let mut generation = self.generation.lock();
        let start = *generation;
        while *generation == start {
            self.cond.wait(&mut generation);
        }
    }

    /// Like [`wait`](Self::wait) with a deadline. Returns `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        let start = *generation;
        while *generation == start {
            if self.cond.wait_until(&mut generation, deadline).timed_out() {
                return *generation != start;
            }
        }
        true
    }

    /// Wake at least one waiter.
    pub fn notify_one(&self) {
        *self.generation.lock() += 1;
        self.cond.notify_one();
    }

    /// Wake every waiter.
    pub fn notify_all(&self) {
        *self.generation.lock() += 1;
        self.cond.notify_all();
    }

    /// Register `count` units of outstanding work on the barrier.
    pub fn add(&self, count: usize) {
        *self.pending.lock() += count;
    }

    /// Mark one unit of work as finished.
    pub fn done(&self) {
        let mut pending = self.pending.lock();
        if *pending == 0 {
            warn!("LockSet::done called with no outstanding work");
            return;
        }
        *pending -= 1;
        if *pending == 0 {
            self.idle.notify_all();
        }
    }

    /// Outstanding work units.
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Block until the barrier counter drops to zero.
    pub fn wait_idle(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            self.idle.wait(&mut pending);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) with a deadline. Returns `false` on timeout.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while *pending > 0 {
            if self.idle.wait_until(&mut pending, deadline).timed_out() {
                return *pending == 0;
            }
        }
        true
    }
}

impl<T: Default> Default for LockSet<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LockSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSet")
            .field("value", &self.value)
            .field("pending", &self.pending())
            .finish()
    }
}
