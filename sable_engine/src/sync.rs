//! Synchronization primitives for the idle loops of the thread pool.

use std::sync::{Condvar, Mutex};

/// A `LockLatch` starts closed and can be opened; threads may block until
/// it opens. Re-closable, unlike a one-shot latch.
pub struct LockLatch {
    m: Mutex<bool>,
    v: Condvar,
}

impl LockLatch {
    #[inline]
    pub fn new() -> LockLatch {
        LockLatch::with_value(false)
    }

    #[inline]
    fn with_value(value: bool) -> LockLatch {
        LockLatch {
            m: Mutex::new(value),
            v: Condvar::new(),
        }
    }

    /// Blocks until the latch is set.
    pub fn wait(&self) {
        self.wait_for(true);
    }

    /// Sets the latch to true and wakes every thread waiting on it.
    pub fn set(&self) {
        self.set_value(true);
    }

    /// Closes the latch, causing future waiters to block.
    pub fn lock(&self) {
        let mut guard = self.m.lock().unwrap();
        *guard = false;
    }

    fn set_value(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        *guard = value;
        self.v.notify_all();
    }

    fn wait_for(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        while *guard != value {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

impl Default for LockLatch {
    fn default() -> Self {
        LockLatch::new()
    }
}

/// A boolean whose specific values can be awaited, used to signal when a
/// worker enters and leaves its search.
pub struct GuardedBool {
    inner: LockLatch,
}

impl GuardedBool {
    #[inline]
    pub fn new(value: bool) -> GuardedBool {
        GuardedBool {
            inner: LockLatch::with_value(value),
        }
    }

    /// Sets the value, waking any waiters.
    #[inline]
    pub fn set(&self, value: bool) {
        self.inner.set_value(value);
    }

    /// Blocks until the value matches.
    #[inline]
    pub fn wait(&self, value: bool) {
        self.inner.wait_for(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latch_releases_waiter() {
        let latch = Arc::new(LockLatch::new());
        let waiter = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || latch.wait())
        };
        latch.set();
        waiter.join().unwrap();
    }

    #[test]
    fn guarded_bool_round_trip() {
        let b = Arc::new(GuardedBool::new(false));
        let setter = {
            let b = Arc::clone(&b);
            thread::spawn(move || b.set(true))
        };
        b.wait(true);
        setter.join().unwrap();
    }
}
