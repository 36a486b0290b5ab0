//! Admission gate bounding concurrent in-flight remote calls.

use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;

use tracing::trace;

/// Counting gate: at most `max_concurrent` permits are alive at any time.
#[derive(Debug)]
pub struct ConnectionLimiter {
    active: Mutex<usize>,
    released: Condvar,
    max_concurrent: usize,
}

impl ConnectionLimiter {
    /// A ceiling of zero is raised to one so `acquire` cannot block forever.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            active: Mutex::new(0),
            released: Condvar::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Blocks until a slot is free and takes it. The slot is given back when
    /// the permit is dropped.
    pub fn acquire(self: &Arc<Self>) -> ConnectionPermit {
        let mut active = self.active.lock().expect("poisoned");
        while *active >= self.max_concurrent {
            trace!(active = *active, "Connection limit reached, waiting");
            active = self.released.wait(active).expect("poisoned");
        }
        *active += 1;
        ConnectionPermit {
            limiter: Arc::clone(self),
        }
    }

    /// Number of calls currently holding a permit.
    pub fn active(&self) -> usize {
        *self.active.lock().expect("poisoned")
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    fn release(&self) {
        let mut active = self.active.lock().expect("poisoned");
        debug_assert!(*active > 0, "released more permits than acquired");
        *active = active.saturating_sub(1);
        self.released.notify_one();
    }
}

/// Slot of a [`ConnectionLimiter`], held for the duration of one logical call.
#[derive(Debug)]
pub struct ConnectionPermit {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
