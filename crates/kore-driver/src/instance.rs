//! Weakly held, lazily created shared instances.
//!
//! The cell never owns its value: it keeps a `Weak` to whatever `Arc` it last
//! handed out. Once every holder drops its `Arc` the value is destroyed, and
//! the next access builds a fresh one.

use std::convert::Infallible;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

pub struct InstanceCell<T> {
    slot: RwLock<Weak<T>>,
}

impl<T> InstanceCell<T> {
    pub const fn new() -> Self {
        Self { slot: parking_lot::const_rwlock(Weak::new()) }
    }

    /// The live instance, if any holder still keeps it alive.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().upgrade()
    }

    /// Return the live instance or build one with `init`.
    ///
    /// Concurrent callers race on a shared read first; only on a miss do they
    /// take the write lock, where the slot is checked again before `init` runs.
    /// At most one `init` executes per generation. If `init` fails nothing is
    /// stored and the next caller retries.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(live) = self.get() {
            return Ok(live);
        }

        let mut slot = self.slot.write();
        if let Some(live) = slot.upgrade() {
            return Ok(live);
        }
        let fresh = Arc::new(init()?);
        *slot = Arc::downgrade(&fresh);
        Ok(fresh)
    }

    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> Arc<T> {
        match self.get_or_try_init(|| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<T> Default for InstanceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
