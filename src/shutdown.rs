//! Cooperative cancellation for the control loop and its helper threads.
//!
//! A [`ShutdownSignal`] is a latching flag paired with a condition
//! variable so that sleepers wake the moment it is triggered.  Signals
//! form a tree: triggering a parent triggers every child created from it,
//! while triggering a child leaves the parent untouched.  The pump timer
//! uses a child signal so the loop can cancel one activation without
//! stopping itself.

use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    wake: Condvar,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn trigger(&self) {
        {
            let mut flag = self.triggered.lock().unwrap_or_else(PoisonError::into_inner);
            if *flag {
                return;
            }
            *flag = true;
        }
        self.wake.notify_all();

        let children = std::mem::take(
            &mut *self.children.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.trigger();
        }
    }

    fn is_triggered(&self) -> bool {
        *self.triggered.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clonable cancellation handle.  All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the signal and wake every sleeper, including those on
    /// child signals.  Idempotent.
    pub fn trigger(&self) {
        self.inner.trigger();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.is_triggered()
    }

    /// Sleep for up to `duration`, returning early if the signal fires.
    ///
    /// Returns `true` when the signal was triggered (before or during the
    /// sleep) and `false` when the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let guard = self.inner.triggered.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .inner
            .wake
            .wait_timeout_while(guard, duration, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Derive a signal that fires when `self` fires, but can also be
    /// triggered on its own without affecting `self`.
    pub fn child(&self) -> Self {
        let child = Self::new();
        let mut children = self
            .inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Checked under the children lock so a concurrent trigger either
        // sees the new child or we see the latched flag.
        if self.is_triggered() {
            drop(children);
            child.trigger();
        } else {
            children.retain(|w| w.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }
}
