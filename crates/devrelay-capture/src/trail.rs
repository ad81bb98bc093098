//! Breadcrumb trail - bounded, thread-safe diagnostic log
//!
//! Holds the most recent [`MAX_BREADCRUMBS`] breadcrumbs in insertion
//! order. Eviction happens inside the same critical section as insertion,
//! so the trail is never observably over capacity even under concurrent
//! readers. The lock is only ever held for push/clone; never across a
//! network call.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use devrelay_core::domain::{Breadcrumb, Severity};
use tracing::debug;

/// Maximum number of breadcrumbs retained.
pub const MAX_BREADCRUMBS: usize = 50;

/// A bounded FIFO trail of recent diagnostic breadcrumbs.
pub struct BreadcrumbTrail {
    entries: Mutex<VecDeque<Breadcrumb>>,
}

impl BreadcrumbTrail {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(MAX_BREADCRUMBS)),
        }
    }

    /// Records a breadcrumb, evicting the oldest entry when at capacity.
    ///
    /// Safe to call from any thread; concurrent records are all retained
    /// in some consistent total order.
    pub fn record(&self, text: impl Into<String>, severity: Severity) {
        let crumb = Breadcrumb::new(text, severity);
        debug!(text = %crumb.text, severity = %severity, "Breadcrumb added");

        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            // A panic while holding the lock only loses diagnostics, never
            // the host's own state; keep recording on the poisoned data.
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() >= MAX_BREADCRUMBS {
            entries.pop_front();
        }
        entries.push_back(crumb);
    }

    /// Returns an immutable copy of the trail in insertion order.
    ///
    /// Later insertions never retroactively affect a returned snapshot.
    pub fn snapshot(&self) -> Vec<Breadcrumb> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.iter().cloned().collect()
    }

    /// Returns the number of breadcrumbs currently held.
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BreadcrumbTrail {
    fn default() -> Self {
        Self::new()
    }
}
