//! Lock-protected LIFO stack.
//!
//! The ledger is only ever mutated through a manager, which in turn is only
//! mutated from one logical context at a time. The stack still takes a lock
//! on every operation so that a snapshot taken on one thread never observes
//! a half-applied push from another.
//!
//! # Invariants
//!
//! 1. `pop` and `peek` on an empty stack return `None`; nothing panics.
//! 2. A poisoned lock is recovered, not propagated: the stack data is a plain
//!    `Vec` and cannot be left in a torn state by a panicking holder.
//! 3. `snapshot` is point-in-time; later pushes and pops do not affect it.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe last-in first-out stack.
pub struct SyncStack<T> {
    items: Mutex<Vec<T>>,
}

impl<T> SyncStack<T> {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Create a stack from items ordered bottom to top.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push onto the top.
    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    /// Remove and return the top item.
    pub fn pop(&self) -> Option<T> {
        self.lock().pop()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the stack holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Keep only the items matching `keep`, preserving order.
    pub fn retain(&self, keep: impl FnMut(&T) -> bool) {
        self.lock().retain(keep);
    }

    /// Count the items matching `pred`.
    #[must_use]
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.lock().iter().filter(|item| pred(*item)).count()
    }

    /// Whether any item matches `pred`.
    #[must_use]
    pub fn any(&self, pred: impl FnMut(&T) -> bool) -> bool {
        self.lock().iter().any(pred)
    }

    /// Move everything out, leaving the stack empty. Bottom first.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }
}

impl<T: Clone> SyncStack<T> {
    /// Clone of the top item.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.lock().last().cloned()
    }

    /// Point-in-time copy of all items, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}

impl<T> Default for SyncStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SyncStack<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.snapshot())
    }
}

impl<T: fmt::Debug> fmt::Debug for SyncStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}
