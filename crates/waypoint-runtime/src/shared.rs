//! Thread-safe wrapper serializing access to a tree.
//!
//! The state machine's multi-field invariants only hold between calls, so
//! every operation runs under one lock. A poisoned lock is recovered: a panic
//! in an observer leaves the tree between two complete calls at worst.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use waypoint_core::NavigationConfig;

use crate::error::TreeResult;
use crate::handle::ManagerMut;
use crate::manager::ManagerId;
use crate::tree::NavigationTree;

/// Cloneable, lock-protected [`NavigationTree`].
#[derive(Clone, Default, Debug)]
pub struct SharedNavigationTree {
    inner: Arc<Mutex<NavigationTree>>,
}

impl SharedNavigationTree {
    #[must_use]
    pub fn new(tree: NavigationTree) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    #[must_use]
    pub fn with_config(config: NavigationConfig) -> Self {
        Self::new(NavigationTree::new(config))
    }

    fn lock(&self) -> MutexGuard<'_, NavigationTree> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the tree.
    pub fn with<R>(&self, f: impl FnOnce(&mut NavigationTree) -> R) -> R {
        f(&mut self.lock())
    }

    /// Run `f` against one manager.
    pub fn with_manager<R>(
        &self,
        id: ManagerId,
        f: impl FnOnce(&mut ManagerMut<'_>) -> R,
    ) -> TreeResult<R> {
        let mut tree = self.lock();
        let mut handle = tree.manager_mut(id)?;
        Ok(f(&mut handle))
    }
}
