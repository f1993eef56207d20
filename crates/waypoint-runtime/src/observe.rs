#![forbid(unsafe_code)]

//! Change notifications for the view layer.
//!
//! A view layer renders reactively off a manager's paths, root slots and
//! active presentation. It registers an observer per manager and receives one
//! [`NavigationEvent`] per mutated field, synchronously, in mutation order.
//!
//! # How it works
//!
//! 1. [`NavigationTree::subscribe`](crate::NavigationTree::subscribe) stores
//!    the callback under the manager's id and returns an [`ObserverId`].
//! 2. Every field write inside the tree is followed by a dispatch to that
//!    manager's observers. Unrelated fields are never batched together.
//! 3. Removing the manager drops its observers.
//!
//! Observers receive the event by reference while the tree is mid-operation,
//! so they cannot call back into it. Queue follow-up navigation and issue it
//! after the current call returns.

use std::collections::HashMap;
use std::fmt;

use waypoint_core::{NavigationStatus, PresentationMethod};

use crate::diagnostics::ReconciliationFault;
use crate::manager::ManagerId;

/// Identifier of a registered observer.
pub type ObserverId = u64;

/// Callback invoked for each change on the observed manager.
pub type Observer = Box<dyn FnMut(&NavigationEvent) + Send>;

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    RootPath { len: usize },
    SheetPath { len: usize },
    CoverPath { len: usize },
    RootSheet { present: bool },
    RootCover { present: bool },
    ActivePresentation(PresentationMethod),
    Status(NavigationStatus),
    ReconciliationFault(ReconciliationFault),
}

impl Change {
    /// The change event for a path of the given presentation.
    #[must_use]
    pub fn path(presentation: PresentationMethod, len: usize) -> Self {
        match presentation {
            PresentationMethod::Stack => Self::RootPath { len },
            PresentationMethod::Sheet => Self::SheetPath { len },
            PresentationMethod::Cover => Self::CoverPath { len },
        }
    }

    /// The change event for a modal root slot. `None` for `Stack`.
    #[must_use]
    pub fn root_slot(presentation: PresentationMethod, present: bool) -> Option<Self> {
        match presentation {
            PresentationMethod::Stack => None,
            PresentationMethod::Sheet => Some(Self::RootSheet { present }),
            PresentationMethod::Cover => Some(Self::RootCover { present }),
        }
    }
}

/// A change on one manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub manager: ManagerId,
    pub change: Change,
}

/// Observers keyed by the manager they watch.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: ObserverId,
    by_manager: HashMap<ManagerId, Vec<(ObserverId, Observer)>>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, manager: ManagerId, observer: Observer) -> ObserverId {
        self.next_id += 1;
        let id = self.next_id;
        self.by_manager
            .entry(manager)
            .or_default()
            .push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let mut removed = false;
        self.by_manager.retain(|_, observers| {
            let before = observers.len();
            observers.retain(|(oid, _)| *oid != id);
            removed |= observers.len() != before;
            !observers.is_empty()
        });
        removed
    }

    pub(crate) fn remove_manager(&mut self, manager: ManagerId) {
        self.by_manager.remove(&manager);
    }

    pub(crate) fn dispatch(&mut self, manager: ManagerId, change: Change) {
        let Some(observers) = self.by_manager.get_mut(&manager) else {
            return;
        };
        let event = NavigationEvent { manager, change };
        for (_, observer) in observers.iter_mut() {
            observer(&event);
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.by_manager.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.count())
            .finish()
    }
}
