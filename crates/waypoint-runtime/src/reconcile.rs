//! Keeping the ledger in step with the paths.
//!
//! Paths can shrink for reasons the state machine did not initiate: a
//! swipe-back gesture, a dismissed modal, the view layer writing back a
//! shorter path. Every shrink pops the same number of entries off the ledger,
//! provided each popped entry belongs to the shrinking path.
//!
//! # Invariants
//!
//! - Only local entries of the shrinking presentation are popped.
//! - Popped ids are broadcast to the children, which drop matching
//!   delegation markers from their own tops and broadcast further down.
//! - The active presentation is recomputed from the new ledger top, and the
//!   derived status is republished when it changed, here and in every
//!   descendant whose top entry delegates upward.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Top entry of another presentation, or a delegation marker | Stop popping, record a [`ReconciliationFault`] |
//! | Modal path written while its root slot is empty | Write ignored, logged at error |
//! | Path grew outside `navigate` | Accepted, no history recorded, logged at error |

use waypoint_core::{EntryId, LogLevel, Page, PathChange, PresentationMethod};

use crate::debug_trace;
use crate::diagnostics::ReconciliationFault;
use crate::manager::ManagerId;
use crate::observe::Change;
use crate::scheduler::SettleAction;
use crate::tree::NavigationTree;

impl NavigationTree {
    /// Pop `expected` entries of `presentation` off the ledger top.
    ///
    /// Returns the ids actually popped.
    pub(crate) fn reconcile_shrink(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        expected: usize,
    ) -> Vec<EntryId> {
        let mut popped = Vec::with_capacity(expected);
        let Some(manager) = self.managers.get(&id) else {
            return popped;
        };

        let mut fault = None;
        while popped.len() < expected {
            match manager.history.pop_if(|entry| entry.is_local(presentation)) {
                Some(entry) => popped.push(entry.id()),
                None => {
                    let top = manager.history.peek();
                    fault = Some(ReconciliationFault {
                        manager: id,
                        presentation,
                        expected,
                        popped: popped.len(),
                        found: top.as_ref().map(|entry| entry.presentation()),
                        found_delegated: top
                            .as_ref()
                            .is_some_and(|entry| entry.is_delegated_to_parent()),
                    });
                    break;
                }
            }
        }

        tracing::trace!(
            target: "waypoint",
            manager = %id,
            presentation = presentation.as_str(),
            expected,
            popped = popped.len(),
            "reconciled"
        );
        if let Some(fault) = fault {
            self.record_fault(fault);
        }
        popped
    }

    fn record_fault(&mut self, fault: ReconciliationFault) {
        let capacity = self.config.max_fault_records;
        self.diagnostics.record_fault(fault.clone(), capacity);
        self.log(
            fault.manager,
            LogLevel::Critical,
            format_args!("history out of sync: {fault}"),
        );
        self.emit(fault.manager, Change::ReconciliationFault(fault));
    }

    /// Dismiss a modal: clear its path and root slot and pop its entries.
    pub(crate) fn clear_modal(&mut self, id: ManagerId, presentation: PresentationMethod) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let path_len = manager.path_mut(presentation).clear();
        let had_root = manager
            .root_slot_mut(presentation)
            .and_then(Option::take)
            .is_some();

        if path_len > 0 {
            self.emit(id, Change::path(presentation, 0));
        }
        if had_root {
            if let Some(change) = Change::root_slot(presentation, false) {
                self.emit(id, change);
            }
        }

        let mut removed = self.reconcile_shrink(id, presentation, path_len + usize::from(had_root));
        if let Some(manager) = self.managers.get(&id) {
            while let Some(entry) = manager.history.pop_if(|entry| entry.is_local(presentation)) {
                removed.push(entry.id());
            }
        }
        if !removed.is_empty() {
            self.log(
                id,
                LogLevel::Verbose,
                format_args!("{presentation} cleared, {} entries popped", removed.len()),
            );
        }
        self.propagate_removed(id, &removed);
        self.refresh_active(id);
    }

    /// Drop children's delegation markers for entries this manager removed.
    pub(crate) fn propagate_removed(&mut self, id: ManagerId, removed: &[EntryId]) {
        if removed.is_empty() {
            return;
        }
        for child in self.children(id) {
            let mut dropped = Vec::new();
            if let Some(manager) = self.managers.get(&child) {
                while let Some(entry) = manager.history.pop_if(|entry| {
                    entry.is_delegated_to_parent() && removed.contains(&entry.id())
                }) {
                    dropped.push(entry.id());
                }
            }
            if !dropped.is_empty() {
                debug_trace!("{} dropped {} stale markers from {}", child, dropped.len(), id);
                self.log(
                    child,
                    LogLevel::Verbose,
                    format_args!("parent unwound {} delegated entries", dropped.len()),
                );
                self.propagate_removed(child, &dropped);
            }
            self.refresh_active(child);
        }
    }

    /// Recompute the active presentation and republish the status.
    ///
    /// Children whose top entry is a delegation marker derive their status
    /// from this manager, so they are refreshed too.
    pub(crate) fn refresh_active(&mut self, id: ManagerId) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let active = manager.history.top_presentation().unwrap_or_default();
        if manager.active_presentation != active {
            manager.active_presentation = active;
            self.emit(id, Change::ActivePresentation(active));
        }

        let status = self.status_of(id);
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        if manager.published_status != status {
            manager.published_status = status;
            self.emit(id, Change::Status(status));
        }

        for child in self.children(id) {
            if self.managers.get(&child).is_some_and(|m| m.parent_owns_top()) {
                self.refresh_active(child);
            }
        }
    }

    // ── View-layer write-back ────────────────────────────────────────────

    pub(crate) fn sync_path(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        pages: Vec<Page>,
    ) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        if presentation.is_modal() && manager.root_slot(presentation).is_none() && !pages.is_empty()
        {
            self.log(
                id,
                LogLevel::Error,
                format_args!("{presentation} path written while no {presentation} is presented"),
            );
            return;
        }
        let change = manager.path_mut(presentation).replace_all(pages);
        self.emit(id, Change::path(presentation, change.new_len));
        self.settle_path_change(id, presentation, change);
    }

    pub(crate) fn truncate_path(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        len: usize,
    ) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let change = manager.path_mut(presentation).truncate(len);
        if change.shrunk_by() > 0 {
            self.emit(id, Change::path(presentation, change.new_len));
            self.settle_path_change(id, presentation, change);
        }
    }

    fn settle_path_change(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        change: PathChange,
    ) {
        let grew = change.grew_by();
        if grew > 0 {
            self.log(
                id,
                LogLevel::Error,
                format_args!("{presentation} path grew by {grew} outside navigate; no history recorded"),
            );
            return;
        }
        let shrunk = change.shrunk_by();
        if shrunk == 0 {
            return;
        }
        self.log(
            id,
            LogLevel::Verbose,
            format_args!("{presentation} path shrank by {shrunk}"),
        );
        let removed = self.reconcile_shrink(id, presentation, shrunk);
        self.propagate_removed(id, &removed);
        self.refresh_active(id);
    }

    /// The view layer dismissed a modal by gesture.
    pub(crate) fn modal_dismissed(&mut self, id: ManagerId, presentation: PresentationMethod) {
        if !self.managers.contains_key(&id) {
            return;
        }
        self.cancel_tasks(id, |action| {
            matches!(action, SettleAction::CommitReset { presentation: p, .. } if *p == presentation)
        });
        self.log(id, LogLevel::Info, format_args!("{presentation} dismissed by the view"));
        self.clear_modal(id, presentation);
    }
}
