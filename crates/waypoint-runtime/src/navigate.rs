//! Request routing, delegation and unwinding.
//!
//! # Routing
//!
//! A request is routed from the requested presentation, the manager's active
//! presentation and whether the top of its ledger is a delegation marker:
//!
//! | requested | state | route |
//! |-----------|-------|-------|
//! | stack | local sheet/cover on top | push inside that modal |
//! | stack | otherwise | parent if any, else own stack |
//! | sheet | sheet-capable | present or push the sheet |
//! | sheet | not capable | parent if any, else stack handling |
//! | cover | local sheet on top | push inside the sheet |
//! | cover | cover-capable | present or push the cover |
//! | cover | not capable | parent if any, else stack handling |
//!
//! "Stack handling" without a parent lands the page where a stack request
//! would: inside the open local modal, or on the own stack.
//!
//! A request for a modal presents a fresh root when `is_root` is set or the
//! slot is empty, and pushes inside the open modal otherwise.
//!
//! # Delegation
//!
//! The delegating manager records a marker entry first, then forwards the
//! request. The parent records its entry under the marker's id, so when the
//! parent later pops that entry the child can drop its stale marker.
//!
//! # Invariants
//!
//! - A request is never dropped: without a parent it lands on the own stack.
//! - Each local entry matches exactly one page in a path or a root slot.

use waypoint_core::{
    EntryId, HistoryEntry, LogLevel, NavigationState, NavigationStatus, Page,
    PresentationMethod,
};

use crate::debug_trace;
use crate::manager::{ManagerId, NavigationManager};
use crate::observe::Change;
use crate::scheduler::SettleAction;
use crate::tree::NavigationTree;

/// One element of a mixed-presentation navigation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationStep {
    pub page: Page,
    pub presentation: PresentationMethod,
}

impl NavigationStep {
    #[must_use]
    pub fn new(page: Page, presentation: PresentationMethod) -> Self {
        Self { page, presentation }
    }

    #[must_use]
    pub fn stack(page: Page) -> Self {
        Self::new(page, PresentationMethod::Stack)
    }

    #[must_use]
    pub fn sheet(page: Page) -> Self {
        Self::new(page, PresentationMethod::Sheet)
    }

    #[must_use]
    pub fn cover(page: Page) -> Self {
        Self::new(page, PresentationMethod::Cover)
    }
}

impl From<(Page, PresentationMethod)> for NavigationStep {
    fn from((page, presentation): (Page, PresentationMethod)) -> Self {
        Self::new(page, presentation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Delegate(ManagerId),
    Stack,
    Modal {
        presentation: PresentationMethod,
        is_root: bool,
    },
    /// No capability and no parent. Carries where a stack request would land.
    Fallback(PresentationMethod),
}

impl NavigationTree {
    fn route(
        &self,
        manager: &NavigationManager,
        requested: PresentationMethod,
        is_root: bool,
    ) -> Route {
        let parent = self.parent(manager.id);
        let local_top = !manager.parent_owns_top();
        let active = manager.active_presentation;
        let inside_modal = local_top && active.is_modal();
        let stack_target = if inside_modal {
            active
        } else {
            PresentationMethod::Stack
        };
        let delegate_or = |fallback: Route| parent.map_or(fallback, Route::Delegate);

        match requested {
            PresentationMethod::Stack => {
                if inside_modal {
                    Route::Modal {
                        presentation: active,
                        is_root: false,
                    }
                } else {
                    delegate_or(Route::Stack)
                }
            }
            PresentationMethod::Sheet => {
                if manager.sheet_capable {
                    Route::Modal {
                        presentation: PresentationMethod::Sheet,
                        is_root,
                    }
                } else {
                    delegate_or(Route::Fallback(stack_target))
                }
            }
            PresentationMethod::Cover => {
                if local_top && active == PresentationMethod::Sheet {
                    // An open sheet takes cover content into its own path.
                    Route::Modal {
                        presentation: PresentationMethod::Sheet,
                        is_root: false,
                    }
                } else if manager.cover_capable {
                    Route::Modal {
                        presentation: PresentationMethod::Cover,
                        is_root,
                    }
                } else {
                    delegate_or(Route::Fallback(stack_target))
                }
            }
        }
    }

    // ── Navigate ─────────────────────────────────────────────────────────

    pub(crate) fn navigate_request(
        &mut self,
        id: ManagerId,
        page: Page,
        presentation: PresentationMethod,
        is_root: bool,
        entry_id: Option<EntryId>,
    ) {
        let action = SettleAction::Navigate {
            page,
            presentation,
            is_root,
            entry_id,
        };
        if self.queue_behind(id, &action) {
            return;
        }
        if let SettleAction::Navigate { page, .. } = action {
            self.navigate_now(id, page, presentation, is_root, entry_id);
        }
    }

    pub(crate) fn navigate_now(
        &mut self,
        id: ManagerId,
        page: Page,
        presentation: PresentationMethod,
        is_root: bool,
        entry_id: Option<EntryId>,
    ) {
        let Some(manager) = self.managers.get(&id) else {
            return;
        };
        let route = self.route(manager, presentation, is_root);
        debug_trace!("{} navigate {} {} -> {:?}", id, presentation, page, route);

        match route {
            Route::Delegate(parent) => {
                self.delegate(id, parent, page, presentation, is_root, entry_id);
            }
            Route::Stack => self.push_local(id, PresentationMethod::Stack, page, entry_id),
            Route::Fallback(target) => {
                self.diagnostics.orphan_fallbacks += 1;
                self.log(
                    id,
                    LogLevel::Info,
                    format_args!("no {presentation} stack and no parent; pushing {page} onto {target}"),
                );
                if target.is_modal() {
                    self.land_in_modal(id, target, false, page, entry_id);
                } else {
                    self.push_local(id, PresentationMethod::Stack, page, entry_id);
                }
            }
            Route::Modal {
                presentation,
                is_root,
            } => self.land_in_modal(id, presentation, is_root, page, entry_id),
        }
    }

    /// Present a fresh modal root, or push inside the one already showing.
    fn land_in_modal(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        is_root: bool,
        page: Page,
        entry_id: Option<EntryId>,
    ) {
        let has_root = self
            .managers
            .get(&id)
            .is_some_and(|m| m.root_slot(presentation).is_some());
        if is_root || !has_root {
            self.present_modal_root(id, presentation, page, entry_id);
        } else {
            self.push_local(id, presentation, page, entry_id);
        }
    }

    fn delegate(
        &mut self,
        id: ManagerId,
        parent: ManagerId,
        page: Page,
        presentation: PresentationMethod,
        is_root: bool,
        entry_id: Option<EntryId>,
    ) {
        let Some(manager) = self.managers.get(&id) else {
            return;
        };
        let marker = entry_id.unwrap_or_else(EntryId::next);
        manager.history.push(
            HistoryEntry::delegated(marker, Some(page.clone()), presentation)
                .with_message(format!("delegated to {parent}")),
        );
        self.diagnostics.delegations += 1;
        let parent_name = self.identifier(parent);
        self.log(
            id,
            LogLevel::Info,
            format_args!("delegating {presentation} {page} to {parent_name}"),
        );
        self.navigate_request(parent, page, presentation, is_root, Some(marker));
        self.refresh_active(id);
    }

    fn push_local(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        page: Page,
        entry_id: Option<EntryId>,
    ) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let entry_id = entry_id.unwrap_or_else(EntryId::next);
        let path = manager.path_mut(presentation);
        path.push(page.clone());
        let len = path.len();
        manager
            .history
            .push(HistoryEntry::new(entry_id, Some(page.clone()), presentation));
        self.emit(id, Change::path(presentation, len));
        self.log(id, LogLevel::Info, format_args!("pushed {page} onto {presentation}"));
        self.refresh_active(id);
    }

    /// Replace a modal's root with `page`, clearing whatever the modal showed.
    fn present_modal_root(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        page: Page,
        entry_id: Option<EntryId>,
    ) {
        let entry_id = entry_id.unwrap_or_else(EntryId::next);
        let occupied = self.begin_reset(id, presentation);
        if occupied && self.config.defers_resets() {
            self.diagnostics.deferred_commits += 1;
            self.log(
                id,
                LogLevel::Verbose,
                format_args!("{presentation} root {page} deferred to the next tick"),
            );
            self.schedule_settle(
                id,
                SettleAction::CommitReset {
                    presentation,
                    page,
                    entry_id,
                },
            );
        } else {
            self.commit_reset(id, presentation, page, entry_id);
        }
    }

    /// First phase of a modal reset: clear the path and the root slot.
    ///
    /// Returns whether the slot held a page.
    pub(crate) fn begin_reset(&mut self, id: ManagerId, presentation: PresentationMethod) -> bool {
        let occupied = self
            .managers
            .get(&id)
            .is_some_and(|m| m.root_slot(presentation).is_some());
        self.clear_modal(id, presentation);
        occupied
    }

    /// Second phase of a modal reset: assign the root and record it.
    pub(crate) fn commit_reset(
        &mut self,
        id: ManagerId,
        presentation: PresentationMethod,
        page: Page,
        entry_id: EntryId,
    ) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let Some(slot) = manager.root_slot_mut(presentation) else {
            return;
        };
        *slot = Some(page.clone());
        manager
            .history
            .push(HistoryEntry::new(entry_id, Some(page.clone()), presentation));
        if let Some(change) = Change::root_slot(presentation, true) {
            self.emit(id, change);
        }
        self.log(id, LogLevel::Info, format_args!("presented {presentation} root {page}"));
        self.refresh_active(id);
    }

    pub(crate) fn navigate_pages(
        &mut self,
        id: ManagerId,
        pages: impl IntoIterator<Item = Page>,
        presentation: PresentationMethod,
        is_root: bool,
    ) {
        for (index, page) in pages.into_iter().enumerate() {
            self.navigate_request(id, page, presentation, is_root && index == 0, None);
        }
    }

    pub(crate) fn navigate_steps(
        &mut self,
        id: ManagerId,
        steps: impl IntoIterator<Item = NavigationStep>,
    ) {
        for step in steps {
            self.navigate_request(id, step.page, step.presentation, false, None);
        }
    }

    // ── Back / Replace ───────────────────────────────────────────────────

    pub(crate) fn back_request(&mut self, id: ManagerId) {
        if self.queue_behind(id, &SettleAction::Back) {
            return;
        }
        self.back_now(id);
    }

    pub(crate) fn back_now(&mut self, id: ManagerId) {
        let Some(manager) = self.managers.get(&id) else {
            return;
        };
        let Some(top) = manager.history.peek() else {
            self.diagnostics.empty_back_attempts += 1;
            self.log(id, LogLevel::Critical, format_args!("navigate back with empty history"));
            return;
        };

        if top.is_delegated_to_parent() {
            match self.parent(id) {
                Some(parent) => {
                    debug_trace!("{} back forwarded to {}", id, parent);
                    self.log(id, LogLevel::Verbose, format_args!("back forwarded to parent"));
                    self.back_request(parent);
                }
                None => {
                    self.log(
                        id,
                        LogLevel::Verbose,
                        format_args!("top entry is delegated but there is no parent"),
                    );
                }
            }
            return;
        }

        manager.history.pop();
        let presentation = top.presentation();
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let change = if presentation.is_modal() && manager.path(presentation).is_empty() {
            if let Some(slot) = manager.root_slot_mut(presentation) {
                *slot = None;
            }
            Change::root_slot(presentation, false)
        } else {
            let path = manager.path_mut(presentation);
            path.pop();
            Some(Change::path(presentation, path.len()))
        };
        if let Some(change) = change {
            self.emit(id, change);
        }
        self.log(id, LogLevel::Info, format_args!("back from {top}"));
        self.propagate_removed(id, &[top.id()]);
        self.refresh_active(id);
    }

    pub(crate) fn replace_request(&mut self, id: ManagerId, page: Page) {
        let action = SettleAction::Replace { page };
        if self.queue_behind(id, &action) {
            return;
        }
        if let SettleAction::Replace { page } = action {
            self.replace_now(id, page);
        }
    }

    pub(crate) fn replace_now(&mut self, id: ManagerId, page: Page) {
        let Some(manager) = self.managers.get(&id) else {
            return;
        };
        let presentation = manager.history.top_presentation().unwrap_or_default();
        self.log(id, LogLevel::Info, format_args!("replacing top {presentation} with {page}"));
        self.back_now(id);
        if self.config.defers_resets() {
            self.schedule_settle(
                id,
                SettleAction::Navigate {
                    page,
                    presentation,
                    is_root: false,
                    entry_id: None,
                },
            );
        } else {
            self.navigate_now(id, page, presentation, false, None);
        }
    }

    // ── Kill ─────────────────────────────────────────────────────────────

    /// Unwind every entry of the manager's ledger, newest first.
    pub(crate) fn kill_the_flow(&mut self, id: ManagerId) {
        let Some(manager) = self.managers.get(&id) else {
            return;
        };
        if manager.is_pristine() {
            self.cancel_tasks(id, |_| true);
            return;
        }
        let snapshot = manager.history.clone();
        self.log(
            id,
            LogLevel::Info,
            format_args!("killing flow with {} entries", snapshot.count()),
        );
        self.cancel_tasks(id, |_| true);

        while let Some(entry) = snapshot.pop() {
            let live = self
                .managers
                .get(&id)
                .is_some_and(|m| m.history.contains(entry.id()));
            if !live {
                continue;
            }
            if !entry.is_delegated_to_parent() {
                self.back_now(id);
                continue;
            }
            if let Some(parent) = self.parent(id) {
                self.back_request(parent);
            }
            let stale = self.managers.get(&id).and_then(|m| {
                m.history
                    .pop_if(|top| top.id() == entry.id() && top.is_delegated_to_parent())
            });
            if let Some(stale) = stale {
                self.propagate_removed(id, &[stale.id()]);
                self.refresh_active(id);
            }
        }

        let leftover = self.managers.get(&id).is_some_and(|m| !m.is_pristine());
        if leftover {
            self.force_clear(id);
        }
    }

    /// Drop every path, slot and entry of a manager.
    fn force_clear(&mut self, id: ManagerId) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let removed: Vec<EntryId> = manager.history.entries().iter().map(HistoryEntry::id).collect();
        manager.history.clear();
        let mut changes = Vec::new();
        for presentation in PresentationMethod::ALL {
            if manager.path_mut(presentation).clear() > 0 {
                changes.push(Change::path(presentation, 0));
            }
            if let Some(slot) = manager.root_slot_mut(presentation) {
                if slot.take().is_some() {
                    changes.extend(Change::root_slot(presentation, false));
                }
            }
        }
        self.diagnostics.forced_clears += 1;
        self.log(
            id,
            LogLevel::Critical,
            format_args!("kill left {} entries behind; state force-cleared", removed.len()),
        );
        for change in changes {
            self.emit(id, change);
        }
        self.propagate_removed(id, &removed);
        self.refresh_active(id);
    }

    // ── Capabilities / Status ────────────────────────────────────────────

    pub(crate) fn register_modal(&mut self, id: ManagerId, presentation: PresentationMethod) {
        let Some(manager) = self.managers.get_mut(&id) else {
            return;
        };
        let flag = match presentation {
            PresentationMethod::Sheet => &mut manager.sheet_capable,
            PresentationMethod::Cover => &mut manager.cover_capable,
            PresentationMethod::Stack => return,
        };
        if *flag {
            self.log(
                id,
                LogLevel::Verbose,
                format_args!("{presentation} stack already registered"),
            );
            return;
        }
        *flag = true;
        self.log(id, LogLevel::Info, format_args!("{presentation} stack registered"));
    }

    pub(crate) fn status_of(&self, id: ManagerId) -> NavigationStatus {
        let mut cursor = id;
        for _ in 0..=self.managers.len() {
            let Some(manager) = self.managers.get(&cursor) else {
                break;
            };
            let active = manager.active_presentation;
            if !manager.parent_owns_top() {
                let empty = manager.path(active).is_empty();
                return NavigationStatus::new(active, NavigationState::from_empty(empty));
            }
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return NavigationStatus::new(active, NavigationState::Initial),
            }
        }
        NavigationStatus::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::NavigationConfig;

    fn page(n: u32) -> Page {
        Page::labeled(n, format!("P{n}"))
    }

    fn setup() -> (NavigationTree, ManagerId) {
        let mut tree = NavigationTree::new(NavigationConfig::quiet());
        let id = tree.create_manager(Some("main"));
        (tree, id)
    }

    #[test]
    fn stack_push_and_back() {
        let (mut tree, id) = setup();
        tree.navigate_request(id, page(1), PresentationMethod::Stack, false, None);
        tree.navigate_request(id, page(2), PresentationMethod::Stack, false, None);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_path().len(), 2);
        assert_eq!(m.history().count(), 2);

        tree.back_request(id);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_path().len(), 1);
        assert_eq!(m.root_path().last(), Some(&page(1)));
        assert!(m.is_consistent());
    }

    #[test]
    fn uncapable_sheet_without_parent_falls_back_to_stack() {
        let (mut tree, id) = setup();
        tree.navigate_request(id, page(1), PresentationMethod::Sheet, false, None);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_path().len(), 1);
        assert!(m.root_sheet().is_none());
        assert_eq!(m.active_presentation(), PresentationMethod::Stack);
        assert_eq!(tree.diagnostics().orphan_fallbacks, 1);
    }

    #[test]
    fn is_root_resets_open_sheet() {
        let (mut tree, id) = setup();
        tree.register_modal(id, PresentationMethod::Sheet);
        tree.navigate_request(id, page(1), PresentationMethod::Sheet, false, None);
        tree.navigate_request(id, page(2), PresentationMethod::Sheet, false, None);
        tree.navigate_request(id, page(3), PresentationMethod::Sheet, true, None);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_sheet(), Some(&page(3)));
        assert!(m.sheet_path().is_empty());
        assert_eq!(m.history().count(), 1);
        assert!(tree.diagnostics().is_clean());
    }

    #[test]
    fn stack_request_inside_cover_pushes_cover_path() {
        let (mut tree, id) = setup();
        tree.register_modal(id, PresentationMethod::Cover);
        tree.navigate_request(id, page(1), PresentationMethod::Cover, false, None);
        tree.navigate_request(id, page(2), PresentationMethod::Stack, false, None);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.cover_path().len(), 1);
        assert!(m.root_path().is_empty());
        assert_eq!(m.active_presentation(), PresentationMethod::Cover);
        assert_eq!(
            tree.status_of(id),
            NavigationStatus::new(PresentationMethod::Cover, NavigationState::Navigated)
        );
    }

    #[test]
    fn register_is_idempotent() {
        let (mut tree, id) = setup();
        tree.register_modal(id, PresentationMethod::Sheet);
        tree.register_modal(id, PresentationMethod::Sheet);
        tree.register_modal(id, PresentationMethod::Stack);
        let m = tree.manager(id).unwrap();
        assert!(m.is_sheet_capable());
        assert!(!m.is_cover_capable());
    }

    #[test]
    fn steps_honor_each_presentation() {
        let (mut tree, id) = setup();
        tree.register_modal(id, PresentationMethod::Sheet);
        tree.navigate_steps(
            id,
            [
                NavigationStep::stack(page(1)),
                NavigationStep::sheet(page(2)),
                NavigationStep::stack(page(3)),
            ],
        );
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_path().len(), 1);
        assert_eq!(m.root_sheet(), Some(&page(2)));
        assert_eq!(m.sheet_path().len(), 1);
        assert!(m.is_consistent());
    }

    #[test]
    fn pages_only_reset_on_first() {
        let (mut tree, id) = setup();
        tree.register_modal(id, PresentationMethod::Sheet);
        tree.navigate_pages(id, [page(1), page(2), page(3)], PresentationMethod::Sheet, true);
        let m = tree.manager(id).unwrap();
        assert_eq!(m.root_sheet(), Some(&page(1)));
        assert_eq!(m.sheet_path().len(), 2);
    }

    #[test]
    fn kill_on_empty_is_noop() {
        let (mut tree, id) = setup();
        tree.kill_the_flow(id);
        assert!(tree.manager(id).unwrap().is_pristine());
        assert_eq!(tree.diagnostics().empty_back_attempts, 0);
    }
}
