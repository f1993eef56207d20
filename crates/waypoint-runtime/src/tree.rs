//! The manager arena.
//!
//! A [`NavigationTree`] owns every [`NavigationManager`] of an application and
//! the parent/child index between them. Cross-manager links are ids, so
//! removing a manager never leaves a dangling reference: lookups for it just
//! come back empty and callers treat it as absent.
//!
//! # Invariants
//!
//! - Parent links form a forest; [`set_parent`](NavigationTree::set_parent)
//!   refuses cycles.
//! - `children` of a manager mirrors the `parent` links pointing at it.
//! - Every queued settle task addresses a live manager (removal cancels).
//! - While a manager has queued tasks, its new requests queue behind them.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unknown id passed to a fallible call | [`TreeError::UnknownManager`] |
//! | Reparenting under self or a descendant | [`TreeError::WouldCycle`] |
//! | Parent removed while a child still delegates | Child sees no parent |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use waypoint_core::{LogLevel, NavigationConfig, NavigationStatus};

use crate::debug_trace;
use crate::diagnostics::Diagnostics;
use crate::error::{TreeError, TreeResult};
use crate::handle::ManagerMut;
use crate::log_sink::{LogRecord, LogSink, TracingLogSink};
use crate::manager::{ManagerId, ManagerSnapshot, NavigationManager};
use crate::observe::{Change, NavigationEvent, ObserverId, ObserverRegistry};
use crate::scheduler::{SettleAction, SettleQueue, SettleTask, Scheduler};

/// Upper bound on tasks run by one [`NavigationTree::run_pending`] call.
const MAX_SETTLE_STEPS: usize = 10_000;

/// Owner of all navigation managers.
pub struct NavigationTree {
    pub(crate) config: NavigationConfig,
    pub(crate) managers: HashMap<ManagerId, NavigationManager>,
    next_id: u64,
    pub(crate) observers: ObserverRegistry,
    pub(crate) scheduler: Box<dyn Scheduler>,
    sink: Arc<dyn LogSink>,
    pub(crate) diagnostics: Diagnostics,
}

impl NavigationTree {
    /// Empty tree logging to `tracing` and settling through a [`SettleQueue`].
    #[must_use]
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            managers: HashMap::new(),
            next_id: 0,
            observers: ObserverRegistry::default(),
            scheduler: Box::new(SettleQueue::new()),
            sink: Arc::new(TracingLogSink),
            diagnostics: Diagnostics::default(),
        }
    }

    // ── Builder Methods ──────────────────────────────────────────────────

    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Swap the scheduler. Tasks already queued move to the new one.
    #[must_use]
    pub fn with_scheduler(mut self, mut scheduler: Box<dyn Scheduler>) -> Self {
        for task in self.scheduler.drain() {
            scheduler.schedule(task);
        }
        self.scheduler = scheduler;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of live managers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ManagerId) -> bool {
        self.managers.contains_key(&id)
    }

    #[must_use]
    pub fn manager(&self, id: ManagerId) -> Option<&NavigationManager> {
        self.managers.get(&id)
    }

    /// Mutable handle for navigating one manager.
    pub fn manager_mut(&mut self, id: ManagerId) -> TreeResult<ManagerMut<'_>> {
        if self.managers.contains_key(&id) {
            Ok(ManagerMut::new(self, id))
        } else {
            Err(TreeError::UnknownManager(id))
        }
    }

    /// Plain-data copy of a manager's state.
    #[must_use]
    pub fn snapshot(&self, id: ManagerId) -> Option<ManagerSnapshot> {
        self.managers.get(&id).map(NavigationManager::snapshot)
    }

    /// Live parent of a manager.
    #[must_use]
    pub fn parent(&self, id: ManagerId) -> Option<ManagerId> {
        self.managers
            .get(&id)
            .and_then(|m| m.parent)
            .filter(|parent| self.managers.contains_key(parent))
    }

    /// Live children of a manager, sorted by id.
    #[must_use]
    pub fn children(&self, id: ManagerId) -> Vec<ManagerId> {
        self.managers.get(&id).map_or_else(Vec::new, |m| {
            m.children()
                .filter(|child| self.managers.contains_key(child))
                .collect()
        })
    }

    /// Ids of all live managers, sorted.
    #[must_use]
    pub fn manager_ids(&self) -> Vec<ManagerId> {
        let mut ids: Vec<ManagerId> = self.managers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Status of a manager, following delegation upward.
    #[must_use]
    pub fn navigation_status(&self, id: ManagerId) -> NavigationStatus {
        self.status_of(id)
    }

    /// Whether every live manager satisfies its consistency checks.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.managers.values().all(NavigationManager::is_consistent)
    }

    /// Settle tasks still queued.
    #[must_use]
    pub fn pending_tasks(&self) -> &[SettleTask] {
        self.scheduler.queued()
    }

    /// Whether `id` has settle work queued.
    #[must_use]
    pub fn has_pending(&self, id: ManagerId) -> bool {
        self.scheduler.queued().iter().any(|task| task.manager == id)
    }

    // ── Tree Management ──────────────────────────────────────────────────

    /// Create a manager. `None` uses the configured default identifier.
    pub fn create_manager(&mut self, identifier: Option<&str>) -> ManagerId {
        self.next_id += 1;
        let id = ManagerId::from_raw(self.next_id);
        let identifier = identifier.map_or_else(
            || self.config.default_identifier.clone(),
            str::to_string,
        );
        self.managers
            .insert(id, NavigationManager::new(id, identifier));
        self.log(id, LogLevel::Verbose, format_args!("created"));
        id
    }

    /// Destroy a manager.
    ///
    /// Its parent forgets it, its children become roots, its queued settle
    /// work is cancelled and its observers are dropped. Returns the final
    /// state.
    pub fn remove_manager(&mut self, id: ManagerId) -> TreeResult<NavigationManager> {
        if !self.managers.contains_key(&id) {
            return Err(TreeError::UnknownManager(id));
        }
        self.log(id, LogLevel::Info, format_args!("removed"));
        let removed = self
            .managers
            .remove(&id)
            .ok_or(TreeError::UnknownManager(id))?;

        if let Some(parent) = removed.parent.and_then(|p| self.managers.get_mut(&p)) {
            parent.children.remove(&id);
        }
        for child in &removed.children {
            if let Some(manager) = self.managers.get_mut(child) {
                manager.parent = None;
            }
        }
        let cancelled = self.scheduler.retain(&mut |task| task.manager != id);
        if cancelled > 0 {
            tracing::debug!(target: "waypoint", manager = %id, cancelled, "settle tasks cancelled");
        }
        self.observers.remove_manager(id);

        for child in removed.children.iter().copied() {
            self.refresh_active(child);
        }
        Ok(removed)
    }

    /// Link `child` under `parent`, or detach it with `None`.
    ///
    /// Returns `Ok(false)` when `parent` is already the current parent.
    pub fn set_parent(&mut self, child: ManagerId, parent: Option<ManagerId>) -> TreeResult<bool> {
        let current = self
            .managers
            .get(&child)
            .ok_or(TreeError::UnknownManager(child))?
            .parent;

        if let Some(parent) = parent {
            if !self.managers.contains_key(&parent) {
                return Err(TreeError::UnknownManager(parent));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(TreeError::WouldCycle { child, parent });
            }
        }
        if current == parent {
            return Ok(false);
        }

        if let Some(old) = current.and_then(|p| self.managers.get_mut(&p)) {
            old.children.remove(&child);
        }
        if let Some(manager) = self.managers.get_mut(&child) {
            manager.parent = parent;
        }
        if let Some(new) = parent.and_then(|p| self.managers.get_mut(&p)) {
            new.children.insert(child);
        }

        match parent {
            Some(parent) => {
                let name = self.identifier(parent);
                self.log(child, LogLevel::Info, format_args!("parent set to {name}"));
            }
            None => self.log(child, LogLevel::Info, format_args!("parent cleared")),
        }
        self.refresh_active(child);
        Ok(true)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ManagerId, node: ManagerId) -> bool {
        let mut cursor = Some(node);
        let mut hops = 0;
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.managers.len() {
                break;
            }
            cursor = self.managers.get(&id).and_then(|m| m.parent);
        }
        false
    }

    // ── Observation ──────────────────────────────────────────────────────

    /// Receive every change on `manager`, synchronously.
    pub fn subscribe(
        &mut self,
        manager: ManagerId,
        observer: impl FnMut(&NavigationEvent) + Send + 'static,
    ) -> TreeResult<ObserverId> {
        if !self.managers.contains_key(&manager) {
            return Err(TreeError::UnknownManager(manager));
        }
        Ok(self.observers.subscribe(manager, Box::new(observer)))
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, manager: ManagerId, change: Change) {
        self.observers.dispatch(manager, change);
    }

    // ── Settling ─────────────────────────────────────────────────────────

    /// Run queued settle tasks one by one, ignoring deadlines, until none
    /// remain. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while ran < MAX_SETTLE_STEPS {
            let Some(task) = self.scheduler.pop_next() else {
                break;
            };
            self.run_task(task);
            ran += 1;
        }
        ran
    }

    /// Run the settle tasks due at `now`. Returns how many ran.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while ran < MAX_SETTLE_STEPS {
            let due = self
                .scheduler
                .queued()
                .first()
                .is_some_and(|task| task.due <= now);
            if !due {
                break;
            }
            let Some(task) = self.scheduler.pop_next() else {
                break;
            };
            self.run_task(task);
            ran += 1;
        }
        ran
    }

    fn run_task(&mut self, task: SettleTask) {
        let SettleTask { manager, action, .. } = task;
        if !self.managers.contains_key(&manager) {
            return;
        }
        debug_trace!("settle {} {}", manager, action.kind());
        tracing::trace!(target: "waypoint", manager = %manager, action = action.kind(), "settle");
        match action {
            SettleAction::CommitReset {
                presentation,
                page,
                entry_id,
            } => self.commit_reset(manager, presentation, page, entry_id),
            SettleAction::Navigate {
                page,
                presentation,
                is_root,
                entry_id,
            } => self.navigate_now(manager, page, presentation, is_root, entry_id),
            SettleAction::Back => self.back_now(manager),
            SettleAction::Replace { page } => self.replace_now(manager, page),
        }
    }

    /// Queue `action` after everything already queued for `manager`.
    ///
    /// Returns false (and queues nothing) when the manager has no queued work.
    pub(crate) fn queue_behind(&mut self, manager: ManagerId, action: &SettleAction) -> bool {
        let last_due = self
            .scheduler
            .queued()
            .iter()
            .filter(|task| task.manager == manager)
            .map(|task| task.due)
            .max();
        let Some(due) = last_due else {
            return false;
        };
        self.log(
            manager,
            LogLevel::Verbose,
            format_args!("{} queued behind settle work", action.kind()),
        );
        self.scheduler.schedule(SettleTask {
            manager,
            due,
            action: action.clone(),
        });
        true
    }

    /// Queue `action` one settle delay from now, ahead of the manager's other
    /// queued work.
    pub(crate) fn schedule_settle(&mut self, manager: ManagerId, action: SettleAction) {
        let due = Instant::now() + self.config.settle_delay;
        let behind: Vec<SettleTask> = self
            .scheduler
            .queued()
            .iter()
            .filter(|task| task.manager == manager)
            .cloned()
            .collect();
        if !behind.is_empty() {
            self.scheduler.retain(&mut |task| task.manager != manager);
        }
        tracing::debug!(target: "waypoint", manager = %manager, action = action.kind(), "settle scheduled");
        self.scheduler.schedule(SettleTask {
            manager,
            due,
            action,
        });
        for mut task in behind {
            task.due = task.due.max(due);
            self.scheduler.schedule(task);
        }
    }

    /// Drop queued tasks of `manager` matching `pred`.
    pub(crate) fn cancel_tasks(
        &mut self,
        manager: ManagerId,
        mut pred: impl FnMut(&SettleAction) -> bool,
    ) -> usize {
        let cancelled = self
            .scheduler
            .retain(&mut |task| !(task.manager == manager && pred(&task.action)));
        if cancelled > 0 {
            self.diagnostics.superseded_tasks += cancelled as u64;
            tracing::debug!(target: "waypoint", manager = %manager, cancelled, "settle tasks cancelled");
        }
        cancelled
    }

    // ── Logging ──────────────────────────────────────────────────────────

    pub(crate) fn identifier(&self, id: ManagerId) -> String {
        self.managers
            .get(&id)
            .map_or_else(|| id.to_string(), |m| m.identifier.clone())
    }

    pub(crate) fn log(&self, id: ManagerId, level: LogLevel, message: fmt::Arguments<'_>) {
        if !self.config.allows(level) {
            return;
        }
        let identifier = self.identifier(id);
        let message = message.to_string();
        self.sink.log(&LogRecord {
            level,
            manager: id,
            identifier: &identifier,
            message: &message,
        });
    }
}

impl Default for NavigationTree {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

impl fmt::Debug for NavigationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationTree")
            .field("managers", &self.managers.len())
            .field("pending", &self.scheduler.queued().len())
            .field("observers", &self.observers)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
