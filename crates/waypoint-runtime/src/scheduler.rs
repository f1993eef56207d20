//! Deferred settle tasks.
//!
//! Older platforms cannot swap one presented modal root for another inside a
//! single update. With [`PresentationCompat::TwoStep`](waypoint_core::PresentationCompat)
//! the tree clears the slot right away and queues the assignment here, due
//! `settle_delay` later. `replace` defers its re-navigation the same way.
//!
//! # Invariants
//!
//! - Tasks come out in deadline order; equal deadlines keep submission order.
//! - While a manager has queued tasks, the tree queues that manager's later
//!   requests behind them (see [`NavigationTree`](crate::NavigationTree)), so a
//!   settled two-step run matches the single-tick result.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Manager removed before the task is due | Task cancelled on removal |
//! | Task for an unknown manager reaches the tree | Dropped silently |

#![forbid(unsafe_code)]

use std::fmt;
use std::time::Instant;

use waypoint_core::{EntryId, Page, PresentationMethod};

use crate::manager::ManagerId;

/// Work to perform once the settle delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleAction {
    /// Second phase of a modal root reset: assign the slot, record history.
    CommitReset {
        presentation: PresentationMethod,
        page: Page,
        entry_id: EntryId,
    },
    /// A navigation queued behind earlier settle work.
    Navigate {
        page: Page,
        presentation: PresentationMethod,
        is_root: bool,
        /// Id shared with a child's delegation marker, if delegated.
        entry_id: Option<EntryId>,
    },
    /// A `navigate_back` queued behind earlier settle work.
    Back,
    /// A `replace` queued behind earlier settle work.
    Replace { page: Page },
}

impl SettleAction {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommitReset { .. } => "commit-reset",
            Self::Navigate { .. } => "navigate",
            Self::Back => "back",
            Self::Replace { .. } => "replace",
        }
    }
}

/// A queued action for one manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleTask {
    pub manager: ManagerId,
    pub due: Instant,
    pub action: SettleAction,
}

impl fmt::Display for SettleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.manager, self.action.kind())?;
        match &self.action {
            SettleAction::CommitReset { presentation, page, .. } => {
                write!(f, " {presentation} {page}")
            }
            SettleAction::Navigate {
                page, presentation, ..
            } => write!(f, " {presentation} {page}"),
            SettleAction::Replace { page } => write!(f, " {page}"),
            SettleAction::Back => Ok(()),
        }
    }
}

/// Queue of settle tasks.
///
/// Implement it to hook deferred work into a host event loop. The tree pulls
/// tasks out one at a time through [`pop_next`](Scheduler::pop_next), checks
/// deadlines against the head of [`queued`](Scheduler::queued), and reorders a
/// manager's tasks through [`retain`](Scheduler::retain). Running one task
/// can queue new work ahead of the rest, so tasks are never taken in batches.
pub trait Scheduler: Send {
    fn schedule(&mut self, task: SettleTask);

    /// Remove and return the earliest task regardless of deadline.
    fn pop_next(&mut self) -> Option<SettleTask>;

    /// Remove and return every task regardless of deadline, in order.
    fn drain(&mut self) -> Vec<SettleTask>;

    /// Keep only tasks for which `keep` returns true. Returns the number removed.
    fn retain(&mut self, keep: &mut dyn FnMut(&SettleTask) -> bool) -> usize;

    /// Tasks still queued, in the order they would run.
    fn queued(&self) -> &[SettleTask];
}

/// Deadline-ordered in-memory queue.
#[derive(Debug, Default)]
pub struct SettleQueue {
    tasks: Vec<SettleTask>,
}

impl SettleQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Scheduler for SettleQueue {
    fn schedule(&mut self, task: SettleTask) {
        // Insert after every task with an equal or earlier deadline.
        let at = self.tasks.partition_point(|queued| queued.due <= task.due);
        self.tasks.insert(at, task);
    }

    fn pop_next(&mut self) -> Option<SettleTask> {
        if self.tasks.is_empty() {
            None
        } else {
            Some(self.tasks.remove(0))
        }
    }

    fn drain(&mut self) -> Vec<SettleTask> {
        std::mem::take(&mut self.tasks)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&SettleTask) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| keep(task));
        before - self.tasks.len()
    }

    fn queued(&self) -> &[SettleTask] {
        &self.tasks
    }
}
