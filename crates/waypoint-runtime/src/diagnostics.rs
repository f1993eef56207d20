//! Counters and fault records for integration checks.
//!
//! The one inconsistency the state machine can detect but not repair is a
//! path that shrank while the top of the ledger belonged to a different
//! presentation. Each occurrence is kept as a [`ReconciliationFault`] so a
//! test can assert that a normal flow never produces one.

use std::collections::VecDeque;
use std::fmt;

use waypoint_core::PresentationMethod;

use crate::manager::ManagerId;

/// A path shrink the ledger could not account for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationFault {
    pub manager: ManagerId,
    /// Presentation whose path shrank.
    pub presentation: PresentationMethod,
    /// Entries that should have been popped.
    pub expected: usize,
    /// Entries actually popped before the mismatch.
    pub popped: usize,
    /// Presentation of the entry found on top instead (`None` = empty ledger).
    pub found: Option<PresentationMethod>,
    /// Whether the entry found on top was a delegation marker.
    pub found_delegated: bool,
}

impl fmt::Display for ReconciliationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} path shrank by {} but only {} matching entries were on top",
            self.manager, self.presentation, self.expected, self.popped
        )?;
        match self.found {
            Some(found) if self.found_delegated => write!(f, " (found delegated {found})"),
            Some(found) => write!(f, " (found {found})"),
            None => f.write_str(" (ledger empty)"),
        }
    }
}

/// Running totals kept by a [`NavigationTree`](crate::NavigationTree).
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Reconciliation passes halted on a mismatched entry.
    pub reconciliation_faults: u64,
    /// `navigate_back` calls that found an empty ledger.
    pub empty_back_attempts: u64,
    /// Requests forwarded to a parent.
    pub delegations: u64,
    /// Requests that wanted a parent but fell back to local stack handling.
    pub orphan_fallbacks: u64,
    /// Modal root assignments deferred to a later tick.
    pub deferred_commits: u64,
    /// Settle tasks dropped because a later request superseded them.
    pub superseded_tasks: u64,
    /// `kill_the_flow` runs that had to force-clear leftover state.
    pub forced_clears: u64,
    recent_faults: VecDeque<ReconciliationFault>,
}

impl Diagnostics {
    pub(crate) fn record_fault(&mut self, fault: ReconciliationFault, capacity: usize) {
        self.reconciliation_faults += 1;
        if capacity == 0 {
            return;
        }
        while self.recent_faults.len() >= capacity {
            self.recent_faults.pop_front();
        }
        self.recent_faults.push_back(fault);
    }

    /// Most recent faults, oldest first.
    pub fn recent_faults(&self) -> impl Iterator<Item = &ReconciliationFault> {
        self.recent_faults.iter()
    }

    /// Whether no reconciliation fault has ever been recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.reconciliation_faults == 0 && self.forced_clears == 0
    }
}
