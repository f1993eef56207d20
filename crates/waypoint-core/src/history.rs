//! Chronological navigation ledger.
//!
//! Every navigation a manager performs (or hands to its parent) leaves one
//! [`HistoryEntry`] on the manager's [`HistoryLedger`]. Reading the ledger
//! bottom to top replays the region's navigation in order, which is what
//! `navigate_back`, `kill_the_flow` and reconciliation rely on.
//!
//! # Invariants
//!
//! 1. Entries are only added at the top and only removed from the top, with
//!    the single exception of [`HistoryLedger::clear`].
//! 2. Entry equality and hashing use [`EntryId`] only.
//! 3. An entry handed to a parent (`is_delegated_to_parent`) shares its id
//!    with the entry the parent records, so a removal on the parent can be
//!    matched back to the stale marker on the child.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::page::Page;
use crate::presentation::PresentationMethod;
use crate::stack::SyncStack;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded navigation event.
#[derive(Clone)]
pub struct HistoryEntry {
    id: EntryId,
    page: Option<Page>,
    presentation: PresentationMethod,
    timestamp: Instant,
    message: Option<String>,
    delegated_to_parent: bool,
}

impl HistoryEntry {
    /// Record a navigation handled by the owning manager.
    #[must_use]
    pub fn new(id: EntryId, page: Option<Page>, presentation: PresentationMethod) -> Self {
        Self {
            id,
            page,
            presentation,
            timestamp: Instant::now(),
            message: None,
            delegated_to_parent: false,
        }
    }

    /// Record a navigation the owning manager forwarded to its parent.
    #[must_use]
    pub fn delegated(id: EntryId, page: Option<Page>, presentation: PresentationMethod) -> Self {
        Self {
            delegated_to_parent: true,
            ..Self::new(id, page, presentation)
        }
    }

    /// Attach a free-text note.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn presentation(&self) -> PresentationMethod {
        self.presentation
    }

    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether the parent manager owns the navigation this entry records.
    #[inline]
    #[must_use]
    pub fn is_delegated_to_parent(&self) -> bool {
        self.delegated_to_parent
    }

    /// Whether this entry records a navigation on the manager's own paths
    /// with the given presentation.
    #[inline]
    #[must_use]
    pub fn is_local(&self, presentation: PresentationMethod) -> bool {
        !self.delegated_to_parent && self.presentation == presentation
    }
}

impl PartialEq for HistoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HistoryEntry {}

impl Hash for HistoryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("id", &self.id)
            .field("page", &self.page)
            .field("presentation", &self.presentation)
            .field("delegated_to_parent", &self.delegated_to_parent)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.presentation)?;
        if let Some(page) = &self.page {
            write!(f, " {page}")?;
        }
        if self.delegated_to_parent {
            f.write_str(" (delegated)")?;
        }
        Ok(())
    }
}

/// LIFO record of a manager's navigation events.
#[derive(Clone, Default)]
pub struct HistoryLedger {
    entries: SyncStack<HistoryEntry>,
}

impl HistoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<HistoryEntry> {
        self.entries.peek()
    }

    /// Number of entries, delegated ones included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries that record navigation on the owner's own paths.
    #[must_use]
    pub fn local_count(&self) -> usize {
        self.entries.count_where(|e| !e.is_delegated_to_parent())
    }

    /// Whether an entry with this id is still recorded.
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.any(|e| e.id == id)
    }

    /// Presentation of the top entry, if any.
    #[must_use]
    pub fn top_presentation(&self) -> Option<PresentationMethod> {
        self.peek().map(|e| e.presentation)
    }

    /// Pop the top entry only if `pred` accepts it.
    pub fn pop_if(&self, pred: impl FnOnce(&HistoryEntry) -> bool) -> Option<HistoryEntry> {
        let top = self.peek()?;
        if pred(&top) {
            self.pop()
        } else {
            None
        }
    }

    /// Point-in-time copy of the entries, bottom first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.snapshot()
    }
}

impl fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("entries", &self.entries)
            .finish()
    }
}
