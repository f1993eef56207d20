//! Ordered page paths.
//!
//! A [`PathCollection`] is the pushed-page sequence for one presentation
//! style. The owning manager treats it strictly as a stack, but the view layer
//! is allowed to write back a shorter (or, rarely, longer) path after a user
//! gesture. [`PathCollection::replace_all`] reports the old and new lengths so
//! the owner can reconcile its ledger after the fact.

use std::fmt;
use std::ops::Deref;

use crate::page::Page;

/// Pushed pages for one presentation, oldest first.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PathCollection {
    pages: Vec<Page>,
}

/// Length change reported by a bulk path write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathChange {
    pub old_len: usize,
    pub new_len: usize,
}

impl PathChange {
    /// Number of pages removed from the end (zero if the path grew).
    #[inline]
    #[must_use]
    pub const fn shrunk_by(self) -> usize {
        self.old_len.saturating_sub(self.new_len)
    }

    #[inline]
    #[must_use]
    pub const fn grew_by(self) -> usize {
        self.new_len.saturating_sub(self.old_len)
    }
}

impl PathCollection {
    #[must_use]
    pub const fn new() -> Self {
        Self { pages: Vec::new() }
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn pop(&mut self) -> Option<Page> {
        self.pages.pop()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Page> {
        self.pages.last()
    }

    /// Empty the path, returning how many pages were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.pages.len();
        self.pages.clear();
        removed
    }

    /// Drop pages beyond `len`. Never grows the path.
    pub fn truncate(&mut self, len: usize) -> PathChange {
        let old_len = self.pages.len();
        self.pages.truncate(len);
        PathChange {
            old_len,
            new_len: self.pages.len(),
        }
    }

    /// Overwrite the whole path with what the view layer now shows.
    pub fn replace_all(&mut self, pages: Vec<Page>) -> PathChange {
        let old_len = self.pages.len();
        self.pages = pages;
        PathChange {
            old_len,
            new_len: self.pages.len(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Page> {
        self.pages.clone()
    }
}

impl Deref for PathCollection {
    type Target = [Page];

    fn deref(&self) -> &[Page] {
        &self.pages
    }
}

impl From<Vec<Page>> for PathCollection {
    fn from(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl fmt::Debug for PathCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pages.iter()).finish()
    }
}
