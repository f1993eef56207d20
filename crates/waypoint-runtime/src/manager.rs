//! Per-region navigation state.
//!
//! A [`NavigationManager`] owns everything one navigation region shows: the
//! stack path, the two modal paths with their root slots, the history ledger
//! and the capability flags. It holds no references to other managers, only
//! [`ManagerId`]s that the owning [`NavigationTree`](crate::NavigationTree)
//! resolves on demand; a removed manager simply stops resolving.
//!
//! All mutation goes through the tree so that observers are notified and the
//! ledger stays reconciled. This type only exposes reads.

use std::collections::BTreeSet;
use std::fmt;

use waypoint_core::{
    HistoryLedger, NavigationStatus, Page, PathCollection, PresentationMethod,
};

/// Handle to a manager inside a [`NavigationTree`](crate::NavigationTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

impl ManagerId {
    /// Rebuild an id from its raw value (for tests and FFI glue).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Navigation state of one region.
pub struct NavigationManager {
    pub(crate) id: ManagerId,
    pub(crate) identifier: String,
    pub(crate) active_presentation: PresentationMethod,
    pub(crate) root_path: PathCollection,
    pub(crate) sheet_path: PathCollection,
    pub(crate) cover_path: PathCollection,
    pub(crate) root_sheet: Option<Page>,
    pub(crate) root_cover: Option<Page>,
    pub(crate) sheet_capable: bool,
    pub(crate) cover_capable: bool,
    pub(crate) history: HistoryLedger,
    pub(crate) parent: Option<ManagerId>,
    pub(crate) children: BTreeSet<ManagerId>,
    /// Last status handed to observers.
    pub(crate) published_status: NavigationStatus,
}

impl NavigationManager {
    pub(crate) fn new(id: ManagerId, identifier: String) -> Self {
        Self {
            id,
            identifier,
            active_presentation: PresentationMethod::Stack,
            root_path: PathCollection::new(),
            sheet_path: PathCollection::new(),
            cover_path: PathCollection::new(),
            root_sheet: None,
            root_cover: None,
            sheet_capable: false,
            cover_capable: false,
            history: HistoryLedger::new(),
            parent: None,
            children: BTreeSet::new(),
            published_status: NavigationStatus::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Presentation receiving navigation: that of the top history entry, or
    /// `Stack` when the ledger is empty.
    #[inline]
    #[must_use]
    pub fn active_presentation(&self) -> PresentationMethod {
        self.active_presentation
    }

    #[must_use]
    pub fn root_path(&self) -> &PathCollection {
        &self.root_path
    }

    #[must_use]
    pub fn sheet_path(&self) -> &PathCollection {
        &self.sheet_path
    }

    #[must_use]
    pub fn cover_path(&self) -> &PathCollection {
        &self.cover_path
    }

    #[must_use]
    pub fn root_sheet(&self) -> Option<&Page> {
        self.root_sheet.as_ref()
    }

    #[must_use]
    pub fn root_cover(&self) -> Option<&Page> {
        self.root_cover.as_ref()
    }

    #[must_use]
    pub fn is_sheet_capable(&self) -> bool {
        self.sheet_capable
    }

    #[must_use]
    pub fn is_cover_capable(&self) -> bool {
        self.cover_capable
    }

    #[must_use]
    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Parent id as last linked. The tree clears it when the parent is removed.
    #[must_use]
    pub fn parent(&self) -> Option<ManagerId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = ManagerId> + '_ {
        self.children.iter().copied()
    }

    /// Path backing a presentation.
    #[must_use]
    pub fn path(&self, presentation: PresentationMethod) -> &PathCollection {
        match presentation {
            PresentationMethod::Stack => &self.root_path,
            PresentationMethod::Sheet => &self.sheet_path,
            PresentationMethod::Cover => &self.cover_path,
        }
    }

    /// Root slot of a modal presentation. `Stack` has none.
    #[must_use]
    pub fn root_slot(&self, presentation: PresentationMethod) -> Option<&Page> {
        match presentation {
            PresentationMethod::Stack => None,
            PresentationMethod::Sheet => self.root_sheet.as_ref(),
            PresentationMethod::Cover => self.root_cover.as_ref(),
        }
    }

    /// Whether this manager handles `presentation` itself.
    #[must_use]
    pub fn is_capable(&self, presentation: PresentationMethod) -> bool {
        match presentation {
            PresentationMethod::Stack => true,
            PresentationMethod::Sheet => self.sheet_capable,
            PresentationMethod::Cover => self.cover_capable,
        }
    }

    /// History entries this manager's own paths and slots account for.
    #[must_use]
    pub fn expected_local_history(&self) -> usize {
        self.root_path.len()
            + self.sheet_path.len()
            + self.cover_path.len()
            + usize::from(self.root_sheet.is_some())
            + usize::from(self.root_cover.is_some())
    }

    /// Number of entries recording navigation on this manager's own paths.
    #[must_use]
    pub fn local_history_len(&self) -> usize {
        self.history.local_count()
    }

    /// Whether the ledger, paths, slots and active presentation agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let active_matches = self.history.top_presentation().unwrap_or_default()
            == self.active_presentation;
        let sheet_ok = self.root_sheet.is_some() || self.sheet_path.is_empty();
        let cover_ok = self.root_cover.is_some() || self.cover_path.is_empty();
        active_matches
            && sheet_ok
            && cover_ok
            && self.local_history_len() == self.expected_local_history()
    }

    /// Whether nothing is pushed, presented or recorded.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.history.is_empty()
            && self.active_presentation == PresentationMethod::Stack
            && self.expected_local_history() == 0
    }

    /// Whether the top entry belongs to the parent.
    #[must_use]
    pub fn parent_owns_top(&self) -> bool {
        self.history
            .peek()
            .is_some_and(|entry| entry.is_delegated_to_parent())
    }

    /// Plain-data copy of the observable fields.
    #[must_use]
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            id: self.id,
            identifier: self.identifier.clone(),
            active_presentation: self.active_presentation,
            root_path: self.root_path.to_vec(),
            sheet_path: self.sheet_path.to_vec(),
            cover_path: self.cover_path.to_vec(),
            root_sheet: self.root_sheet.clone(),
            root_cover: self.root_cover.clone(),
            history_len: self.history.count(),
            parent: self.parent,
            children: self.children.iter().copied().collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Crate-internal mutation helpers
    // -----------------------------------------------------------------------

    pub(crate) fn path_mut(&mut self, presentation: PresentationMethod) -> &mut PathCollection {
        match presentation {
            PresentationMethod::Stack => &mut self.root_path,
            PresentationMethod::Sheet => &mut self.sheet_path,
            PresentationMethod::Cover => &mut self.cover_path,
        }
    }

    pub(crate) fn root_slot_mut(
        &mut self,
        presentation: PresentationMethod,
    ) -> Option<&mut Option<Page>> {
        match presentation {
            PresentationMethod::Stack => None,
            PresentationMethod::Sheet => Some(&mut self.root_sheet),
            PresentationMethod::Cover => Some(&mut self.root_cover),
        }
    }
}

impl fmt::Debug for NavigationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationManager")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("active_presentation", &self.active_presentation)
            .field("root_path", &self.root_path)
            .field("sheet_path", &self.sheet_path)
            .field("cover_path", &self.cover_path)
            .field("root_sheet", &self.root_sheet)
            .field("root_cover", &self.root_cover)
            .field("sheet_capable", &self.sheet_capable)
            .field("cover_capable", &self.cover_capable)
            .field("history", &self.history.count())
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

/// Owned copy of a manager's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerSnapshot {
    pub id: ManagerId,
    pub identifier: String,
    pub active_presentation: PresentationMethod,
    pub root_path: Vec<Page>,
    pub sheet_path: Vec<Page>,
    pub cover_path: Vec<Page>,
    pub root_sheet: Option<Page>,
    pub root_cover: Option<Page>,
    pub history_len: usize,
    pub parent: Option<ManagerId>,
    pub children: Vec<ManagerId>,
}

impl fmt::Display for ManagerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot(page: &Option<Page>) -> String {
            page.as_ref()
                .map_or_else(|| "-".to_string(), Page::description)
        }
        write!(
            f,
            "{} [{}] active={} stack={} sheet={}/{} cover={}/{} history={}",
            self.identifier,
            self.id,
            self.active_presentation,
            self.root_path.len(),
            slot(&self.root_sheet),
            self.sheet_path.len(),
            slot(&self.root_cover),
            self.cover_path.len(),
            self.history_len,
        )
    }
}
