//! Borrowed handle for driving one manager.

use waypoint_core::{NavigationStatus, Page, PresentationMethod};

use crate::error::TreeResult;
use crate::manager::{ManagerId, NavigationManager};
use crate::navigate::NavigationStep;
use crate::tree::NavigationTree;

/// Mutable access to one manager of a [`NavigationTree`].
///
/// Obtained from [`NavigationTree::manager_mut`]. Every call may touch other
/// managers (delegation, marker cleanup), which is why the handle borrows the
/// whole tree.
///
/// ```
/// use waypoint_core::{NavigationConfig, Page, PresentationMethod};
/// use waypoint_runtime::NavigationTree;
///
/// let mut tree = NavigationTree::new(NavigationConfig::quiet());
/// let id = tree.create_manager(Some("inbox"));
/// let mut inbox = tree.manager_mut(id).unwrap();
/// inbox.register_sheet_stack();
/// inbox.push(Page::labeled(1u32, "Thread"));
/// inbox.navigate(Page::labeled(2u32, "Compose"), PresentationMethod::Sheet, false);
/// assert_eq!(inbox.manager().active_presentation(), PresentationMethod::Sheet);
/// inbox.kill_the_flow();
/// assert!(inbox.manager().is_pristine());
/// ```
pub struct ManagerMut<'a> {
    tree: &'a mut NavigationTree,
    id: ManagerId,
}

impl<'a> ManagerMut<'a> {
    pub(crate) fn new(tree: &'a mut NavigationTree, id: ManagerId) -> Self {
        Self { tree, id }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Current state of the manager.
    #[must_use]
    pub fn manager(&self) -> &NavigationManager {
        // Nothing reachable through the handle removes managers.
        &self.tree.managers[&self.id]
    }

    #[must_use]
    pub fn tree(&self) -> &NavigationTree {
        self.tree
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Navigate to `page` with the requested presentation.
    ///
    /// For sheet and cover, `is_root` presents `page` as a fresh modal root
    /// even when that modal is already showing something.
    pub fn navigate(&mut self, page: Page, presentation: PresentationMethod, is_root: bool) {
        self.tree.navigate_request(self.id, page, presentation, is_root, None);
    }

    /// Stack navigation to `page`.
    pub fn push(&mut self, page: Page) {
        self.navigate(page, PresentationMethod::Stack, false);
    }

    /// Navigate through `pages` in order. Only the first honors `is_root`.
    pub fn navigate_pages(
        &mut self,
        pages: impl IntoIterator<Item = Page>,
        presentation: PresentationMethod,
        is_root: bool,
    ) {
        self.tree.navigate_pages(self.id, pages, presentation, is_root);
    }

    /// Navigate through mixed-presentation steps, as separate calls would.
    pub fn navigate_steps(&mut self, steps: impl IntoIterator<Item = NavigationStep>) {
        self.tree.navigate_steps(self.id, steps);
    }

    /// Undo the most recent navigation recorded by this manager.
    ///
    /// An empty ledger logs at critical and changes nothing. A delegated top
    /// entry forwards the call to the parent.
    pub fn navigate_back(&mut self) {
        self.tree.back_request(self.id);
    }

    /// Swap the top page for `page`, keeping its presentation.
    pub fn replace(&mut self, page: Page) {
        self.tree.replace_request(self.id, page);
    }

    /// Unwind everything back to an empty stack.
    pub fn kill_the_flow(&mut self) {
        self.tree.kill_the_flow(self.id);
    }

    // ── Setup ────────────────────────────────────────────────────────────

    pub fn register_sheet_stack(&mut self) {
        self.tree.register_modal(self.id, PresentationMethod::Sheet);
    }

    pub fn register_cover_stack(&mut self) {
        self.tree.register_modal(self.id, PresentationMethod::Cover);
    }

    /// See [`NavigationTree::set_parent`].
    pub fn set_parent(&mut self, parent: Option<ManagerId>) -> TreeResult<bool> {
        self.tree.set_parent(self.id, parent)
    }

    // ── View layer ───────────────────────────────────────────────────────

    /// Write back a path the view layer changed itself.
    pub fn sync_path(&mut self, presentation: PresentationMethod, pages: Vec<Page>) {
        self.tree.sync_path(self.id, presentation, pages);
    }

    /// Shrink a path to `len` pages, as a swipe-back would.
    pub fn truncate_path(&mut self, presentation: PresentationMethod, len: usize) {
        self.tree.truncate_path(self.id, presentation, len);
    }

    pub fn on_sheet_modal_dismissed(&mut self) {
        self.tree.modal_dismissed(self.id, PresentationMethod::Sheet);
    }

    pub fn on_cover_modal_dismissed(&mut self) {
        self.tree.modal_dismissed(self.id, PresentationMethod::Cover);
    }

    #[must_use]
    pub fn navigation_status(&self) -> NavigationStatus {
        self.tree.status_of(self.id)
    }
}

impl std::fmt::Debug for ManagerMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerMut").field("id", &self.id).finish()
    }
}
