//! End-to-end navigation scenarios across manager trees.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use waypoint_core::{
    LogLevel, NavigationConfig, NavigationState, NavigationStatus, Page, PresentationMethod,
};
use waypoint_runtime::{
    Change, ManagerId, MemoryLogSink, NavigationStep, NavigationTree, SettleAction,
};

use PresentationMethod::{Cover, Sheet, Stack};

fn page(label: &str) -> Page {
    Page::labeled(label.to_string(), label)
}

fn quiet_tree() -> NavigationTree {
    NavigationTree::new(NavigationConfig::quiet())
}

fn legacy_tree() -> NavigationTree {
    NavigationTree::new(NavigationConfig::legacy().logging_enabled(false))
}

/// Parent `root` with a child `leaf`.
fn family(tree: &mut NavigationTree) -> (ManagerId, ManagerId) {
    let root = tree.create_manager(Some("root"));
    let leaf = tree.create_manager(Some("leaf"));
    tree.set_parent(leaf, Some(root)).unwrap();
    (root, leaf)
}

fn status(presentation: PresentationMethod, state: NavigationState) -> NavigationStatus {
    NavigationStatus::new(presentation, state)
}

// ═══════════════════════════════════════════════════════════════════════
// Reference scenarios
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn fresh_manager_is_initial_stack() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let m = tree.manager(id).unwrap();
    assert_eq!(m.active_presentation(), Stack);
    assert!(m.root_path().is_empty());
    assert!(m.sheet_path().is_empty());
    assert!(m.cover_path().is_empty());
    assert!(m.root_sheet().is_none());
    assert!(m.root_cover().is_none());
    assert_eq!(
        tree.navigation_status(id),
        status(Stack, NavigationState::Initial)
    );
}

#[test]
fn sheet_root_then_sheet_push() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();

    m.navigate(page("one"), Sheet, false);
    assert_eq!(m.manager().root_sheet(), Some(&page("one")));
    assert!(m.manager().sheet_path().is_empty());
    assert_eq!(m.manager().active_presentation(), Sheet);

    m.navigate(page("two"), Sheet, false);
    assert_eq!(m.manager().sheet_path().len(), 1);
    assert_eq!(m.manager().root_sheet(), Some(&page("one")));
    assert_eq!(m.navigation_status(), status(Sheet, NavigationState::Navigated));
}

#[test]
fn sheet_without_capability_lands_on_parent_stack() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);

    tree.manager_mut(leaf)
        .unwrap()
        .navigate(page("detail"), Sheet, false);

    let parent = tree.manager(root).unwrap();
    assert_eq!(parent.active_presentation(), Stack);
    assert_eq!(parent.root_path().len(), 1);
    assert!(parent.root_sheet().is_none());

    let child = tree.manager(leaf).unwrap();
    assert!(child.root_path().is_empty());
    assert!(child.sheet_path().is_empty());
    assert!(child.root_sheet().is_none());
    assert_eq!(child.history().count(), 1);
    assert_eq!(child.local_history_len(), 0);
    assert_eq!(
        tree.navigation_status(leaf),
        status(Stack, NavigationState::Navigated)
    );
    assert_eq!(tree.diagnostics().delegations, 1);
    assert_eq!(tree.diagnostics().orphan_fallbacks, 1);
}

#[test]
fn delegated_sheet_unwinds_through_child_back() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_sheet_stack();

    tree.manager_mut(leaf)
        .unwrap()
        .navigate(page("compose"), Sheet, false);
    let parent = tree.manager(root).unwrap();
    assert_eq!(parent.root_sheet(), Some(&page("compose")));
    assert_eq!(parent.active_presentation(), Sheet);

    tree.manager_mut(leaf).unwrap().navigate_back();
    let parent = tree.manager(root).unwrap();
    assert!(parent.root_sheet().is_none());
    assert_eq!(parent.active_presentation(), Stack);

    let child = tree.manager(leaf).unwrap();
    assert!(child.history().is_empty());
    assert_eq!(child.active_presentation(), Stack);
    assert!(tree.is_consistent());
    assert!(tree.diagnostics().is_clean());
}

/// An open sheet takes cover requests into its own path. Preserved on
/// purpose: only one modal layer shows at a time.
#[test]
fn open_sheet_absorbs_cover_request() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.register_cover_stack();

    m.push(page("home"));
    m.navigate(page("sheet"), Sheet, false);
    m.navigate(page("cover"), Cover, false);

    let state = m.manager();
    assert_eq!(state.sheet_path().len(), 1);
    assert_eq!(state.sheet_path().last(), Some(&page("cover")));
    assert_eq!(state.active_presentation(), Sheet);
    assert!(state.root_cover().is_none());

    // Once back past the sheet, covers present normally again.
    m.navigate_back();
    m.navigate_back();
    assert_eq!(m.manager().active_presentation(), Stack);
    m.navigate(page("cover"), Cover, false);
    assert_eq!(m.manager().root_cover(), Some(&page("cover")));
    assert_eq!(m.manager().active_presentation(), Cover);
}

/// Without capability or parent, a modal request is handled like a stack
/// request: inside the modal already showing, not underneath it.
#[test]
fn orphan_sheet_request_stays_inside_open_cover() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_cover_stack();

    m.navigate(page("cover"), Cover, false);
    m.navigate(page("sheet"), Sheet, false);
    let state = m.manager();
    assert!(state.root_path().is_empty());
    assert_eq!(state.cover_path().to_vec(), vec![page("sheet")]);
    assert_eq!(state.active_presentation(), Cover);

    m.push(page("next"));
    assert_eq!(m.manager().cover_path().len(), 2);
    assert!(m.manager().root_path().is_empty());
    assert!(m.manager().is_consistent());
    assert_eq!(m.tree().diagnostics().orphan_fallbacks, 1);

    m.navigate_back();
    m.navigate_back();
    assert_eq!(m.manager().root_cover(), Some(&page("cover")));
    assert!(m.manager().cover_path().is_empty());
    assert_eq!(m.manager().active_presentation(), Cover);
}

#[test]
fn kill_the_flow_clears_mixed_history() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.register_cover_stack();
    m.navigate_steps([
        NavigationStep::stack(page("a")),
        NavigationStep::stack(page("b")),
        NavigationStep::cover(page("c")),
        NavigationStep::stack(page("d")),
        NavigationStep::sheet(page("e")),
        NavigationStep::cover(page("f")),
    ]);
    assert_eq!(m.manager().history().count(), 6);

    m.kill_the_flow();
    let state = m.manager();
    assert!(state.is_pristine());
    assert!(state.root_cover().is_none());
    assert!(state.root_sheet().is_none());
    assert_eq!(m.navigation_status(), NavigationStatus::default());
    assert!(m.tree().diagnostics().is_clean());
}

// ═══════════════════════════════════════════════════════════════════════
// Delegation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn stack_navigation_climbs_to_the_top_manager() {
    let mut tree = quiet_tree();
    let top = tree.create_manager(Some("top"));
    let mid = tree.create_manager(Some("mid"));
    let low = tree.create_manager(Some("low"));
    tree.set_parent(mid, Some(top)).unwrap();
    tree.set_parent(low, Some(mid)).unwrap();

    tree.manager_mut(low).unwrap().push(page("deep"));
    assert_eq!(tree.manager(top).unwrap().root_path().len(), 1);
    assert_eq!(tree.manager(mid).unwrap().history().count(), 1);
    assert_eq!(tree.manager(low).unwrap().history().count(), 1);

    tree.manager_mut(low).unwrap().navigate_back();
    for id in [top, mid, low] {
        let m = tree.manager(id).unwrap();
        assert!(m.is_pristine(), "{} not pristine", m.identifier());
    }
}

#[test]
fn stack_request_after_delegated_sheet_goes_inside_parent_sheet() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_sheet_stack();

    let mut child = tree.manager_mut(leaf).unwrap();
    child.navigate(page("sheet"), Sheet, false);
    child.push(page("inside"));

    let parent = tree.manager(root).unwrap();
    assert_eq!(parent.sheet_path().len(), 1);
    assert!(parent.root_path().is_empty());
    assert_eq!(
        tree.navigation_status(leaf),
        status(Sheet, NavigationState::Navigated)
    );
}

#[test]
fn child_kill_unwinds_its_delegations_only() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_sheet_stack();

    tree.manager_mut(root).unwrap().push(page("feed"));
    let mut child = tree.manager_mut(leaf).unwrap();
    child.navigate(page("sheet"), Sheet, false);
    child.push(page("inside"));
    child.kill_the_flow();

    assert!(tree.manager(leaf).unwrap().is_pristine());
    let parent = tree.manager(root).unwrap();
    assert_eq!(parent.root_path().to_vec(), vec![page("feed")]);
    assert!(parent.root_sheet().is_none());
    assert!(parent.sheet_path().is_empty());
    assert!(tree.is_consistent());
}

#[test]
fn parent_kill_drops_child_markers() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_cover_stack();

    let mut child = tree.manager_mut(leaf).unwrap();
    child.push(page("a"));
    child.navigate(page("b"), Cover, false);

    tree.manager_mut(root).unwrap().kill_the_flow();
    assert!(tree.manager(root).unwrap().is_pristine());
    assert!(tree.manager(leaf).unwrap().is_pristine());
}

#[test]
fn replace_through_delegation_keeps_presentation() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_sheet_stack();

    let mut child = tree.manager_mut(leaf).unwrap();
    child.navigate(page("old"), Sheet, false);
    child.replace(page("new"));

    let parent = tree.manager(root).unwrap();
    assert_eq!(parent.root_sheet(), Some(&page("new")));
    assert_eq!(parent.history().count(), 1);
    assert_eq!(tree.manager(leaf).unwrap().history().count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Back / replace
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn back_on_empty_history_logs_critical() {
    let sink = Arc::new(MemoryLogSink::new());
    let mut tree = NavigationTree::new(NavigationConfig::default()).with_log_sink(sink.clone());
    let id = tree.create_manager(Some("lonely"));

    tree.manager_mut(id).unwrap().navigate_back();
    assert_eq!(sink.count_at(LogLevel::Critical), 1);
    assert!(sink.contains("empty history"));
    assert_eq!(tree.diagnostics().empty_back_attempts, 1);
    assert!(tree.manager(id).unwrap().is_pristine());
}

#[test]
fn round_trip_restores_every_field() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.register_cover_stack();
    m.push(page("a"));
    m.navigate(page("c"), Cover, false);

    for presentation in PresentationMethod::ALL {
        let before = m.manager().snapshot();
        m.navigate(page("detour"), presentation, false);
        m.navigate_back();
        assert_eq!(m.manager().snapshot(), before, "round trip via {presentation}");
    }
}

#[test]
fn replace_swaps_top_of_stack() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.navigate_pages([page("a"), page("b")], Stack, false);
    m.replace(page("c"));
    assert_eq!(m.manager().root_path().to_vec(), vec![page("a"), page("c")]);
    assert_eq!(m.manager().history().count(), 2);
}

#[test]
fn replace_swaps_sheet_root() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.navigate(page("first"), Sheet, false);
    m.replace(page("second"));
    assert_eq!(m.manager().root_sheet(), Some(&page("second")));
    assert_eq!(m.manager().active_presentation(), Sheet);
    assert!(m.manager().is_consistent());
}

// ═══════════════════════════════════════════════════════════════════════
// Reconciliation and view-layer events
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn swipe_back_on_parent_clears_child_marker() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(leaf).unwrap().push(page("pushed"));

    tree.manager_mut(root)
        .unwrap()
        .truncate_path(Stack, 0);
    assert!(tree.manager(leaf).unwrap().history().is_empty());
    assert_eq!(
        tree.navigation_status(leaf),
        status(Stack, NavigationState::Initial)
    );
    assert!(tree.diagnostics().is_clean());
}

#[test]
fn sync_path_shrink_matches_truncate() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_cover_stack();
    m.navigate_pages([page("root"), page("1"), page("2")], Cover, false);
    assert_eq!(m.manager().cover_path().len(), 2);

    m.sync_path(Cover, vec![page("1")]);
    assert_eq!(m.manager().cover_path().len(), 1);
    assert_eq!(m.manager().history().count(), 2);
    assert!(m.manager().is_consistent());
}

#[test]
fn cover_dismissed_by_gesture() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_cover_stack();

    let mut child = tree.manager_mut(leaf).unwrap();
    child.push(page("stack"));
    child.navigate(page("cover"), Cover, false);
    child.push(page("in cover"));

    tree.manager_mut(root).unwrap().on_cover_modal_dismissed();
    let parent = tree.manager(root).unwrap();
    assert!(parent.root_cover().is_none());
    assert!(parent.cover_path().is_empty());
    assert_eq!(parent.root_path().len(), 1);
    assert_eq!(parent.active_presentation(), Stack);

    // Only the stack push is still delegated.
    assert_eq!(tree.manager(leaf).unwrap().history().count(), 1);
    assert!(tree.is_consistent());
}

#[test]
fn observers_see_each_field_change() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer = tree
        .subscribe(id, move |event| sink.lock().unwrap().push(event.change.clone()))
        .unwrap();

    tree.manager_mut(id).unwrap().push(page("a"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Change::RootPath { len: 1 },
            Change::Status(status(Stack, NavigationState::Navigated)),
        ]
    );

    assert!(tree.unsubscribe(observer));
    tree.manager_mut(id).unwrap().navigate_back();
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn delegating_child_republishes_parent_status() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(root).unwrap().register_sheet_stack();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tree.subscribe(leaf, move |event| sink.lock().unwrap().push(event.change.clone()))
        .unwrap();

    tree.manager_mut(leaf)
        .unwrap()
        .navigate(page("compose"), Sheet, false);
    tree.manager_mut(root).unwrap().push(page("draft"));
    assert_eq!(
        tree.navigation_status(leaf),
        status(Sheet, NavigationState::Navigated)
    );

    tree.manager_mut(root).unwrap().kill_the_flow();
    assert!(tree.manager(leaf).unwrap().is_pristine());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Change::ActivePresentation(Sheet),
            Change::Status(status(Sheet, NavigationState::Initial)),
            Change::Status(status(Sheet, NavigationState::Navigated)),
            Change::Status(status(Sheet, NavigationState::Initial)),
            Change::ActivePresentation(Stack),
            Change::Status(NavigationStatus::default()),
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Two-step resets
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn two_step_reset_defers_commit() {
    let mut tree = legacy_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();

    // An empty slot commits at once.
    m.navigate(page("first"), Sheet, false);
    assert_eq!(m.manager().root_sheet(), Some(&page("first")));

    m.navigate(page("second"), Sheet, true);
    assert!(m.manager().root_sheet().is_none());
    assert!(m.manager().history().is_empty());
    assert!(m.manager().is_consistent());
    assert_eq!(tree.pending_tasks().len(), 1);
    assert!(matches!(
        tree.pending_tasks()[0].action,
        SettleAction::CommitReset { presentation: Sheet, .. }
    ));
    assert_eq!(tree.diagnostics().deferred_commits, 1);

    assert_eq!(tree.run_pending(), 1);
    let m = tree.manager(id).unwrap();
    assert_eq!(m.root_sheet(), Some(&page("second")));
    assert_eq!(m.history().count(), 1);
    assert!(m.is_consistent());
}

#[test]
fn single_tick_reset_commits_immediately() {
    let mut tree = quiet_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.navigate(page("first"), Sheet, false);
    m.navigate(page("second"), Sheet, true);
    assert_eq!(m.manager().root_sheet(), Some(&page("second")));
    assert!(tree.pending_tasks().is_empty());
}

#[test]
fn calls_during_settle_window_keep_their_order() {
    fn script(tree: &mut NavigationTree) -> ManagerId {
        let id = tree.create_manager(Some("ordered"));
        let mut m = tree.manager_mut(id).unwrap();
        m.register_sheet_stack();
        m.push(page("home"));
        m.navigate(page("s1"), Sheet, false);
        m.navigate(page("s2"), Sheet, true);
        m.navigate(page("inside"), Sheet, false);
        m.push(page("deeper"));
        m.navigate_back();
        m.replace(page("swapped"));
        id
    }

    let mut modern = quiet_tree();
    let expected_id = script(&mut modern);
    let expected = modern.snapshot(expected_id).unwrap();

    let mut legacy = legacy_tree();
    let id = script(&mut legacy);
    assert!(!legacy.pending_tasks().is_empty());
    assert!(legacy.manager(id).unwrap().is_consistent());
    legacy.run_pending();

    assert_eq!(legacy.snapshot(id).unwrap(), expected);
    assert_eq!(expected.root_sheet, Some(page("s2")));
    assert_eq!(expected.sheet_path, vec![page("swapped")]);
    assert!(legacy.diagnostics().is_clean());
}

#[test]
fn tick_runs_only_due_tasks() {
    let mut tree = NavigationTree::new(
        NavigationConfig::legacy()
            .logging_enabled(false)
            .settle_delay(Duration::from_millis(200)),
    );
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.navigate_pages([page("a"), page("b")], Stack, false);
    m.replace(page("c"));
    assert_eq!(m.manager().root_path().len(), 1);

    assert_eq!(tree.tick(Instant::now()), 0);
    assert_eq!(tree.tick(Instant::now() + Duration::from_secs(5)), 1);
    assert_eq!(
        tree.manager(id).unwrap().root_path().to_vec(),
        vec![page("a"), page("c")]
    );
}

#[test]
fn dismiss_cancels_pending_commit() {
    let mut tree = legacy_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.navigate(page("first"), Sheet, false);
    m.navigate(page("second"), Sheet, true);
    m.on_sheet_modal_dismissed();

    assert!(tree.pending_tasks().is_empty());
    assert_eq!(tree.run_pending(), 0);
    assert!(tree.manager(id).unwrap().is_pristine());
}

#[test]
fn kill_cancels_pending_work() {
    let mut tree = legacy_tree();
    let id = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.register_sheet_stack();
    m.push(page("home"));
    m.navigate(page("first"), Sheet, false);
    m.navigate(page("second"), Sheet, true);
    m.push(page("queued"));
    m.kill_the_flow();

    assert!(tree.pending_tasks().is_empty());
    assert!(tree.manager(id).unwrap().is_pristine());
}

// ═══════════════════════════════════════════════════════════════════════
// Teardown
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn removed_parent_leaves_child_usable() {
    let mut tree = quiet_tree();
    let (root, leaf) = family(&mut tree);
    tree.manager_mut(leaf).unwrap().push(page("delegated"));

    tree.remove_manager(root).unwrap();
    assert_eq!(tree.parent(leaf), None);
    assert_eq!(
        tree.navigation_status(leaf),
        status(Stack, NavigationState::Initial)
    );

    // Back on a delegated top with no parent does nothing.
    tree.manager_mut(leaf).unwrap().navigate_back();
    assert_eq!(tree.manager(leaf).unwrap().history().count(), 1);

    // New navigation lands locally.
    let mut child = tree.manager_mut(leaf).unwrap();
    child.kill_the_flow();
    assert!(child.manager().is_pristine());
    child.push(page("local"));
    assert_eq!(child.manager().root_path().len(), 1);
    assert!(tree.diagnostics().is_clean());
}

#[test]
fn removing_manager_cancels_its_settle_tasks() {
    let mut tree = legacy_tree();
    let id = tree.create_manager(None);
    let other = tree.create_manager(None);
    let mut m = tree.manager_mut(id).unwrap();
    m.push(page("a"));
    m.replace(page("b"));
    tree.manager_mut(other).unwrap().replace(page("x"));
    assert_eq!(tree.pending_tasks().len(), 2);

    tree.remove_manager(id).unwrap();
    assert_eq!(tree.pending_tasks().len(), 1);
    assert_eq!(tree.run_pending(), 1);
    assert_eq!(tree.manager(other).unwrap().root_path().len(), 1);
}
