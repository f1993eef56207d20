#![forbid(unsafe_code)]

//! Navigation Walkthrough Harness
//!
//! Drives a two-level tree (an app manager that owns the modals and a feed
//! tab that delegates to it) through a fixed script, printing both managers
//! after every step.
//!
//! # Running
//!
//! ```sh
//! cargo run -p waypoint-harness
//! WAYPOINT_HARNESS_COMPAT=legacy cargo run -p waypoint-harness
//! WAYPOINT_HARNESS_JSONL=1 cargo run -p waypoint-harness
//! ```
//!
//! # Environment
//!
//! - `WAYPOINT_HARNESS_COMPAT`: `modern` (default) or `legacy` (two-step resets)
//! - `WAYPOINT_HARNESS_JSONL`: emit one JSON object per step instead of text
//! - `RUST_LOG`: log filter for the `waypoint` target (default `waypoint=info`)

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing_subscriber::EnvFilter;
use waypoint_core::{NavigationConfig, Page, PresentationMethod};
use waypoint_runtime::{ManagerId, NavigationTree, TreeResult};

#[derive(Debug, Clone, Copy)]
enum Target {
    App,
    Feed,
}

#[derive(Debug, Clone)]
enum Step {
    Navigate(Target, &'static str, PresentationMethod, bool),
    Back(Target),
    Replace(Target, &'static str),
    Kill(Target),
    DismissSheet(Target),
    Settle,
}

impl Step {
    fn label(&self) -> String {
        match self {
            Self::Navigate(target, page, presentation, is_root) => {
                let root = if *is_root { " (root)" } else { "" };
                format!("{target:?} navigate {presentation} {page}{root}")
            }
            Self::Back(target) => format!("{target:?} back"),
            Self::Replace(target, page) => format!("{target:?} replace with {page}"),
            Self::Kill(target) => format!("{target:?} kill the flow"),
            Self::DismissSheet(target) => format!("{target:?} sheet dismissed by gesture"),
            Self::Settle => "settle pending work".to_string(),
        }
    }
}

fn script() -> Vec<Step> {
    use PresentationMethod::{Cover, Sheet, Stack};
    vec![
        Step::Navigate(Target::Feed, "Article", Stack, false),
        Step::Navigate(Target::Feed, "Comments", Sheet, false),
        Step::Navigate(Target::Feed, "Reply", Stack, false),
        Step::Navigate(Target::App, "Login", Cover, false),
        Step::Back(Target::Feed),
        Step::Navigate(Target::App, "Share", Sheet, true),
        Step::Navigate(Target::App, "Contacts", Stack, false),
        Step::Settle,
        Step::DismissSheet(Target::App),
        Step::Replace(Target::Feed, "Article v2"),
        Step::Settle,
        Step::Navigate(Target::Feed, "Profile", Cover, false),
        Step::Kill(Target::Feed),
    ]
}

struct Harness {
    tree: NavigationTree,
    app: ManagerId,
    feed: ManagerId,
    events: Arc<Mutex<usize>>,
}

impl Harness {
    fn new(config: NavigationConfig) -> TreeResult<Self> {
        let mut tree = NavigationTree::new(config);
        let app = tree.create_manager(Some("app"));
        let feed = tree.create_manager(Some("feed"));
        tree.set_parent(feed, Some(app))?;

        let mut handle = tree.manager_mut(app)?;
        handle.register_sheet_stack();
        handle.register_cover_stack();

        let events = Arc::new(Mutex::new(0usize));
        for id in [app, feed] {
            let events = Arc::clone(&events);
            tree.subscribe(id, move |_event| {
                *events.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            })?;
        }

        Ok(Self {
            tree,
            app,
            feed,
            events,
        })
    }

    fn id(&self, target: Target) -> ManagerId {
        match target {
            Target::App => self.app,
            Target::Feed => self.feed,
        }
    }

    fn apply(&mut self, step: &Step) -> TreeResult<()> {
        match *step {
            Step::Navigate(target, name, presentation, is_root) => {
                let page = Page::labeled(name, name);
                self.tree
                    .manager_mut(self.id(target))?
                    .navigate(page, presentation, is_root);
            }
            Step::Back(target) => self.tree.manager_mut(self.id(target))?.navigate_back(),
            Step::Replace(target, name) => {
                self.tree
                    .manager_mut(self.id(target))?
                    .replace(Page::labeled(name, name));
            }
            Step::Kill(target) => self.tree.manager_mut(self.id(target))?.kill_the_flow(),
            Step::DismissSheet(target) => {
                self.tree
                    .manager_mut(self.id(target))?
                    .on_sheet_modal_dismissed();
            }
            Step::Settle => {
                let ran = self.tree.run_pending();
                tracing::debug!(target: "waypoint", ran, "settled");
            }
        }
        Ok(())
    }

    fn event_count(&self) -> usize {
        *self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report_text(&self, out: &mut impl Write, index: usize, step: &Step) -> io::Result<()> {
        writeln!(out, "{index:>2}. {}", step.label())?;
        for id in [self.app, self.feed] {
            if let Some(snapshot) = self.tree.snapshot(id) {
                writeln!(
                    out,
                    "      {snapshot} status={}",
                    self.tree.navigation_status(id)
                )?;
            }
        }
        let pending = self.tree.pending_tasks();
        if !pending.is_empty() {
            let tasks: Vec<String> = pending.iter().map(ToString::to_string).collect();
            writeln!(out, "      pending: {}", tasks.join(", "))?;
        }
        Ok(())
    }

    fn report_jsonl(&self, out: &mut impl Write, index: usize, step: &Step) -> io::Result<()> {
        let managers: Vec<_> = [self.app, self.feed]
            .into_iter()
            .filter_map(|id| self.tree.snapshot(id).map(|s| (id, s)))
            .map(|(id, s)| {
                let status = self.tree.navigation_status(id);
                json!({
                    "id": id.get(),
                    "identifier": s.identifier,
                    "active": s.active_presentation.as_str(),
                    "stack": s.root_path.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "root_sheet": s.root_sheet.as_ref().map(ToString::to_string),
                    "sheet": s.sheet_path.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "root_cover": s.root_cover.as_ref().map(ToString::to_string),
                    "cover": s.cover_path.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "history": s.history_len,
                    "status": status.to_string(),
                })
            })
            .collect();
        let line = json!({
            "step": index,
            "action": step.label(),
            "managers": managers,
            "pending": self.tree.pending_tasks().len(),
            "events": self.event_count(),
            "consistent": self.tree.is_consistent(),
        });
        writeln!(out, "{line}")
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waypoint=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> io::Result<()> {
    init_tracing();

    let config = match std::env::var("WAYPOINT_HARNESS_COMPAT") {
        Ok(value) if value.eq_ignore_ascii_case("legacy") => NavigationConfig::legacy(),
        _ => NavigationConfig::modern(),
    };
    let jsonl = std::env::var("WAYPOINT_HARNESS_JSONL")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let mut harness = Harness::new(config).map_err(io::Error::other)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (index, step) in script().iter().enumerate() {
        harness.apply(step).map_err(io::Error::other)?;
        if jsonl {
            harness.report_jsonl(&mut out, index + 1, step)?;
        } else {
            harness.report_text(&mut out, index + 1, step)?;
        }
    }

    let diagnostics = harness.tree.diagnostics();
    if !jsonl {
        writeln!(
            out,
            "events={} delegations={} deferred={} faults={} empty_backs={}",
            harness.event_count(),
            diagnostics.delegations,
            diagnostics.deferred_commits,
            diagnostics.reconciliation_faults,
            diagnostics.empty_back_attempts,
        )?;
    }
    if !diagnostics.is_clean() || !harness.tree.is_consistent() {
        eprintln!("walkthrough ended with reconciliation faults");
        std::process::exit(2);
    }
    Ok(())
}
