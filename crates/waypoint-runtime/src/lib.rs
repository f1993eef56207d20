#![forbid(unsafe_code)]

//! Waypoint Runtime
//!
//! The navigation state machine: a tree of managers, each owning a stack path,
//! a sheet and a cover with their own paths, and one history ledger that ties
//! them together.
//!
//! # Key Components
//!
//! - [`NavigationTree`] - Arena owning every manager and the parent/child links
//! - [`ManagerMut`] - Handle for navigating one manager
//! - [`NavigationManager`] - Read-only view of a manager's state
//! - [`Scheduler`] / [`SettleQueue`] - Deferred work for two-step modal resets
//! - [`LogSink`] - Pluggable, leveled log destination
//! - [`Diagnostics`] - Counters and reconciliation fault records
//! - [`SharedNavigationTree`] - Mutex-serialized access from several threads
//!
//! # How it fits in the system
//! `waypoint-core` supplies the vocabulary (pages, entries, paths, config).
//! This crate decides where each request lands, keeps the ledger reconciled
//! against the paths, and tells the view layer what changed through
//! [`NavigationEvent`]s.

pub mod debug_trace;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod log_sink;
pub mod manager;
pub mod navigate;
pub mod observe;
mod reconcile;
pub mod scheduler;
pub mod shared;
pub mod tree;

pub use diagnostics::{Diagnostics, ReconciliationFault};
pub use error::{TreeError, TreeResult};
pub use handle::ManagerMut;
pub use log_sink::{
    LogRecord, LogSink, MemoryLogSink, NullLogSink, OwnedLogRecord, TracingLogSink,
};
pub use manager::{ManagerId, ManagerSnapshot, NavigationManager};
pub use navigate::NavigationStep;
pub use observe::{Change, NavigationEvent, Observer, ObserverId};
pub use scheduler::{Scheduler, SettleAction, SettleQueue, SettleTask};
pub use shared::SharedNavigationTree;
pub use tree::NavigationTree;
