#![forbid(unsafe_code)]

//! Core: pages, presentation styles, the history ledger and path collections.
//!
//! Nothing in this crate knows about managers or trees. It is the vocabulary
//! the runtime's state machine is written in.

pub mod config;
pub mod history;
pub mod page;
pub mod path;
pub mod presentation;
pub mod stack;

pub use config::{LogLevel, NavigationConfig, PresentationCompat};
pub use history::{EntryId, HistoryEntry, HistoryLedger};
pub use page::Page;
pub use path::{PathChange, PathCollection};
pub use presentation::{NavigationState, NavigationStatus, PresentationMethod};
pub use stack::SyncStack;
