#![forbid(unsafe_code)]

//! Waypoint public facade crate.
//!
//! Re-exports the navigation vocabulary from `waypoint-core` and the state
//! machine from `waypoint-runtime`, plus a prelude for day-to-day use.
//!
//! ```
//! use waypoint::prelude::*;
//!
//! fn open_settings(tree: &mut NavigationTree, tab: ManagerId) -> waypoint::Result<()> {
//!     let mut tab = tree.manager_mut(tab)?;
//!     tab.register_sheet_stack();
//!     tab.navigate(Page::labeled("settings", "Settings"), PresentationMethod::Sheet, false);
//!     Ok(())
//! }
//!
//! let mut tree = NavigationTree::new(NavigationConfig::quiet());
//! let tab = tree.create_manager(Some("home"));
//! open_settings(&mut tree, tab).unwrap();
//! assert_eq!(
//!     tree.navigation_status(tab),
//!     NavigationStatus::new(PresentationMethod::Sheet, NavigationState::Initial),
//! );
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use waypoint_core::{
    EntryId, HistoryEntry, HistoryLedger, LogLevel, NavigationConfig, NavigationState,
    NavigationStatus, Page, PathChange, PathCollection, PresentationCompat, PresentationMethod,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use waypoint_runtime::{
    Change, Diagnostics, LogSink, ManagerId, ManagerMut, ManagerSnapshot, MemoryLogSink,
    NavigationEvent, NavigationManager, NavigationStep, NavigationTree, NullLogSink,
    ReconciliationFault, SettleQueue, SharedNavigationTree, TracingLogSink, TreeError,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Waypoint callers.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A tree management call was rejected.
    #[cfg(feature = "runtime")]
    Tree(TreeError),
    /// Caller-side failure with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "runtime")]
            Self::Tree(err) => write!(f, "{err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "runtime")]
            Self::Tree(err) => Some(err),
            Self::Other(_) => None,
        }
    }
}

#[cfg(feature = "runtime")]
impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

/// Standard result type for Waypoint APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, NavigationConfig, NavigationState, NavigationStatus, Page, PresentationMethod,
        Result,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{ManagerId, ManagerMut, NavigationStep, NavigationTree, SharedNavigationTree};

    pub use crate::core;
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use waypoint_core as core;
#[cfg(feature = "runtime")]
pub use waypoint_runtime as runtime;
