//! Errors surfaced by tree management calls.
//!
//! Navigation itself never fails: misuse is logged and degraded. Only
//! addressing a manager that does not exist, or linking managers into a
//! cycle, is reported to the caller.

use std::fmt;

use crate::manager::ManagerId;

/// Errors from [`NavigationTree`](crate::NavigationTree) management calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The id was never issued by this tree, or the manager was removed.
    UnknownManager(ManagerId),
    /// Linking `child` under `parent` would make a manager its own ancestor.
    WouldCycle {
        child: ManagerId,
        parent: ManagerId,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownManager(id) => write!(f, "unknown navigation manager {id}"),
            TreeError::WouldCycle { child, parent } => {
                write!(f, "making {parent} the parent of {child} would create a cycle")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Result type for tree management calls.
pub type TreeResult<T> = Result<T, TreeError>;
