#![forbid(unsafe_code)]

//! Presentation styles and the derived navigation status.

use std::fmt;

/// How a page is presented.
///
/// `Stack` pages are pushed onto the region's linear path. `Sheet` and
/// `Cover` pages open (or push within) a modal that carries its own path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentationMethod {
    /// Linear push/pop navigation.
    #[default]
    Stack,
    /// Partial-screen modal overlay.
    Sheet,
    /// Full-screen modal overlay.
    Cover,
}

impl PresentationMethod {
    /// All presentation styles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Stack, Self::Sheet, Self::Cover];

    /// Whether this style is one of the modal overlays.
    #[inline]
    #[must_use]
    pub const fn is_modal(self) -> bool {
        matches!(self, Self::Sheet | Self::Cover)
    }

    /// Short lowercase name used in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::Sheet => "sheet",
            Self::Cover => "cover",
        }
    }
}

impl fmt::Display for PresentationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the active presentation has anything pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NavigationState {
    /// The active presentation's path is empty.
    #[default]
    Initial,
    /// The active presentation's path has at least one page.
    Navigated,
}

impl NavigationState {
    /// Derive the state from a path's emptiness.
    #[inline]
    #[must_use]
    pub const fn from_empty(is_empty: bool) -> Self {
        if is_empty {
            Self::Initial
        } else {
            Self::Navigated
        }
    }
}

/// Snapshot answer to "where is this region right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NavigationStatus {
    /// The presentation currently receiving navigation.
    pub presentation_type: PresentationMethod,
    /// Whether that presentation has pushed pages.
    pub state: NavigationState,
}

impl NavigationStatus {
    /// Build a status value.
    #[must_use]
    pub const fn new(presentation_type: PresentationMethod, state: NavigationState) -> Self {
        Self {
            presentation_type,
            state,
        }
    }
}

impl fmt::Display for NavigationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            NavigationState::Initial => "initial",
            NavigationState::Navigated => "navigated",
        };
        write!(f, "{}/{}", self.presentation_type, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stack() {
        assert_eq!(PresentationMethod::default(), PresentationMethod::Stack);
        assert!(!PresentationMethod::Stack.is_modal());
        assert!(PresentationMethod::Sheet.is_modal());
        assert!(PresentationMethod::Cover.is_modal());
    }

    #[test]
    fn state_from_emptiness() {
        assert_eq!(NavigationState::from_empty(true), NavigationState::Initial);
        assert_eq!(NavigationState::from_empty(false), NavigationState::Navigated);
    }

    #[test]
    fn status_display() {
        let status = NavigationStatus::new(PresentationMethod::Sheet, NavigationState::Navigated);
        assert_eq!(status.to_string(), "sheet/navigated");
        assert_eq!(NavigationStatus::default().to_string(), "stack/initial");
    }
}
