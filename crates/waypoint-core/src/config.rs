#![forbid(unsafe_code)]

//! Per-tree navigation configuration.
//!
//! Configuration is an explicit value handed to the tree at construction;
//! there is no process-wide logger switch or platform flag.
//!
//! # Presentation compatibility
//!
//! Older view layers cannot swap a modal root from one non-empty value to a
//! different non-empty value inside a single update. [`PresentationCompat`]
//! selects how a modal root reset is applied:
//!
//! | Mode | Reset of an occupied root slot |
//! |------|--------------------------------|
//! | `SingleTick` | clear and assign in the same call |
//! | `TwoStep` | clear now, assign after `settle_delay` |
//!
//! Resetting an *empty* root slot never needs the second step.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use waypoint_core::{LogLevel, NavigationConfig, PresentationCompat};
//!
//! let config = NavigationConfig::legacy()
//!     .settle_delay(Duration::from_millis(200))
//!     .log_level(LogLevel::Verbose);
//! assert_eq!(config.compat, PresentationCompat::TwoStep);
//! assert!(config.allows(LogLevel::Info));
//! ```

use std::fmt;
use std::time::Duration;

/// Severity of a navigation log line, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Step-by-step state machine detail.
    Verbose,
    /// Normal navigation events.
    #[default]
    Info,
    /// Misuse that was tolerated.
    Error,
    /// Ledger/path inconsistency; state may be wrong.
    Critical,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbose => "verbose",
            Self::Info => "info",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How modal root resets are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentationCompat {
    /// Current view layers: resets complete in one call.
    #[default]
    SingleTick,
    /// Older view layers: resets of an occupied slot are split across ticks,
    /// and `replace` re-navigates after the settle delay.
    TwoStep,
}

/// Configuration shared by every manager in a tree.
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Identifier given to managers created without one.
    /// Default: `"NavigationManager"`
    pub default_identifier: String,

    /// Modal reset strategy.
    /// Default: [`PresentationCompat::SingleTick`]
    pub compat: PresentationCompat,

    /// Delay before the deferred half of a two-step reset or `replace`.
    /// Default: 350ms
    pub settle_delay: Duration,

    /// Master switch for the log sink.
    /// Default: true
    pub logging_enabled: bool,

    /// Lowest level forwarded to the log sink.
    /// Default: [`LogLevel::Info`]
    pub log_level: LogLevel,

    /// Number of reconciliation fault records kept for inspection.
    /// Default: 64
    pub max_fault_records: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_identifier: "NavigationManager".to_string(),
            compat: PresentationCompat::SingleTick,
            settle_delay: Duration::from_millis(350),
            logging_enabled: true,
            log_level: LogLevel::Info,
            max_fault_records: 64,
        }
    }
}

impl NavigationConfig {
    /// Defaults for current view layers.
    #[must_use]
    pub fn modern() -> Self {
        Self::default()
    }

    /// Defaults for view layers that need two-step modal resets.
    #[must_use]
    pub fn legacy() -> Self {
        Self::default().compat(PresentationCompat::TwoStep)
    }

    /// Defaults with logging switched off.
    #[must_use]
    pub fn quiet() -> Self {
        Self::default().logging_enabled(false)
    }

    // ── Builder Methods ────────────────────────────────────────────────

    #[must_use]
    pub fn default_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.default_identifier = identifier.into();
        self
    }

    #[must_use]
    pub fn compat(mut self, compat: PresentationCompat) -> Self {
        self.compat = compat;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn max_fault_records(mut self, max: usize) -> Self {
        self.max_fault_records = max;
        self
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Whether a line at `level` should reach the sink.
    #[inline]
    #[must_use]
    pub fn allows(&self, level: LogLevel) -> bool {
        self.logging_enabled && level >= self.log_level
    }

    /// Whether resets of occupied root slots are deferred.
    #[inline]
    #[must_use]
    pub fn defers_resets(&self) -> bool {
        self.compat == PresentationCompat::TwoStep
    }
}
