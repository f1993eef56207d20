#![forbid(unsafe_code)]

//! Stderr trace of routing decisions, marker cleanup and settle tasks.
//!
//! Off unless `WAYPOINT_DEBUG_TRACE` is `1` or `true` when the first trace
//! site runs. This is a lower level than the [`LogSink`](crate::LogSink):
//! it names managers by id and ignores the configured log level.
//!
//! ```bash
//! WAYPOINT_DEBUG_TRACE=1 cargo run -p waypoint-harness 2> trace.txt
//! ```

use std::fmt;
use std::io::Write;
use std::sync::LazyLock;
use std::time::Instant;

const ENV_VAR: &str = "WAYPOINT_DEBUG_TRACE";

static ENABLED: LazyLock<bool> =
    LazyLock::new(|| flag_set(std::env::var(ENV_VAR).ok().as_deref()));

static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

fn flag_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

#[inline]
pub fn is_enabled() -> bool {
    *ENABLED
}

/// One trace line: elapsed milliseconds, then the message.
fn line(elapsed_ms: u128, args: fmt::Arguments<'_>) -> String {
    format!("[waypoint +{elapsed_ms:>6}ms] {args}")
}

/// Write one line to stderr. Called by [`debug_trace!`](crate::debug_trace).
#[doc(hidden)]
pub fn emit(args: fmt::Arguments<'_>) {
    let text = line(EPOCH.elapsed().as_millis(), args);
    // A closed stderr must not disturb navigation.
    let _ = writeln!(std::io::stderr().lock(), "{text}");
}

/// Trace a line when `WAYPOINT_DEBUG_TRACE` is set.
///
/// ```ignore
/// debug_trace!("{} back forwarded to {}", child, parent);
/// ```
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            $crate::debug_trace::emit(format_args!($($arg)*));
        }
    };
}
