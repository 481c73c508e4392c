use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recognised dispatch phase names, in their default order.
pub const PHASE_NAMES: [&str; 4] = ["self", "linked", "descendant", "ascendant"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings for new events.
    pub events: EventsSection,
    /// Waiter defaults.
    pub waiters: WaitersSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// EventsSection
// ---------------------------------------------------------------------------

/// Default dispatch settings applied to events built from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventsSection {
    /// Maximum admitted dispatches per event. Absent means unbounded;
    /// `0` admits nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_limit: Option<u64>,
    /// Phase names in execution order (`"self"`, `"linked"`,
    /// `"descendant"`, `"ascendant"`).
    pub dispatch_order: Vec<String>,
    /// Run own handlers.
    pub dispatch_self: bool,
    /// Dispatch linked events.
    pub dispatch_linked: bool,
    /// Dispatch children.
    pub dispatch_descendants: bool,
    /// Dispatch the parent.
    pub dispatch_ascendants: bool,
    /// Reject dispatch when an event has no connection.
    pub requires_connection: bool,
    /// Admit every dispatch that is not disabled.
    pub ghost: bool,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            dispatch_limit: None,
            dispatch_order: PHASE_NAMES.iter().map(|&p| p.to_owned()).collect(),
            dispatch_self: true,
            dispatch_linked: true,
            dispatch_descendants: false,
            dispatch_ascendants: false,
            requires_connection: true,
            ghost: false,
        }
    }
}

// ---------------------------------------------------------------------------
// WaitersSection
// ---------------------------------------------------------------------------

/// Waiter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitersSection {
    /// Timeout applied when none is given, in seconds. `0` waits forever.
    pub default_timeout_secs: f64,
}

impl WaitersSection {
    /// The default timeout, or `None` to wait forever.
    ///
    /// Values that do not fit a [`Duration`] also mean forever; validation
    /// rejects negative and non-finite values before this is reached.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.default_timeout_secs > 0.0 {
            Duration::try_from_secs_f64(self.default_timeout_secs).ok()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["ripple_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
