//! Admission check deciding whether an event may dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::{EventSettings, SettingsOverrides};

/// Pause threshold meaning nothing is paused.
pub const NOT_PAUSED: i32 = -1;

/// Lifecycle of a single event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Dispatches are evaluated normally.
    #[default]
    Listening,
    /// This event alone is disabled.
    Disabled,
    /// This event and its whole subtree are disabled.
    DisabledAll,
}

impl LifecycleState {
    /// Whether the state rejects dispatch.
    #[must_use]
    pub fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled | Self::DisabledAll)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listening => write!(f, "Listening"),
            Self::Disabled => write!(f, "Disabled"),
            Self::DisabledAll => write!(f, "DisabledAll"),
        }
    }
}

/// Outcome of the admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// The event is disabled.
    Disabled,
    /// An ancestor disabled its whole subtree.
    DisabledByAncestor,
    /// Admitted: ghost events bypass the remaining checks.
    Ghost,
    /// No connection exists and one is required.
    NoConnection,
    /// Every connected priority is paused.
    PriorityPaused,
    /// The dispatch limit was reached.
    DispatchLimitReached,
    /// Admitted: nothing is paused.
    AllListening,
    /// Admitted: some priorities are paused but higher ones listen.
    PriorityListening,
    /// No check matched.
    UnknownRejectionError,
}

impl DispatchStatus {
    /// Whether the status admits the dispatch.
    #[must_use]
    pub fn is_admitted(self) -> bool {
        matches!(
            self,
            Self::Ghost | Self::AllListening | Self::PriorityListening
        )
    }

    /// Whether the status rejects the dispatch.
    #[must_use]
    pub fn is_rejected(self) -> bool {
        !self.is_admitted()
    }

    /// Name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::DisabledByAncestor => "DisabledByAncestor",
            Self::Ghost => "Ghost",
            Self::NoConnection => "NoConnection",
            Self::PriorityPaused => "PriorityPaused",
            Self::DispatchLimitReached => "DispatchLimitReached",
            Self::AllListening => "AllListening",
            Self::PriorityListening => "PriorityListening",
            Self::UnknownRejectionError => "UnknownRejectionError",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node fields the admission check reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AdmissionView {
    pub(crate) lifecycle: LifecycleState,
    pub(crate) ancestor_disables: u32,
    pub(crate) highest_priority: Option<i32>,
    pub(crate) pause_priority: i32,
    pub(crate) dispatch_count: u64,
}

/// Evaluate the admission table top to bottom.
///
/// Pure: no node state changes.
pub(crate) fn evaluate(view: &AdmissionView, settings: &EventSettings) -> DispatchStatus {
    if view.lifecycle.is_disabled() {
        return DispatchStatus::Disabled;
    }

    if view.ancestor_disables > 0 {
        return DispatchStatus::DisabledByAncestor;
    }

    if settings.ghost {
        return DispatchStatus::Ghost;
    }

    if view.highest_priority.is_none() && settings.requires_connection {
        return DispatchStatus::NoConnection;
    }

    let paused = view.pause_priority != NOT_PAUSED;
    if paused
        && view
            .highest_priority
            .is_some_and(|highest| view.pause_priority >= highest)
    {
        return DispatchStatus::PriorityPaused;
    }

    if settings
        .dispatch_limit
        .is_some_and(|limit| view.dispatch_count >= limit)
    {
        return DispatchStatus::DispatchLimitReached;
    }

    if !paused {
        return DispatchStatus::AllListening;
    }

    if view
        .highest_priority
        .is_some_and(|highest| highest > view.pause_priority)
    {
        return DispatchStatus::PriorityListening;
    }

    DispatchStatus::UnknownRejectionError
}

type StatusCallback<'a> = Box<dyn FnOnce(DispatchStatus) + 'a>;

/// Callbacks for [`Event::validate_next_dispatch`](crate::Event::validate_next_dispatch).
#[derive(Default)]
pub struct CaseHandler<'a> {
    pub(crate) ready: Option<StatusCallback<'a>>,
    pub(crate) rejected: Option<StatusCallback<'a>>,
    pub(crate) custom_settings: Option<SettingsOverrides>,
}

impl<'a> CaseHandler<'a> {
    /// No callbacks, the event's own settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the status when the dispatch would be admitted.
    #[must_use]
    pub fn on_ready(mut self, f: impl FnOnce(DispatchStatus) + 'a) -> Self {
        self.ready = Some(Box::new(f));
        self
    }

    /// Called with the status when the dispatch would be rejected.
    #[must_use]
    pub fn on_rejected(mut self, f: impl FnOnce(DispatchStatus) + 'a) -> Self {
        self.rejected = Some(Box::new(f));
        self
    }

    /// Evaluate against the event's settings with `overrides` applied.
    #[must_use]
    pub fn with_settings(mut self, overrides: SettingsOverrides) -> Self {
        self.custom_settings = Some(overrides);
        self
    }

    pub(crate) fn send(self, status: DispatchStatus) {
        let callback = if status.is_admitted() {
            self.ready
        } else {
            self.rejected
        };
        if let Some(callback) = callback {
            callback(status);
        }
    }
}

impl fmt::Debug for CaseHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseHandler")
            .field("ready", &self.ready.is_some())
            .field("rejected", &self.rejected.is_some())
            .field("custom_settings", &self.custom_settings)
            .finish()
    }
}
