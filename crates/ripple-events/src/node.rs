//! Event nodes: the tree, the lifecycle, and the pause/disable controls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, warn};

use crate::connection::{ConnectOptions, Connection, ConnectionPriority, DisconnectFilter};
use crate::id::EventId;
use crate::registry::ConnectionRegistry;
use crate::settings::{EventSettings, SettingsOverrides};
use crate::status::{
    AdmissionView, CaseHandler, DispatchStatus, LifecycleState, NOT_PAUSED, evaluate,
};
use crate::waiter::WaiterRegistry;

/// Dispatch statistics of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Number of admitted dispatches.
    pub dispatch_count: u64,
    /// When the event was last admitted.
    pub time_last_dispatched: Option<DateTime<Utc>>,
}

/// Options for [`Event::pause`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseOptions {
    /// Suppress every priority at or below this one.
    pub priority: i32,
}

impl From<i32> for PauseOptions {
    fn from(priority: i32) -> Self {
        Self { priority }
    }
}

impl From<ConnectionPriority> for PauseOptions {
    fn from(priority: ConnectionPriority) -> Self {
        Self { priority: priority.value() }
    }
}

/// Pause thresholds kept for [`Event::resume`]; older ones are dropped.
pub const MAX_PAUSE_DEPTH: usize = 64;

pub(crate) struct NodeState {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) settings: EventSettings,
    pub(crate) stats: DispatchStats,
    lifecycle: LifecycleState,
    previous_state: LifecycleState,
    pause_priority: i32,
    pause_history: VecDeque<i32>,
    ancestor_disables: u32,
    pub(crate) propagating: bool,
    pub(crate) waiters: WaiterRegistry,
    children: Vec<Event>,
}

impl NodeState {
    fn new(settings: EventSettings, ancestor_disables: u32) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            settings,
            stats: DispatchStats::default(),
            lifecycle: LifecycleState::Listening,
            previous_state: LifecycleState::Listening,
            pause_priority: NOT_PAUSED,
            pause_history: VecDeque::new(),
            ancestor_disables,
            propagating: false,
            waiters: WaiterRegistry::default(),
            children: Vec::new(),
        }
    }

    pub(crate) fn admission_view(&self) -> AdmissionView {
        AdmissionView {
            lifecycle: self.lifecycle,
            ancestor_disables: self.ancestor_disables,
            highest_priority: self.registry.highest_priority(),
            pause_priority: self.pause_priority,
            dispatch_count: self.stats.dispatch_count,
        }
    }

    /// Threshold for the self phase; `None` when nothing is paused.
    pub(crate) fn paused_threshold(&self) -> Option<i32> {
        (self.pause_priority != NOT_PAUSED).then_some(self.pause_priority)
    }

    /// Disable count a new child starts with.
    fn inherited_disables(&self) -> u32 {
        let own = u32::from(self.lifecycle == LifecycleState::DisabledAll);
        self.ancestor_disables.saturating_add(own)
    }

    fn clamp_pause(&self, priority: i32) -> i32 {
        self.registry
            .highest_priority()
            .map_or(NOT_PAUSED, |highest| priority.min(highest).max(NOT_PAUSED))
    }
}

pub(crate) struct EventInner {
    id: EventId,
    parent: Option<Weak<EventInner>>,
    state: RwLock<NodeState>,
}

/// A node in the dispatch tree.
///
/// `Event` is a cheap handle; clones share one node. A parent keeps its
/// children alive; a child only weakly references its parent.
///
/// # Panics
///
/// Methods panic if the node's state lock was poisoned. Handlers never run
/// while the lock is held.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

/// Non-owning reference to an [`Event`].
#[derive(Clone)]
pub struct WeakEvent {
    inner: Weak<EventInner>,
}

impl WeakEvent {
    /// The event, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Event> {
        self.inner.upgrade().map(|inner| Event { inner })
    }
}

impl fmt::Debug for WeakEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(event) => write!(f, "WeakEvent({})", event.id()),
            None => write!(f, "WeakEvent(dropped)"),
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    /// Create a root event with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_settings(EventSettings::default())
    }

    /// Create a root event with `overrides` applied to the defaults.
    #[must_use]
    pub fn with_settings(overrides: SettingsOverrides) -> Self {
        Self::from_settings(EventSettings::default().merged(&overrides))
    }

    /// Create a root event from complete settings.
    #[must_use]
    pub fn from_settings(settings: EventSettings) -> Self {
        Self::build(None, settings, 0)
    }

    /// Create a child of this event with default settings.
    #[must_use]
    pub fn child(&self) -> Self {
        self.child_from_settings(EventSettings::default())
    }

    /// Create a child of this event with `overrides` applied to the defaults.
    #[must_use]
    pub fn child_with_settings(&self, overrides: SettingsOverrides) -> Self {
        self.child_from_settings(EventSettings::default().merged(&overrides))
    }

    /// Create a child of this event from complete settings.
    ///
    /// A child created inside a disabled subtree starts out disabled by its
    /// ancestors.
    #[must_use]
    pub fn child_from_settings(&self, settings: EventSettings) -> Self {
        let mut parent_state = self.write();
        let child = Self::build(
            Some(Arc::downgrade(&self.inner)),
            settings,
            parent_state.inherited_disables(),
        );
        parent_state.children.push(child.clone());
        child
    }

    fn build(parent: Option<Weak<EventInner>>, settings: EventSettings, disables: u32) -> Self {
        Self {
            inner: Arc::new(EventInner {
                id: EventId::new(),
                parent,
                state: RwLock::new(NodeState::new(settings, disables)),
            }),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.inner.state.read().expect("event state lock poisoned")
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.inner.state.write().expect("event state lock poisoned")
    }

    /// Process-unique identifier.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.inner.id
    }

    /// Non-owning handle to this event.
    #[must_use]
    pub fn downgrade(&self) -> WeakEvent {
        WeakEvent {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The parent, if any and still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Self { inner })
    }

    /// Direct children in creation order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.read().children.clone()
    }

    /// Visit this event and every descendant, pre-order.
    pub fn walk(&self, visit: &mut impl FnMut(&Self)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    fn walk_descendants(&self, visit: &mut impl FnMut(&Self)) {
        for child in self.children() {
            child.walk(visit);
        }
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    /// Register a handler.
    pub fn connect(&self, options: ConnectOptions) -> Connection {
        let connection = Connection::new(options);
        self.write().registry.insert(connection.clone());
        debug!(
            event = %self.id(),
            connection = %connection.id(),
            priority = connection.priority(),
            name = ?connection.name(),
            "Connection registered"
        );
        connection
    }

    /// Register a closure at priority 0.
    pub fn connect_fn<F>(&self, f: F) -> Connection
    where
        F: Fn(&Self, &[serde_json::Value]) + Send + Sync + 'static,
    {
        self.connect(ConnectOptions::new(f))
    }

    /// Remove connections matching `filter`.
    ///
    /// Returns the number removed.
    pub fn disconnect(&self, filter: impl Into<DisconnectFilter>) -> usize {
        let removed = match filter.into() {
            DisconnectFilter::Connection(connection) => {
                usize::from(self.write().registry.remove(&connection))
            },
            DisconnectFilter::Matching(criteria) => {
                self.write().registry.remove_matching(&criteria)
            },
        };
        debug!(event = %self.id(), removed, "Connections disconnected");
        removed
    }

    /// [`disconnect`](Self::disconnect) on this event and every descendant.
    pub fn disconnect_all(&self, filter: impl Into<DisconnectFilter>) -> usize {
        let filter = filter.into();
        let mut removed: usize = 0;
        self.walk(&mut |event| {
            removed = removed.saturating_add(event.disconnect(filter.clone()));
        });
        removed
    }

    /// Highest connected priority.
    #[must_use]
    pub fn highest_priority(&self) -> Option<i32> {
        self.read().registry.highest_priority()
    }

    /// Connected priorities, ascending.
    #[must_use]
    pub fn priority_order(&self) -> Vec<i32> {
        self.read().registry.priority_order().to_vec()
    }

    /// Number of connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.read().registry.len()
    }

    /// Every connection, ascending by priority.
    #[must_use]
    pub fn connections(&self) -> Vec<Connection> {
        self.read().registry.iter().cloned().collect()
    }

    /// Connections at `priority`, in insertion order.
    #[must_use]
    pub fn connections_at(&self, priority: i32) -> Vec<Connection> {
        self.read()
            .registry
            .bucket(priority)
            .map(<[Connection]>::to_vec)
            .unwrap_or_default()
    }

    /// Whether at least one connection is registered.
    #[must_use]
    pub fn has_connections(&self) -> bool {
        !self.read().registry.is_empty()
    }

    // ---------------------------------------------------------------------
    // Pause / resume
    // ---------------------------------------------------------------------

    /// Suppress every priority at or below `options.priority` during the
    /// self phase.
    ///
    /// The threshold is clamped to `[-1, highest_priority]`; the previous
    /// threshold is saved for [`resume`](Self::resume). Returns the stored
    /// threshold.
    ///
    /// When every connection has a negative priority the clamp yields `-1`,
    /// so such an event cannot be paused and all of its handlers keep
    /// running. Only the last [`MAX_PAUSE_DEPTH`] thresholds are kept; a
    /// resume past them unpauses.
    pub fn pause(&self, options: impl Into<PauseOptions>) -> i32 {
        let requested = options.into().priority;
        let mut state = self.write();
        let threshold = state.clamp_pause(requested);
        let previous = state.pause_priority;
        if state.pause_history.len() >= MAX_PAUSE_DEPTH {
            state.pause_history.pop_front();
        }
        state.pause_history.push_back(previous);
        state.pause_priority = threshold;
        drop(state);

        debug!(event = %self.id(), requested, threshold, "Event paused");
        threshold
    }

    /// [`pause`](Self::pause) this event and every descendant.
    pub fn pause_all(&self, options: impl Into<PauseOptions>) {
        let options = options.into();
        self.walk(&mut |event| {
            event.pause(options);
        });
    }

    /// Restore the threshold saved by the matching [`pause`](Self::pause),
    /// or unpause entirely if there is none. Returns the restored threshold.
    pub fn resume(&self) -> i32 {
        let mut state = self.write();
        let restored = state.pause_history.pop_back().unwrap_or(NOT_PAUSED);
        state.pause_priority = restored;
        drop(state);

        debug!(event = %self.id(), threshold = restored, "Event resumed");
        restored
    }

    /// [`resume`](Self::resume) this event and every descendant.
    pub fn resume_all(&self) {
        self.walk(&mut |event| {
            event.resume();
        });
    }

    /// Current pause threshold; `-1` when nothing is paused.
    #[must_use]
    pub fn pause_priority(&self) -> i32 {
        self.read().pause_priority
    }

    /// Whether nothing is paused.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.pause_priority() == NOT_PAUSED
    }

    // ---------------------------------------------------------------------
    // Disable / enable
    // ---------------------------------------------------------------------

    /// Disable this event alone.
    ///
    /// Returns `false` (and logs) if it was already disabled.
    pub fn disable(&self) -> bool {
        self.transition_to(LifecycleState::Disabled, "disable")
    }

    /// Disable this event and make every descendant reject with
    /// [`DispatchStatus::DisabledByAncestor`].
    ///
    /// Returns `false` (and logs) if it was already disabled.
    pub fn disable_all(&self) -> bool {
        if !self.transition_to(LifecycleState::DisabledAll, "disable_all") {
            return false;
        }
        self.walk_descendants(&mut |event| {
            let mut state = event.write();
            state.ancestor_disables = state.ancestor_disables.saturating_add(1);
        });
        true
    }

    /// Undo [`disable`](Self::disable).
    ///
    /// Returns `false` (and logs) if the event is not disabled on its own.
    pub fn enable(&self) -> bool {
        self.restore_from(LifecycleState::Disabled, "enable")
    }

    /// Undo [`disable_all`](Self::disable_all).
    ///
    /// Returns `false` (and logs) if the event is not disabled with its subtree.
    pub fn enable_all(&self) -> bool {
        if !self.restore_from(LifecycleState::DisabledAll, "enable_all") {
            return false;
        }
        self.walk_descendants(&mut |event| {
            let mut state = event.write();
            state.ancestor_disables = state.ancestor_disables.saturating_sub(1);
        });
        true
    }

    fn transition_to(&self, target: LifecycleState, operation: &str) -> bool {
        let mut state = self.write();
        if state.lifecycle.is_disabled() {
            let current = state.lifecycle;
            drop(state);
            warn!(
                event = %self.id(),
                state = %current,
                operation,
                "Cannot disable event in this state (event must be enabled first)"
            );
            return false;
        }
        state.previous_state = state.lifecycle;
        state.lifecycle = target;
        drop(state);

        debug!(event = %self.id(), state = %target, "Event disabled");
        true
    }

    fn restore_from(&self, expected: LifecycleState, operation: &str) -> bool {
        let mut state = self.write();
        if state.lifecycle != expected {
            let current = state.lifecycle;
            drop(state);
            warn!(
                event = %self.id(),
                state = %current,
                operation,
                "Cannot enable event in this state"
            );
            return false;
        }
        state.lifecycle = state.previous_state;
        let restored = state.lifecycle;
        drop(state);

        debug!(event = %self.id(), state = %restored, "Event enabled");
        true
    }

    /// Own lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.read().lifecycle
    }

    /// State that [`enable`](Self::enable) restores.
    #[must_use]
    pub fn previous_state(&self) -> LifecycleState {
        self.read().previous_state
    }

    /// Whether the own state is `Listening`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.is_disabled()
    }

    /// Whether the own state is `Disabled` or `DisabledAll`.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state().is_disabled()
    }

    /// Whether the own state is `Disabled`.
    #[must_use]
    pub fn is_disabled_one(&self) -> bool {
        self.state() == LifecycleState::Disabled
    }

    /// Whether the own state is `DisabledAll`.
    #[must_use]
    pub fn is_disabled_all(&self) -> bool {
        self.state() == LifecycleState::DisabledAll
    }

    /// Number of ancestors currently disabling this subtree.
    #[must_use]
    pub fn ancestor_disable_count(&self) -> u32 {
        self.read().ancestor_disables
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    /// Copy of the stored settings.
    #[must_use]
    pub fn settings(&self) -> EventSettings {
        self.read().settings.clone()
    }

    /// Apply `overrides` to the stored settings.
    pub fn update_settings(&self, overrides: &SettingsOverrides) {
        self.write().settings.apply(overrides);
    }

    /// Turn ghost mode on.
    pub fn set_ghost(&self) {
        self.write().settings.ghost = true;
    }

    /// Turn ghost mode off.
    pub fn unset_ghost(&self) {
        self.write().settings.ghost = false;
    }

    /// Stop running own handlers while still propagating.
    pub fn disable_listeners(&self) {
        self.write().settings.dispatch_self = false;
    }

    /// Undo [`disable_listeners`](Self::disable_listeners).
    pub fn enable_listeners(&self) {
        self.write().settings.dispatch_self = true;
    }

    /// Append `other` to the linked events.
    pub fn link(&self, other: &Self) {
        self.write().settings.linked_events.push(other.downgrade());
    }

    /// Remove `other` from the linked events. Returns `true` if it was linked.
    pub fn unlink(&self, other: &Self) -> bool {
        let target = Arc::downgrade(&other.inner);
        let mut state = self.write();
        let before = state.settings.linked_events.len();
        state
            .settings
            .linked_events
            .retain(|linked| !Weak::ptr_eq(&linked.inner, &target));
        state.settings.linked_events.len() != before
    }

    // ---------------------------------------------------------------------
    // Stats and propagation flag
    // ---------------------------------------------------------------------

    /// Copy of the dispatch statistics.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.read().stats.clone()
    }

    /// Number of admitted dispatches.
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        self.read().stats.dispatch_count
    }

    /// When this event was last admitted.
    #[must_use]
    pub fn time_last_dispatched(&self) -> Option<DateTime<Utc>> {
        self.read().stats.time_last_dispatched
    }

    /// Stop the dispatch currently running on this event from climbing any
    /// further up the tree.
    ///
    /// Call it from a handler on the catalyst it receives; calls on other
    /// visited events do not affect the climb.
    pub fn stop_propagating(&self) {
        self.write().propagating = false;
    }

    /// Whether a dispatch of this event is running and was not stopped.
    ///
    /// Cleared again when the event's phases finish.
    #[must_use]
    pub fn is_propagating(&self) -> bool {
        self.read().propagating
    }

    // ---------------------------------------------------------------------
    // Admission
    // ---------------------------------------------------------------------

    /// Evaluate the admission check without dispatching.
    #[must_use]
    pub fn evaluate_next_dispatch(&self, overrides: &SettingsOverrides) -> DispatchStatus {
        let state = self.read();
        let settings = state.settings.merged(overrides);
        evaluate(&state.admission_view(), &settings)
    }

    /// Evaluate the admission check and report to the matching callback.
    ///
    /// Returns `true` if the dispatch would be admitted.
    pub fn validate_next_dispatch(&self, case: CaseHandler<'_>) -> bool {
        let overrides = case.custom_settings.clone().unwrap_or_default();
        let status = self.evaluate_next_dispatch(&overrides);
        case.send(status);
        status.is_admitted()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("state", &state.lifecycle)
            .field("connections", &state.registry.len())
            .field("children", &state.children.len())
            .field("pause_priority", &state.pause_priority)
            .field("dispatch_count", &state.stats.dispatch_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionCriteria, handler};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tree_links() {
        let root = Event::new();
        let child = root.child();
        let grandchild = child.child();

        assert!(root.parent().is_none());
        assert_eq!(child.parent(), Some(root.clone()));
        assert_eq!(grandchild.parent(), Some(child.clone()));
        assert_eq!(root.children(), vec![child.clone()]);

        let mut visited = Vec::new();
        root.walk(&mut |e| visited.push(e.id()));
        assert_eq!(visited, vec![root.id(), child.id(), grandchild.id()]);
    }

    #[test]
    fn test_child_does_not_keep_parent_alive() {
        let root = Event::new();
        let child = root.child();
        drop(root);
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_connect_and_disconnect_roundtrip() {
        let event = Event::new();
        let a = event.connect(ConnectOptions::new(|_, _| {}).with_priority(2));
        let b = event.connect(ConnectOptions::new(|_, _| {}).with_priority(7));

        assert_eq!(event.highest_priority(), Some(7));
        assert_eq!(event.priority_order(), vec![2, 7]);

        assert_eq!(event.disconnect(&b), 1);
        assert_eq!(event.highest_priority(), Some(2));
        assert_eq!(event.disconnect(a), 1);
        assert_eq!(event.connection_count(), 0);
        assert_eq!(event.highest_priority(), None);
    }

    #[test]
    fn test_default_disconnect_clears_priority_zero_and_below() {
        let event = Event::new();
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(0));
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(-2));
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(3));

        assert_eq!(event.disconnect(DisconnectFilter::default()), 2);
        assert_eq!(event.priority_order(), vec![3]);
    }

    #[test]
    fn test_disconnect_all_walks_subtree() {
        let shared = handler(|_, _| {});
        let root = Event::new();
        let child = root.child();
        root.connect(ConnectOptions::from_handler(Arc::clone(&shared)).with_name("x"));
        child.connect(ConnectOptions::from_handler(Arc::clone(&shared)).with_name("x"));
        child.connect(ConnectOptions::new(|_, _| {}).with_name("y"));

        let removed = root.disconnect_all(ConnectionCriteria::new().with_handler(shared));
        assert_eq!(removed, 2);
        assert_eq!(root.connection_count(), 0);
        assert_eq!(child.connection_count(), 1);
    }

    #[test]
    fn test_pause_clamps_and_resume_restores() {
        let event = Event::new();
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(0));
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(4));

        assert_eq!(event.pause(10), 4);
        assert_eq!(event.pause(-7), NOT_PAUSED);
        assert_eq!(event.pause(PauseOptions::default()), 0);
        assert!(!event.is_listening());

        assert_eq!(event.resume(), NOT_PAUSED);
        assert_eq!(event.resume(), 4);
        assert_eq!(event.resume(), NOT_PAUSED);
        assert_eq!(event.resume(), NOT_PAUSED);
        assert!(event.is_listening());
    }

    #[test]
    fn test_pause_with_only_negative_priorities() {
        let event = Event::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for priority in [-5, -2] {
            let calls = Arc::clone(&calls);
            event.connect(
                ConnectOptions::new(move |_, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                })
                .with_priority(priority),
            );
        }

        assert_eq!(event.pause(0), NOT_PAUSED);
        assert!(event.is_listening());
        event.fire(&[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pause_by_named_priority() {
        let event = Event::new();
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(ConnectionPriority::Factory));
        assert_eq!(event.pause(ConnectionPriority::Strong), 1);
    }

    #[test]
    fn test_pause_history_is_bounded() {
        let event = Event::new();
        event.connect(ConnectOptions::new(|_, _| {}).with_priority(200));
        for priority in 0..100 {
            event.pause(priority);
        }
        assert_eq!(event.read().pause_history.len(), MAX_PAUSE_DEPTH);

        // Newest saved threshold comes back first.
        assert_eq!(event.resume(), 98);
        for _ in 1..MAX_PAUSE_DEPTH {
            event.resume();
        }
        assert_eq!(event.pause_priority(), 35);
        assert_eq!(event.resume(), NOT_PAUSED);
    }

    #[test]
    fn test_pause_on_empty_registry_stays_listening() {
        let event = Event::new();
        assert_eq!(event.pause(3), NOT_PAUSED);
        assert!(event.is_listening());
    }

    #[test]
    fn test_pause_all_and_resume_all() {
        let root = Event::new();
        let child = root.child();
        for e in [&root, &child] {
            e.connect(ConnectOptions::new(|_, _| {}).with_priority(1));
        }

        root.pause_all(1);
        assert_eq!(root.pause_priority(), 1);
        assert_eq!(child.pause_priority(), 1);

        root.resume_all();
        assert!(root.is_listening());
        assert!(child.is_listening());
    }

    #[test]
    fn test_disable_enable() {
        let event = Event::new();
        assert!(event.disable());
        assert!(event.is_disabled_one());
        assert!(!event.disable());
        assert!(!event.enable_all());
        assert!(event.enable());
        assert_eq!(event.state(), LifecycleState::Listening);
        assert!(!event.enable());
    }

    #[test]
    fn test_disable_all_counts_descendants() {
        let root = Event::new();
        let child = root.child();
        let grandchild = child.child();

        assert!(root.disable_all());
        assert!(root.is_disabled_all());
        assert_eq!(root.ancestor_disable_count(), 0);
        assert_eq!(child.ancestor_disable_count(), 1);
        assert_eq!(grandchild.ancestor_disable_count(), 1);

        assert!(child.disable_all());
        assert_eq!(grandchild.ancestor_disable_count(), 2);

        let late = child.child();
        assert_eq!(late.ancestor_disable_count(), 2);

        assert!(root.enable_all());
        assert_eq!(child.ancestor_disable_count(), 0);
        assert_eq!(grandchild.ancestor_disable_count(), 1);
        assert_eq!(late.ancestor_disable_count(), 1);

        assert!(child.enable_all());
        assert_eq!(grandchild.ancestor_disable_count(), 0);
        assert_eq!(late.ancestor_disable_count(), 0);
    }

    #[test]
    fn test_validate_next_dispatch_callbacks() {
        let event = Event::new();
        let mut rejected = None;
        let admitted = event
            .validate_next_dispatch(CaseHandler::new().on_rejected(|s| rejected = Some(s)));
        assert!(!admitted);
        assert_eq!(rejected, Some(DispatchStatus::NoConnection));

        let mut ready = None;
        let admitted = event.validate_next_dispatch(
            CaseHandler::new()
                .on_ready(|s| ready = Some(s))
                .with_settings(SettingsOverrides::new().with_requires_connection(false)),
        );
        assert!(admitted);
        assert_eq!(ready, Some(DispatchStatus::AllListening));
    }

    #[test]
    fn test_settings_toggles() {
        let event = Event::new();
        event.set_ghost();
        assert!(event.settings().ghost);
        event.unset_ghost();
        assert!(!event.settings().ghost);

        event.disable_listeners();
        assert!(!event.settings().dispatch_self);
        event.enable_listeners();
        assert!(event.settings().dispatch_self);
    }

    #[test]
    fn test_link_and_unlink() {
        let a = Event::new();
        let b = Event::new();
        a.link(&b);
        assert_eq!(a.settings().live_linked_events(), vec![b.clone()]);
        assert!(a.unlink(&b));
        assert!(!a.unlink(&b));
        assert!(a.settings().live_linked_events().is_empty());
    }
}
