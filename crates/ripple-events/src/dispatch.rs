//! Propagation engine: admission, phases, and the per-dispatch context.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, debug_span, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::id::EventId;
use crate::node::Event;
use crate::settings::{DispatchPhase, EventSettings, SettingsOverrides};
use crate::status::{DispatchStatus, evaluate};
use crate::waiter::settle;

/// One node visited during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchVisit {
    /// The visited event.
    pub event: EventId,
    /// Phase that reached the event; `None` for the catalyst itself.
    pub via: Option<DispatchPhase>,
    /// Distance from the catalyst in propagation steps.
    pub depth: usize,
    /// Result of the admission check.
    pub status: DispatchStatus,
}

/// Every node a dispatch visited, in visiting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    catalyst: EventId,
    visits: Vec<DispatchVisit>,
}

impl DispatchReport {
    /// The event the dispatch started on.
    #[must_use]
    pub fn catalyst(&self) -> EventId {
        self.catalyst
    }

    /// Visits in order; the first one is the catalyst.
    #[must_use]
    pub fn visits(&self) -> &[DispatchVisit] {
        &self.visits
    }

    /// Admission status of the catalyst.
    #[must_use]
    pub fn status(&self) -> Option<DispatchStatus> {
        self.visits.first().map(|v| v.status)
    }

    /// Whether the catalyst was admitted.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        self.status().is_some_and(DispatchStatus::is_admitted)
    }

    /// Status of the first visit of `event`, if it was visited.
    #[must_use]
    pub fn status_of(&self, event: &Event) -> Option<DispatchStatus> {
        let id = event.id();
        self.visits.iter().find(|v| v.event == id).map(|v| v.status)
    }

    /// Number of admitted visits.
    #[must_use]
    pub fn admitted_count(&self) -> usize {
        self.visits.iter().filter(|v| v.status.is_admitted()).count()
    }

    /// Visits that were rejected.
    pub fn rejections(&self) -> impl Iterator<Item = &DispatchVisit> {
        self.visits.iter().filter(|v| v.status.is_rejected())
    }
}

/// State shared by every node visit of one top-level dispatch.
///
/// Never stored on a node; a handler that fires another event starts a new
/// context.
struct DispatchContext<'a> {
    catalyst: Event,
    args: &'a [Value],
    /// Overrides applied at every node below the catalyst.
    shared: SettingsOverrides,
    /// Catalyst plus the linked events currently being dispatched.
    in_flight: HashSet<EventId>,
    visits: Vec<DispatchVisit>,
}

impl<'a> DispatchContext<'a> {
    fn new(catalyst: &Event, args: &'a [Value], overrides: &SettingsOverrides) -> Self {
        // Linked targets come from each node's own settings; forwarding an
        // explicit link list would link every target to itself.
        let shared = SettingsOverrides {
            linked_events: None,
            ..overrides.clone()
        };
        Self {
            catalyst: catalyst.clone(),
            args,
            shared,
            in_flight: HashSet::from([catalyst.id()]),
            visits: Vec::new(),
        }
    }

    fn into_report(self) -> DispatchReport {
        DispatchReport {
            catalyst: self.catalyst.id(),
            visits: self.visits,
        }
    }
}

impl Event {
    /// Dispatch with this event's own settings.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if a visited node enables both ascendant
    /// and descendant propagation, or if linked events form a cycle.
    pub fn fire(&self, args: &[Value]) -> DispatchResult<DispatchReport> {
        self.dispatch(args, &SettingsOverrides::default())
    }

    /// Dispatch this event and its whole subtree.
    ///
    /// # Errors
    ///
    /// See [`fire`](Self::fire).
    pub fn fire_all(&self, args: &[Value]) -> DispatchResult<DispatchReport> {
        self.dispatch(args, &SettingsOverrides::new().with_dispatch_descendants(true))
    }

    /// Dispatch with `overrides` layered over the settings of every visited
    /// node for this call only.
    ///
    /// Rejections are reported in the returned [`DispatchReport`], not as
    /// errors. Handler panics unwind to the caller.
    ///
    /// # Errors
    ///
    /// See [`fire`](Self::fire). A fatal error aborts the remaining phases
    /// of every node in the dispatch.
    pub fn dispatch(
        &self,
        args: &[Value],
        overrides: &SettingsOverrides,
    ) -> DispatchResult<DispatchReport> {
        let span = debug_span!("dispatch", catalyst = %self.id());
        let _entered = span.enter();

        let mut context = DispatchContext::new(self, args, overrides);
        let settings = self.read().settings.merged(overrides);
        visit(self, settings, None, 0, &mut context)?;
        Ok(context.into_report())
    }
}

/// Settings of a node reached by propagation, locked to the direction it was
/// reached from.
///
/// A parent reached by bubbling keeps climbing regardless of its own
/// `dispatch_ascendants`.
fn effective_settings(event: &Event, via: DispatchPhase, shared: &SettingsOverrides) -> EventSettings {
    let mut settings = event.read().settings.merged(shared);
    match via {
        DispatchPhase::Descendant => settings.dispatch_ascendants = false,
        DispatchPhase::Ascendant => {
            settings.dispatch_ascendants = true;
            settings.dispatch_descendants = false;
        },
        DispatchPhase::Catalyst | DispatchPhase::Linked => {},
    }
    settings
}

/// Run the admission check and record an admitted dispatch.
///
/// Returns the status and the propagation flag the node had before, which
/// [`visit`] restores once the node's phases finish.
fn admit(event: &Event, settings: &EventSettings) -> (DispatchStatus, bool) {
    let mut state = event.write();
    let status = evaluate(&state.admission_view(), settings);
    let prior = state.propagating;
    if status.is_admitted() {
        state.stats.dispatch_count = state.stats.dispatch_count.saturating_add(1);
        state.stats.time_last_dispatched = Some(Utc::now());
        state.propagating = true;
    }
    (status, prior)
}

fn visit(
    event: &Event,
    settings: EventSettings,
    via: Option<DispatchPhase>,
    depth: usize,
    context: &mut DispatchContext<'_>,
) -> DispatchResult<()> {
    if settings.dispatch_ascendants && settings.dispatch_descendants {
        return Err(DispatchError::MutuallyExclusivePhases);
    }

    let (status, prior) = admit(event, &settings);
    context.visits.push(DispatchVisit {
        event: event.id(),
        via,
        depth,
        status,
    });

    if status.is_rejected() {
        debug!(event = %event.id(), %status, "Dispatch rejected");
        return Ok(());
    }
    trace!(event = %event.id(), %status, depth, "Dispatch admitted");

    let result = run_phases(event, &settings, depth.saturating_add(1), context);
    event.write().propagating = prior;
    result
}

fn run_phases(
    event: &Event,
    settings: &EventSettings,
    next: usize,
    context: &mut DispatchContext<'_>,
) -> DispatchResult<()> {
    for phase in settings.dispatch_order.iter() {
        match phase {
            DispatchPhase::Catalyst => run_self(event, settings, context),
            DispatchPhase::Linked => run_linked(settings, next, context)?,
            DispatchPhase::Descendant => run_descendants(event, settings, next, context)?,
            DispatchPhase::Ascendant => run_ascendant(event, settings, next, context)?,
        }
    }
    Ok(())
}

fn run_self(event: &Event, settings: &EventSettings, context: &DispatchContext<'_>) {
    if settings.dispatch_self && !settings.ghost {
        let connections = {
            let state = event.read();
            state.registry.dispatch_order(state.paused_threshold())
        };
        for connection in connections.iter().filter(|c| c.is_active()) {
            trace!(
                event = %event.id(),
                connection = %connection.id(),
                priority = connection.priority(),
                "Invoking handler"
            );
            connection.invoke(&context.catalyst, context.args);
        }
    }

    let waiters = event.write().waiters.take();
    if !waiters.is_empty() {
        let settled = settle(waiters, context.args);
        trace!(event = %event.id(), settled, "Waiters settled");
    }
}

fn run_linked(
    settings: &EventSettings,
    depth: usize,
    context: &mut DispatchContext<'_>,
) -> DispatchResult<()> {
    if !settings.dispatch_linked {
        return Ok(());
    }

    for weak in &settings.linked_events {
        let Some(linked) = weak.upgrade() else {
            trace!("Skipping dropped linked event");
            continue;
        };
        let id = linked.id();
        if !context.in_flight.insert(id) {
            return Err(DispatchError::CyclicLinkedEvents { event: id });
        }

        let linked_settings = effective_settings(&linked, DispatchPhase::Linked, &context.shared);
        let result = visit(
            &linked,
            linked_settings,
            Some(DispatchPhase::Linked),
            depth,
            context,
        );
        context.in_flight.remove(&id);
        result?;
    }
    Ok(())
}

fn run_descendants(
    event: &Event,
    settings: &EventSettings,
    depth: usize,
    context: &mut DispatchContext<'_>,
) -> DispatchResult<()> {
    if !settings.dispatch_descendants {
        return Ok(());
    }

    for child in event.children() {
        let child_settings = effective_settings(&child, DispatchPhase::Descendant, &context.shared);
        visit(
            &child,
            child_settings,
            Some(DispatchPhase::Descendant),
            depth,
            context,
        )?;
    }
    Ok(())
}

fn run_ascendant(
    event: &Event,
    settings: &EventSettings,
    depth: usize,
    context: &mut DispatchContext<'_>,
) -> DispatchResult<()> {
    // Only the catalyst can stop the climb.
    if !settings.dispatch_ascendants || !context.catalyst.is_propagating() {
        return Ok(());
    }
    let Some(parent) = event.parent() else {
        return Ok(());
    };

    let parent_settings = effective_settings(&parent, DispatchPhase::Ascendant, &context.shared);
    visit(
        &parent,
        parent_settings,
        Some(DispatchPhase::Ascendant),
        depth,
        context,
    )
}
