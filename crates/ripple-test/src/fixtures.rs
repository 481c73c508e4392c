//! Test fixtures: recording handlers and event-tree builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use ripple_events::{ConnectOptions, Event, EventId, Handler, handler};

/// One handler invocation captured by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCall {
    /// Label of the handler that ran.
    pub label: String,
    /// Catalyst passed to the handler.
    pub catalyst: EventId,
    /// Arguments passed to the handler.
    pub args: Vec<Value>,
}

/// Shared log of handler invocations, in the order they ran.
///
/// Every handler produced by one recorder appends to the same log, so
/// handlers on different events can be compared for ordering.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<HandlerCall>>>,
}

impl RecordingHandler {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records calls under `label`.
    #[must_use]
    pub fn handler(&self, label: impl Into<String>) -> Handler {
        let calls = Arc::clone(&self.calls);
        let label = label.into();
        handler(move |catalyst: &Event, args: &[Value]| {
            calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(HandlerCall {
                    label: label.clone(),
                    catalyst: catalyst.id(),
                    args: args.to_vec(),
                });
        })
    }

    /// Connect options wrapping [`handler`](Self::handler).
    #[must_use]
    pub fn options(&self, label: impl Into<String>) -> ConnectOptions {
        ConnectOptions::from_handler(self.handler(label))
    }

    /// Every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Labels of the recorded calls, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.label).collect()
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Handler that only counts how often it ran.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler incrementing this counter.
    #[must_use]
    pub fn handler(&self) -> Handler {
        let count = Arc::clone(&self.count);
        handler(move |_: &Event, _: &[Value]| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Connect options wrapping [`handler`](Self::handler).
    #[must_use]
    pub fn options(&self) -> ConnectOptions {
        ConnectOptions::from_handler(self.handler())
    }

    /// Number of invocations so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// A root followed by `depth - 1` nested descendants, root first.
///
/// `event_chain(0)` is empty.
#[must_use]
pub fn event_chain(depth: usize) -> Vec<Event> {
    let mut chain: Vec<Event> = Vec::with_capacity(depth);
    for _ in 0..depth {
        let next = match chain.last() {
            Some(parent) => parent.child(),
            None => Event::new(),
        };
        chain.push(next);
    }
    chain
}

/// A root with `count` direct children.
#[must_use]
pub fn event_with_children(count: usize) -> (Event, Vec<Event>) {
    let root = Event::new();
    let children = (0..count).map(|_| root.child()).collect();
    (root, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_chain_links_parents() {
        let chain = event_chain(3);
        assert_eq!(chain.len(), 3);
        assert!(chain[0].parent().is_none());
        assert_eq!(chain[1].parent().unwrap(), chain[0]);
        assert_eq!(chain[2].parent().unwrap(), chain[1]);
        assert!(event_chain(0).is_empty());
    }

    #[test]
    fn test_recorder_shares_log_across_handlers() {
        let (root, children) = event_with_children(1);
        let recorder = RecordingHandler::new();
        root.connect(recorder.options("root"));
        children[0].connect(recorder.options("child"));

        children[0].fire(&[json!(7)]).unwrap();
        root.fire(&[]).unwrap();

        assert_eq!(recorder.labels(), ["child", "root"]);
        let calls = recorder.calls();
        assert_eq!(calls[0].catalyst, children[0].id());
        assert_eq!(calls[0].args, vec![json!(7)]);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_counting_handler() {
        let event = Event::new();
        let counter = CountingHandler::new();
        event.connect(counter.options());

        event.fire(&[]).unwrap();
        event.fire(&[]).unwrap();
        assert_eq!(counter.count(), 2);
    }
}
