//! End-to-end propagation through event trees.
//!
//! Covers descendant and ascendant walks, stop-propagation, linked events
//! and the fatal configuration errors.

use serde_json::json;

use ripple_events::prelude::*;
use ripple_test::{CountingHandler, RecordingHandler, event_chain, event_with_children};

#[test]
fn test_fire_all_reaches_child_once_and_fire_does_not() {
    let parent = Event::with_settings(SettingsOverrides::new().with_requires_connection(false));
    let child = parent.child_with_settings(SettingsOverrides::new().with_dispatch_descendants(true));
    let counter = CountingHandler::new();
    child.connect(counter.options());

    parent.fire(&[]).unwrap();
    assert_eq!(counter.count(), 0);

    let report = parent.fire_all(&[]).unwrap();
    assert_eq!(counter.count(), 1);
    assert_eq!(report.status_of(&child), Some(DispatchStatus::AllListening));
}

#[test]
fn test_unconnected_parent_stops_fire_all() {
    let parent = Event::new();
    let child = parent.child();
    let counter = CountingHandler::new();
    child.connect(counter.options());

    let report = parent.fire_all(&[]).unwrap();

    assert_eq!(report.status(), Some(DispatchStatus::NoConnection));
    assert_eq!(report.status_of(&child), None);
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_fire_all_walks_subtree_depth_first() {
    let recorder = RecordingHandler::new();
    let (root, children) = event_with_children(2);
    let grandchild = children[0].child();
    root.connect(recorder.options("root"));
    children[0].connect(recorder.options("a"));
    children[1].connect(recorder.options("b"));
    grandchild.connect(recorder.options("a1"));

    let report = root.fire_all(&[json!("go")]).unwrap();

    assert_eq!(recorder.labels(), ["root", "a", "a1", "b"]);
    assert_eq!(report.admitted_count(), 4);
    assert!(recorder.calls().iter().all(|call| call.catalyst == root.id()));
    assert!(recorder.calls().iter().all(|call| call.args == vec![json!("go")]));
}

#[test]
fn test_ascendant_dispatch_reaches_parent_once() {
    let parent = Event::new();
    let event = parent.child_with_settings(SettingsOverrides::new().with_dispatch_ascendants(true));
    let recorder = RecordingHandler::new();
    event.connect(recorder.options("event"));
    parent.connect(recorder.options("parent"));

    event.fire(&[]).unwrap();

    assert_eq!(recorder.labels(), ["event", "parent"]);
    assert_eq!(parent.dispatch_count(), 1);
}

#[test]
fn test_stop_propagating_blocks_ascendant_phase() {
    let parent = Event::new();
    let event = parent.child_with_settings(SettingsOverrides::new().with_dispatch_ascendants(true));
    let parent_hits = CountingHandler::new();
    parent.connect(parent_hits.options());
    event.connect_fn(|catalyst: &Event, _: &[serde_json::Value]| catalyst.stop_propagating());

    let report = event.fire(&[]).unwrap();

    assert_eq!(parent_hits.count(), 0);
    assert_eq!(report.visits().len(), 1);
    assert!(!event.is_propagating());
}

#[test]
fn test_ascendant_walk_climbs_chain_without_turning_back() {
    let chain = event_chain(4);
    let recorder = RecordingHandler::new();
    for (index, event) in chain.iter().enumerate() {
        event.connect(recorder.options(format!("level-{index}")));
    }
    // A sibling of the leaf must not be reached on the way up.
    let sibling = chain[2].child();
    sibling.connect(recorder.options("sibling"));

    chain[3]
        .dispatch(&[], &SettingsOverrides::new().with_dispatch_ascendants(true))
        .unwrap();

    assert_eq!(recorder.labels(), ["level-3", "level-2", "level-1", "level-0"]);
}

#[test]
fn test_bubbling_from_leaf_settings_reaches_grandparent() {
    let grandparent = Event::new();
    let parent = grandparent.child();
    let leaf = parent.child_with_settings(SettingsOverrides::new().with_dispatch_ascendants(true));
    let recorder = RecordingHandler::new();
    for (label, event) in [("leaf", &leaf), ("parent", &parent), ("grandparent", &grandparent)] {
        event.connect(recorder.options(label));
    }

    let report = leaf.fire(&[]).unwrap();

    assert_eq!(recorder.labels(), ["leaf", "parent", "grandparent"]);
    assert_eq!(report.admitted_count(), 3);
    assert_eq!(grandparent.dispatch_count(), 1);
}

#[test]
fn test_stopping_catalyst_mid_climb_spares_ancestors_above() {
    let grandparent = Event::new();
    let parent = grandparent.child();
    let leaf = parent.child_with_settings(SettingsOverrides::new().with_dispatch_ascendants(true));
    let grandparent_hits = CountingHandler::new();
    grandparent.connect(grandparent_hits.options());
    let parent_hits = CountingHandler::new();
    parent.connect(parent_hits.options());
    parent.connect_fn(|catalyst: &Event, _: &[serde_json::Value]| catalyst.stop_propagating());
    leaf.connect(CountingHandler::new().options());

    leaf.fire(&[]).unwrap();

    assert_eq!(parent_hits.count(), 1);
    assert_eq!(grandparent_hits.count(), 0);
    assert!(!leaf.is_propagating());
}

#[test]
fn test_both_directions_is_fatal() {
    let event = Event::new();
    event.connect(CountingHandler::new().options());

    let err = event
        .dispatch(
            &[],
            &SettingsOverrides::new()
                .with_dispatch_ascendants(true)
                .with_dispatch_descendants(true),
        )
        .unwrap_err();

    assert_eq!(err, DispatchError::MutuallyExclusivePhases);
    assert_eq!(event.dispatch_count(), 0);
}

#[test]
fn test_linked_events_run_in_link_order() {
    let recorder = RecordingHandler::new();
    let source = Event::new();
    let first = Event::new();
    let second = Event::new();
    source.connect(recorder.options("source"));
    first.connect(recorder.options("first"));
    second.connect(recorder.options("second"));
    source.link(&first);
    source.link(&second);

    source.fire(&[json!(1)]).unwrap();

    assert_eq!(recorder.labels(), ["source", "first", "second"]);
    assert!(recorder.calls().iter().all(|call| call.catalyst == source.id()));
}

#[test]
fn test_cyclic_links_abort_dispatch() {
    let a = Event::new();
    let b = Event::new();
    let a_hits = CountingHandler::new();
    let b_hits = CountingHandler::new();
    a.connect(a_hits.options());
    b.connect(b_hits.options());
    a.link(&b);
    b.link(&a);

    let err = a.fire(&[]).unwrap_err();

    assert_eq!(err, DispatchError::CyclicLinkedEvents { event: a.id() });
    assert_eq!(a_hits.count(), 1);
    assert_eq!(b_hits.count(), 1);
}

#[test]
fn test_shared_link_target_is_not_a_cycle() {
    let shared = Event::new();
    let hits = CountingHandler::new();
    shared.connect(hits.options());

    let (root, children) = event_with_children(2);
    root.connect(CountingHandler::new().options());
    for child in &children {
        child.connect(CountingHandler::new().options());
        child.link(&shared);
    }

    root.fire_all(&[]).unwrap();
    assert_eq!(hits.count(), 2);
}

#[test]
fn test_dropped_link_is_skipped() {
    let source = Event::new();
    source.connect(CountingHandler::new().options());
    {
        let target = Event::new();
        target.connect(CountingHandler::new().options());
        source.link(&target);
    }

    let report = source.fire(&[]).unwrap();
    assert_eq!(report.visits().len(), 1);
}

#[test]
fn test_custom_order_runs_descendants_first() {
    let recorder = RecordingHandler::new();
    let order = DispatchOrder::new([
        DispatchPhase::Descendant,
        DispatchPhase::Catalyst,
        DispatchPhase::Linked,
        DispatchPhase::Ascendant,
    ])
    .unwrap();
    let root = Event::with_settings(SettingsOverrides::new().with_dispatch_order(order));
    let child = root.child();
    root.connect(recorder.options("root"));
    child.connect(recorder.options("child"));

    root.fire_all(&[]).unwrap();

    assert_eq!(recorder.labels(), ["child", "root"]);
}

#[test]
fn test_reentrant_fire_starts_independent_dispatch() {
    let outer = Event::new();
    let inner = Event::new();
    let inner_hits = CountingHandler::new();
    inner.connect(inner_hits.options());
    // The inner event links back to the outer one; a nested fire must not see
    // the outer dispatch's in-flight set.
    inner.link(&outer);

    let nested = inner.clone();
    let fired = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let guard = std::sync::Arc::clone(&fired);
    outer.connect_fn(move |_: &Event, _: &[serde_json::Value]| {
        if !guard.swap(true, std::sync::atomic::Ordering::SeqCst) {
            nested.fire(&[]).unwrap();
        }
    });

    outer.fire(&[]).unwrap();
    assert_eq!(inner_hits.count(), 1);
    assert_eq!(outer.dispatch_count(), 2);
}
