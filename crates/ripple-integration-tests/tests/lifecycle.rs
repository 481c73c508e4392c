//! Registry, pause, disable and dispatch-limit behaviour across whole trees.

use std::cell::Cell;

use ripple_events::NOT_PAUSED;
use ripple_events::prelude::*;
use ripple_test::{CountingHandler, RecordingHandler, event_chain, setup_test_logging};

const PRIORITIES: [i32; 6] = [3, -2, 10, 0, 3, 7];

#[test]
fn test_priority_order_tracks_live_buckets() {
    let event = Event::new();
    let mut connections = Vec::new();
    let mut highest = i32::MIN;
    for priority in PRIORITIES {
        connections.push(event.connect(CountingHandler::new().options().with_priority(priority)));
        highest = highest.max(priority);
        assert_eq!(event.highest_priority(), Some(highest));
        let order = event.priority_order();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }
    assert_eq!(event.priority_order(), [-2, 0, 3, 7, 10]);

    for connection in &connections {
        event.disconnect(connection);
        let order = event.priority_order();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(event.highest_priority(), order.last().copied());
    }
    assert!(!event.has_connections());
    assert_eq!(event.highest_priority(), None);
}

#[test]
fn test_last_disconnect_removes_bucket() {
    let event = Event::new();
    let keep = event.connect(CountingHandler::new().options().with_priority(1));
    let removed = event.connect(CountingHandler::new().options().with_priority(4));
    assert_eq!(event.priority_order(), [1, 4]);

    assert_eq!(event.disconnect(&removed), 1);
    assert_eq!(event.priority_order(), [1]);
    assert_eq!(event.disconnect(&keep), 1);
    assert!(event.priority_order().is_empty());
    assert_eq!(event.disconnect(&keep), 0);
}

#[test]
fn test_pause_splits_handlers_at_threshold() {
    for threshold in -1..=3 {
        let event = Event::new();
        let recorder = RecordingHandler::new();
        for priority in 0..=3 {
            event.connect(recorder.options(priority.to_string()).with_priority(priority));
        }

        event.pause(threshold);
        let report = event.fire(&[]).unwrap();

        let expected: Vec<String> = (0..=3)
            .rev()
            .filter(|priority| *priority > threshold)
            .map(|priority: i32| priority.to_string())
            .collect();
        assert_eq!(recorder.labels(), expected, "threshold {threshold}");
        if threshold >= 3 {
            assert_eq!(report.status(), Some(DispatchStatus::PriorityPaused));
        }
    }
}

#[test]
fn test_resume_restores_previous_threshold() {
    let event = Event::new();
    for priority in 0..=5 {
        event.connect(CountingHandler::new().options().with_priority(priority));
    }

    assert_eq!(event.pause(2), 2);
    assert_eq!(event.pause(99), 5);
    assert_eq!(event.resume(), 2);
    assert_eq!(event.resume(), NOT_PAUSED);
    assert_eq!(event.resume(), NOT_PAUSED);
    assert!(event.fire(&[]).unwrap().is_admitted());
}

#[test]
fn test_pause_all_and_resume_all_cover_subtree() {
    let chain = event_chain(3);
    let counter = CountingHandler::new();
    for event in &chain {
        event.connect(counter.options().with_priority(1));
    }

    chain[0].pause_all(1);
    let report = chain[0].fire_all(&[]).unwrap();
    assert_eq!(report.status(), Some(DispatchStatus::PriorityPaused));
    assert_eq!(chain[2].pause_priority(), 1);

    chain[0].resume_all();
    chain[0].fire_all(&[]).unwrap();
    assert_eq!(counter.count(), 3);
}

#[test]
fn test_paused_connection_is_skipped_but_kept() {
    let event = Event::new();
    let recorder = RecordingHandler::new();
    let muted = event.connect(recorder.options("muted"));
    event.connect(recorder.options("live"));

    muted.pause();
    event.fire(&[]).unwrap();
    muted.resume();
    event.fire(&[]).unwrap();

    assert_eq!(recorder.labels(), ["live", "muted", "live"]);
    assert_eq!(event.connection_count(), 2);
}

#[test]
fn test_dispatch_limit_admits_exactly_n() {
    for limit in 0..4_u64 {
        let event = Event::with_settings(SettingsOverrides::new().with_dispatch_limit(limit));
        let counter = CountingHandler::new();
        event.connect(counter.options());

        let mut admitted: u64 = 0;
        for _ in 0..6 {
            let report = event.fire(&[]).unwrap();
            if report.is_admitted() {
                admitted = admitted.saturating_add(1);
            } else {
                assert_eq!(report.status(), Some(DispatchStatus::DispatchLimitReached));
            }
        }

        assert_eq!(admitted, limit);
        assert_eq!(event.dispatch_count(), limit);
        assert_eq!(event.time_last_dispatched().is_some(), limit > 0);
    }
}

#[test]
fn test_ghost_does_not_override_disable() {
    let event = Event::new();
    event.disable();

    let ghost = SettingsOverrides::new().with_ghost(true);
    let report = event.dispatch(&[], &ghost).unwrap();
    assert_eq!(report.status(), Some(DispatchStatus::Disabled));

    event.enable();
    let report = event.dispatch(&[], &ghost).unwrap();
    assert_eq!(report.status(), Some(DispatchStatus::Ghost));
    assert_eq!(event.dispatch_count(), 1);
}

#[test]
fn test_ghost_bypasses_connection_and_pause_checks() {
    let parent = Event::with_settings(SettingsOverrides::new().with_ghost(true));
    let child = parent.child();
    let counter = CountingHandler::new();
    parent.connect(counter.options());
    child.connect(counter.options());
    parent.pause(0);

    let report = parent.fire_all(&[]).unwrap();

    assert_eq!(report.status(), Some(DispatchStatus::Ghost));
    assert_eq!(counter.count(), 1, "ghost skips its own handlers");
    assert_eq!(report.status_of(&child), Some(DispatchStatus::AllListening));
}

#[test]
fn test_disable_all_rejects_grandchild_until_enable_all() {
    setup_test_logging("ripple_events=debug");
    let chain = event_chain(3);
    let counter = CountingHandler::new();
    chain[2].connect(counter.options());

    assert!(chain[0].disable_all());
    let report = chain[2].fire(&[]).unwrap();
    assert_eq!(report.status(), Some(DispatchStatus::DisabledByAncestor));
    assert_eq!(counter.count(), 0);

    assert!(chain[0].enable_all());
    let report = chain[2].fire(&[]).unwrap();
    assert_eq!(report.status(), Some(DispatchStatus::AllListening));
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_nested_disable_all_needs_both_enables() {
    let chain = event_chain(3);
    chain[2].connect(CountingHandler::new().options());

    chain[0].disable_all();
    chain[1].disable_all();
    assert_eq!(chain[2].ancestor_disable_count(), 2);

    chain[0].enable_all();
    assert_eq!(
        chain[2].fire(&[]).unwrap().status(),
        Some(DispatchStatus::DisabledByAncestor)
    );
    chain[1].enable_all();
    assert!(chain[2].fire(&[]).unwrap().is_admitted());
}

#[test]
fn test_repeated_disable_is_soft_noop() {
    setup_test_logging("ripple_events=warn");
    let event = Event::new();

    assert!(event.disable());
    assert!(!event.disable());
    assert!(!event.enable_all());
    assert!(event.is_disabled_one());
    assert!(event.enable());
    assert!(!event.enable());
    assert!(event.is_enabled());
}

#[test]
fn test_validate_next_dispatch_does_not_consume_limit() {
    let event = Event::with_settings(SettingsOverrides::new().with_dispatch_limit(1));
    event.connect(CountingHandler::new().options());

    let ready = Cell::new(None);
    let admitted = event.validate_next_dispatch(
        CaseHandler::new().on_ready(|status| ready.set(Some(status))),
    );
    assert!(admitted);
    assert_eq!(ready.get(), Some(DispatchStatus::AllListening));
    assert_eq!(event.dispatch_count(), 0);

    event.fire(&[]).unwrap();
    let rejected = Cell::new(None);
    let admitted = event.validate_next_dispatch(
        CaseHandler::new()
            .on_ready(|_| panic!("limit reached"))
            .on_rejected(|status| rejected.set(Some(status))),
    );
    assert!(!admitted);
    assert_eq!(rejected.get(), Some(DispatchStatus::DispatchLimitReached));

    let relaxed = event.validate_next_dispatch(
        CaseHandler::new().with_settings(SettingsOverrides::new().with_unbounded_dispatch()),
    );
    assert!(relaxed);
}
