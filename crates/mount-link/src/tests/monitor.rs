//! Status collaborator pass-through.

use super::harness::{MockReply, TestHarness, HEARTBEAT_COMMAND};
use crate::axis::AxisStatus;
use crate::dispatcher::Dispatcher;
use crate::error::LinkError;
use crate::status::MountStatus;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn heartbeat_starts_with_dispatcher() {
    let h = TestHarness::new();

    assert!(h.monitor.is_started());
    assert!(!h.monitor.is_stopped());

    h.dispatcher.disconnect();
    assert!(h.monitor.is_stopped());
}

#[test]
fn transport_version_reaches_monitor() {
    let h = TestHarness::new();

    h.transport.announce_version("2.4");

    assert_eq!(h.monitor.versions(), vec!["2.4"]);
    assert_eq!(h.dispatcher.status().sws_version.as_deref(), Some("2.4"));
}

#[test]
fn status_updates_reach_registered_callback() {
    let h = TestHarness::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    // Before registration nothing is delivered and nothing breaks.
    h.monitor.push_status(MountStatus::default());

    let seen_clone = seen.clone();
    h.dispatcher.on_status_update(move |status: &MountStatus| {
        seen_clone.lock().push(status.clone());
    });

    let status = MountStatus {
        axes: vec![AxisStatus::Invalid],
        ..MountStatus::default()
    };
    h.monitor.push_status(status.clone());

    assert_eq!(*seen.lock(), vec![status]);
}

#[test]
fn later_callback_replaces_earlier() {
    let h = TestHarness::new();
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));

    let first_clone = first.clone();
    let second_clone = second.clone();
    h.dispatcher
        .on_status_update(move |_: &MountStatus| *first_clone.lock() += 1)
        .on_status_update(move |_: &MountStatus| *second_clone.lock() += 1);

    h.monitor.push_status(MountStatus::default());

    assert_eq!(*first.lock(), 0);
    assert_eq!(*second.lock(), 1);
}

/// The heartbeat's own queries go through the dispatcher's gate.
#[tokio::test]
async fn refresh_goes_through_dispatcher() {
    let h = TestHarness::new();

    let status = h.dispatcher.refresh_status().await.unwrap();

    assert!(status.updated_at.is_some());
    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].params["cmd_0"], HEARTBEAT_COMMAND);
    assert!(h.dispatcher.command_log().is_empty());
}

#[tokio::test]
async fn refresh_failure_is_propagated() {
    let h = TestHarness::new();
    h.transport.queue_reply(MockReply::Fail("no route".into()));

    let err = h.dispatcher.refresh_status().await.unwrap_err();
    assert!(matches!(err, LinkError::Transport(_)));
}

#[test]
fn dropped_dispatcher_silences_sink() {
    let h = TestHarness::new();
    let seen = Arc::new(Mutex::new(0));
    let seen_clone = seen.clone();
    h.dispatcher
        .on_status_update(move |_: &MountStatus| *seen_clone.lock() += 1);

    let monitor = h.monitor.clone();
    let dispatcher: Arc<Dispatcher> = h.dispatcher;
    drop(dispatcher);

    monitor.push_status(MountStatus::default());
    assert_eq!(*seen.lock(), 0);
}
