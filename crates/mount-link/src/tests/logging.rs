//! Command history tests.
//!
//! Covered:
//! - Single sends are logged most recent first, with the caller's system flag
//! - Keyed batches are logged in batch order, ahead of older entries
//! - Unlogged batches, array sends and failed sends leave no trace

use super::harness::{MockReply, TestHarness};
use crate::command_log::LogOrigin;
use crate::dispatcher::LogMode;

#[tokio::test]
async fn single_sends_are_most_recent_first() {
    let h = TestHarness::new();

    for command in [":A#", ":B#", ":C#"] {
        h.dispatcher.send_command(command, false).await.unwrap();
    }

    assert_eq!(h.logged_commands(), vec![":C#", ":B#", ":A#"]);

    let log = h.dispatcher.command_log();
    assert_eq!(log[0].response, "ok::C#");
    assert!(log.iter().all(|e| e.origin == LogOrigin::Single && e.key.is_none()));
    assert!(log[0].date >= log[2].date);
}

#[tokio::test]
async fn single_send_records_system_flag() {
    let h = TestHarness::new();

    h.dispatcher.send_command(":GU#", true).await.unwrap();
    h.dispatcher.send_command(":Mn#", false).await.unwrap();

    let log = h.dispatcher.command_log();
    assert!(!log[0].system);
    assert!(log[1].system);
}

#[tokio::test]
async fn keyed_batch_is_logged_in_batch_order() {
    let h = TestHarness::new();
    h.transport.queue_reply(MockReply::Raw("1".into()));
    h.transport
        .queue_reply(MockReply::batch(&[("cmd_0", "12:00:00#"), ("cmd_1", "+45*00#")]));

    h.dispatcher.send_command(":Q#", true).await.unwrap();
    h.dispatcher
        .send_commands([("ra", ":GR#"), ("dec", ":GD#"), ("site", ":GM#")], LogMode::Log)
        .await
        .unwrap();

    assert_eq!(h.logged_commands(), vec![":GR#", ":GD#", ":GM#", ":Q#"]);

    let log = h.dispatcher.command_log();
    let keys: Vec<Option<&str>> = log.iter().map(|e| e.key.as_deref()).collect();
    assert_eq!(keys, vec![Some("ra"), Some("dec"), Some("site"), None]);

    assert_eq!(log[0].response, "12:00:00#");
    assert_eq!(log[1].response, "+45*00#");
    assert_eq!(log[2].response, "");
    assert!(log[..3].iter().all(|e| !e.system && e.origin == LogOrigin::Batch));
}

#[tokio::test]
async fn nolog_batch_leaves_log_untouched() {
    let h = TestHarness::new();

    let replies = h
        .dispatcher
        .send_commands([("ra", ":GR#")], LogMode::NoLog)
        .await
        .unwrap();

    assert_eq!(replies["ra"], "ok::GR#");
    assert!(h.dispatcher.command_log().is_empty());
}

#[tokio::test]
async fn array_sends_are_not_logged() {
    let h = TestHarness::new();

    h.dispatcher
        .send_command_array(&[":GXU1#", ":GXU2#"])
        .await
        .unwrap();

    assert!(h.dispatcher.command_log().is_empty());
}

#[tokio::test]
async fn failed_sends_are_not_logged() {
    let h = TestHarness::new();
    h.transport.queue_reply(MockReply::Fail("timeout".into()));
    h.transport.queue_reply(MockReply::Fail("timeout".into()));

    assert!(h.dispatcher.send_command(":GR#", false).await.is_err());
    assert!(h
        .dispatcher
        .send_commands([("dec", ":GD#")], LogMode::Log)
        .await
        .is_err());

    assert!(h.dispatcher.command_log().is_empty());
}

#[tokio::test]
async fn log_serializes_for_display() {
    let h = TestHarness::new();
    h.dispatcher
        .send_commands([("product", ":GVP#")], LogMode::Log)
        .await
        .unwrap();

    let json = serde_json::to_value(h.dispatcher.command_log()).unwrap();
    assert_eq!(json[0]["command"], ":GVP#");
    assert_eq!(json[0]["response"], "ok::GVP#");
    assert_eq!(json[0]["origin"], "batch");
    assert_eq!(json[0]["key"], "product");
    assert_eq!(json[0]["system"], false);
}
