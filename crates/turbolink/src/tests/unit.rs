//! Unit coverage for the link state machine and dispatch.

use rstest::{fixture, rstest};
use serde_json::json;
use turbolink_config::CloseEventPolicy;

use super::support::ScriptedConnector;
use crate::{Link, LinkError, LinkOperation, LinkOptions, LinkStatus, UNSET_SEQUENCE};

const ADDRESS: &str = "tcp://127.0.0.1:3000";

struct Harness {
    link: Link,
    peer: ScriptedConnector,
}

impl Harness {
    fn with_options(options: LinkOptions) -> Self {
        let peer = ScriptedConnector::default();
        let link = Link::new(peer.clone(), options);
        Self { link, peer }
    }

    fn connect(&self) {
        self.link.open(ADDRESS);
        self.peer.accept();
        assert!(self.link.is_open(), "link should be open after accept");
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::with_options(LinkOptions::default())
}

#[fixture]
fn open_harness() -> Harness {
    let harness = harness();
    harness.connect();
    harness
}

#[rstest]
fn link_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Link>();
}

#[rstest]
fn connect_walks_through_statuses(harness: Harness) {
    assert_eq!(harness.link.link_status(), LinkStatus::Idle);

    harness.link.open(ADDRESS);
    assert_eq!(harness.link.link_status(), LinkStatus::Connecting);
    assert!(!harness.link.poll_connect_event());

    harness.peer.accept();
    assert_eq!(harness.link.link_status(), LinkStatus::Open);
    assert!(harness.link.poll_connect_event());
    assert!(!harness.link.poll_connect_event());
    assert_eq!(harness.peer.addresses(), vec![ADDRESS.to_owned()]);
}

#[rstest]
fn open_while_active_is_refused(open_harness: Harness) {
    let error = open_harness
        .link
        .try_open(ADDRESS)
        .expect_err("second open should be refused");

    assert!(matches!(
        error,
        LinkError::AlreadyActive {
            status: LinkStatus::Open
        }
    ));
    assert_eq!(open_harness.peer.addresses().len(), 1);
}

#[rstest]
fn refused_dial_leaves_link_closed(harness: Harness) {
    harness.peer.refuse_next("connection refused");

    let error = harness
        .link
        .try_open(ADDRESS)
        .expect_err("dial should fail");

    assert!(matches!(error, LinkError::Transport(_)));
    assert_eq!(harness.link.link_status(), LinkStatus::Closed);
    assert_eq!(harness.link.link_status().code(), 3);
}

#[rstest]
fn error_while_connecting_closes_link(harness: Harness) {
    harness.link.open(ADDRESS);
    harness.peer.fail("timed out");

    assert_eq!(harness.link.link_status(), LinkStatus::Closed);
}

#[rstest]
fn messages_before_open_are_ignored(harness: Harness) {
    harness.link.open(ADDRESS);
    harness.peer.deliver(r#"{"cmd":"early"}"#);
    harness.peer.accept();

    assert_eq!(harness.link.history_size(), 0);
    assert!(harness.link.socket_data().is_none());
}

#[rstest]
fn wait_for_registers_interest_first(open_harness: Harness) {
    assert!(!open_harness.link.wait_for("status"));
    assert_eq!(open_harness.link.sequence("status"), UNSET_SEQUENCE);
    assert!(open_harness.link.value("status").is_none());
}

#[rstest]
fn reply_is_latched_and_consumed(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(!link.wait_for("status"));

    open_harness.peer.deliver(r#"{"cmd":"status","val":"ok"}"#);

    assert!(link.wait_for("status"));
    assert!(!link.wait_for("status"));
    assert_eq!(link.value("status"), Some(json!({"cmd": "status", "val": "ok"})));
    assert_eq!(link.sequence("status"), 1);
}

#[rstest]
fn second_reply_is_lost_to_the_latch(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(!link.wait_for("x"));

    open_harness.peer.deliver(r#"{"cmd":"x","n":1}"#);
    open_harness.peer.deliver(r#"{"cmd":"x","n":2}"#);

    assert_eq!(link.value("x"), Some(json!({"cmd": "x", "n": 1})));
    assert!(link.wait_for("x"));
    assert!(!link.wait_for("x"));
    assert_eq!(link.sequence("x"), 1);
    assert_eq!(link.history_size(), 2);
}

#[rstest]
fn replies_without_interest_only_reach_history(open_harness: Harness) {
    open_harness.peer.deliver(r#"{"cmd":"status"}"#);

    assert!(!open_harness.link.wait_for("status"));
    assert_eq!(open_harness.link.history_size(), 1);
}

#[rstest]
fn numeric_tags_match_their_text(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(!link.wait_for("7"));

    open_harness.peer.deliver(r#"{"cmd":7}"#);

    assert!(link.wait_for("7"));
}

#[rstest]
fn history_tracks_packets_since_open(open_harness: Harness) {
    let link = &open_harness.link;
    for n in 1..=3 {
        open_harness.peer.deliver(&format!(r#"{{"n":{n}}}"#));
    }

    assert_eq!(link.history_size(), 3);
    assert_eq!(link.history_item(3), Some(json!({"n": 3})));
    assert_eq!(link.history_item(1), Some(json!({"n": 1})));
    assert!(link.history_item(0).is_none());
    assert!(link.history_item(4).is_none());
    assert_eq!(link.history(), vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);
    assert_eq!(
        link.history_json(),
        r#"{"1":{"n":1},"2":{"n":2},"3":{"n":3}}"#
    );
}

#[rstest]
fn clearing_history_keeps_latches(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(!link.wait_for("status"));
    open_harness.peer.deliver(r#"{"cmd":"status"}"#);

    link.clear_history();

    assert_eq!(link.history_size(), 0);
    assert!(link.wait_for("status"));
    open_harness.peer.deliver(r#"{"cmd":"other"}"#);
    assert_eq!(link.history_size(), 1);
}

#[rstest]
fn unparsable_packet_only_updates_snapshot(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(link.poll_packet_event());

    open_harness.peer.deliver("hello there");

    assert_eq!(link.socket_data(), Some(json!("hello there")));
    assert_eq!(link.history_size(), 0);
    assert!(!link.poll_packet_event());
}

#[rstest]
fn packet_event_rearms_per_packet(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(link.poll_packet_event());
    assert!(!link.poll_packet_event());

    open_harness.peer.deliver(r#"{"cmd":"tick"}"#);

    assert!(link.poll_packet_event());
    assert!(!link.poll_packet_event());
    assert_eq!(link.socket_data(), Some(json!({"cmd": "tick"})));
}

#[rstest]
fn listener_round_trip(open_harness: Harness) {
    let link = &open_harness.link;
    link.send_and_register("echo", "r1", r#"{"cmd":"echo","listener":"r1"}"#);
    assert!(!link.wait_for_listener("echo", "r1"));

    open_harness
        .peer
        .deliver(r#"{"cmd":"echo","listener":"r1","val":"hi"}"#);

    assert!(link.wait_for_listener("echo", "r1"));
    assert!(link.wait_for_listener("echo", "r1"), "listener polls do not consume");
    assert_eq!(
        link.listener_value("echo", "r1"),
        Some(json!({"cmd": "echo", "listener": "r1", "val": "hi"}))
    );
    assert_eq!(link.listener_sequence("echo", "r1"), 1);

    link.reset_listener("echo", "r1");
    assert!(!link.wait_for_listener("echo", "r1"));
    assert_eq!(link.listener_sequence("echo", "r1"), 1);
    assert_eq!(
        open_harness.peer.sent(),
        vec![r#"{"cmd":"echo","listener":"r1"}"#.to_owned()]
    );
}

#[rstest]
fn listeners_need_both_tags(open_harness: Harness) {
    let link = &open_harness.link;
    link.register_listener("echo", "r1");

    open_harness.peer.deliver(r#"{"cmd":"echo"}"#);
    open_harness.peer.deliver(r#"{"cmd":"echo","listener":"r2"}"#);

    assert!(!link.wait_for_listener("echo", "r1"));
    assert!(!link.wait_for_listener("echo", "r2"), "unregistered ids are not latched");
    assert_eq!(link.listener_sequence("echo", "r2"), UNSET_SEQUENCE);
}

#[rstest]
fn send_and_register_lowers_a_buffered_reply(open_harness: Harness) {
    let link = &open_harness.link;
    link.register_listener("echo", "r1");
    open_harness.peer.deliver(r#"{"cmd":"echo","listener":"r1","n":1}"#);
    assert!(link.wait_for_listener("echo", "r1"));

    link.send_and_register("echo", "r1", r#"{"cmd":"echo"}"#);
    assert!(!link.wait_for_listener("echo", "r1"));

    open_harness.peer.deliver(r#"{"cmd":"echo","listener":"r1","n":2}"#);
    assert!(link.wait_for_listener("echo", "r1"));
    assert_eq!(link.listener_sequence("echo", "r1"), 2);
}

#[rstest]
fn operations_degrade_when_not_open(harness: Harness) {
    let link = &harness.link;

    assert!(!link.wait_for("status"));
    link.register_listener("echo", "r1");
    link.send("ignored");
    link.send_and_register("echo", "r1", "ignored");

    assert!(!link.wait_for_listener("echo", "r1"));
    assert!(link.value("status").is_none());
    assert_eq!(link.listener_sequence("echo", "r1"), UNSET_SEQUENCE);
    assert!(harness.peer.sent().is_empty());
    assert!(matches!(
        link.try_send("ignored"),
        Err(LinkError::NotOpen {
            operation: LinkOperation::Send
        })
    ));
}

#[rstest]
fn send_surfaces_transport_refusals(open_harness: Harness) {
    let error = open_harness
        .link
        .try_send("two\nlines")
        .expect_err("newline should be refused");

    assert!(matches!(error, LinkError::Transport(_)));
    assert!(open_harness.link.is_open());
}

#[rstest]
fn close_is_idempotent(open_harness: Harness) {
    open_harness.link.close();
    open_harness.link.close();

    assert_eq!(open_harness.link.link_status(), LinkStatus::Closed);
    assert_eq!(
        open_harness.peer.closes(),
        vec![(1000, String::from("script closure"))]
    );
    assert!(matches!(
        open_harness.link.try_close(),
        Err(LinkError::NotOpen {
            operation: LinkOperation::Close
        })
    ));
}

#[rstest]
fn close_uses_configured_code_and_reason() {
    let harness = Harness::with_options(
        LinkOptions::default()
            .with_close_code(4001)
            .with_close_reason("done"),
    );
    harness.connect();

    harness.link.close();

    assert_eq!(harness.peer.closes(), vec![(4001, String::from("done"))]);
}

#[rstest]
fn teardown_forgets_session_state(open_harness: Harness) {
    let link = &open_harness.link;
    assert!(!link.wait_for("status"));
    open_harness.peer.deliver(r#"{"cmd":"status"}"#);
    assert!(link.poll_connect_event());

    open_harness.peer.hang_up();

    assert_eq!(link.link_status(), LinkStatus::Closed);
    assert_eq!(link.history_size(), 0);
    assert!(link.socket_data().is_none());
    assert!(link.value("status").is_none());
    assert_eq!(link.sequence("status"), UNSET_SEQUENCE);
}

#[rstest]
fn late_close_after_manual_close_is_ignored(open_harness: Harness) {
    let link = &open_harness.link;
    link.close();
    assert!(link.poll_close_event());

    open_harness.peer.hang_up();

    assert_eq!(link.link_status(), LinkStatus::Closed);
    assert!(!link.poll_close_event());
}

#[rstest]
fn error_while_open_tears_down(open_harness: Harness) {
    open_harness.peer.deliver(r#"{"n":1}"#);
    open_harness.peer.fail("connection reset");
    open_harness.peer.hang_up();

    assert_eq!(open_harness.link.link_status(), LinkStatus::Closed);
    assert_eq!(open_harness.link.history_size(), 0);
}

#[rstest]
fn is_open_notices_a_silent_transport_loss(open_harness: Harness) {
    open_harness.peer.lose_silently();
    assert_eq!(open_harness.link.link_status(), LinkStatus::Open);

    assert!(!open_harness.link.is_open());
    assert_eq!(open_harness.link.link_status(), LinkStatus::Closed);
}

#[rstest]
fn vanished_event_source_counts_as_close(open_harness: Harness) {
    open_harness.peer.forget_sink();

    assert_eq!(open_harness.link.link_status(), LinkStatus::Closed);
}

#[rstest]
fn reopening_starts_from_a_clean_slate(open_harness: Harness) {
    let link = &open_harness.link;
    open_harness.peer.deliver(r#"{"n":1}"#);
    link.close();

    link.open(ADDRESS);
    open_harness.peer.accept();

    assert!(link.is_open());
    assert_eq!(link.history_size(), 0);
    assert!(link.poll_connect_event());
    assert_eq!(open_harness.peer.addresses().len(), 2);
}

#[rstest]
fn close_event_fires_on_idle_link_by_default(harness: Harness) {
    assert!(harness.link.poll_close_event());
    assert!(!harness.link.poll_close_event());
}

#[rstest]
fn close_event_waits_for_a_real_disconnect() {
    let options = LinkOptions::default().with_close_event(CloseEventPolicy::OnDisconnect);
    let harness = Harness::with_options(options);

    assert!(!harness.link.poll_close_event(), "idle links never connected");
    harness.link.open(ADDRESS);
    harness.peer.fail("refused");
    assert!(!harness.link.poll_close_event(), "failed dials never opened");

    harness.link.open(ADDRESS);
    harness.peer.accept();
    assert!(!harness.link.poll_close_event());
    harness.peer.hang_up();

    assert!(harness.link.poll_close_event());
    assert!(!harness.link.poll_close_event());
}
