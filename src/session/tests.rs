//! Unit tests for the session table, heartbeat negotiation and handles.

use std::{sync::Arc, time::Duration};

use rstest::rstest;
use tokio::sync::{mpsc, watch};

use super::*;
use crate::{command::StompCommand, frame::HeartBeat};

fn handle(session_id: &str, id: u64) -> (SessionHandle, watch::Sender<SessionState>) {
    let (requests, _) = mpsc::channel(1);
    let (state_tx, state) = watch::channel(SessionState::Unconnected);
    let handle = SessionHandle::new(
        Arc::from(session_id),
        SessionKind::Client,
        ConnectionId::new(id),
        requests,
        state,
    );
    (handle, state_tx)
}

#[test]
fn registry_remove_only_matches_owner() {
    let registry = SessionRegistry::new();
    let (first, _) = handle("s1", 1);
    let (second, _) = handle("s1", 2);

    assert!(registry.insert(first).is_none());
    let replaced = registry.insert(second).expect("first handle replaced");
    assert_eq!(replaced.connection_id(), ConnectionId::new(1));

    assert!(!registry.remove("s1", ConnectionId::new(1)));
    assert!(registry.contains("s1"));
    assert!(registry.remove("s1", ConnectionId::new(2)));
    assert!(!registry.remove("s1", ConnectionId::new(2)));
    assert!(registry.is_empty());
}

#[test]
fn registry_sessions_are_independent() {
    let registry = SessionRegistry::new();
    registry.insert(handle("a", 1).0);
    registry.insert(handle("b", 2).0);

    assert!(registry.remove("a", ConnectionId::new(1)));

    let remaining = registry.get("b").expect("b untouched");
    assert_eq!(remaining.connection_id(), ConnectionId::new(2));
    assert_eq!(registry.session_ids(), ["b"]);
}

#[test]
fn registry_drain_empties_table() {
    let registry = SessionRegistry::new();
    registry.insert(handle("a", 1).0);
    registry.insert(handle("b", 2).0);

    let mut drained: Vec<_> = registry
        .drain()
        .iter()
        .map(|h| h.session_id().to_owned())
        .collect();
    drained.sort();

    assert_eq!(drained, ["a", "b"]);
    assert!(registry.is_empty());
}

#[test]
fn connection_ids_are_unique() {
    let a = ConnectionId::next();
    let b = ConnectionId::next();
    assert_ne!(a, b);
    assert_eq!(ConnectionId::from(7).to_string(), "ConnectionId(7)");
}

#[rstest]
#[case((10_000, 10_000), (5_000, 0), None, Some(30_000))]
#[case((10_000, 10_000), (10_000, 10_000), Some(10_000), Some(30_000))]
#[case((0, 0), (10_000, 10_000), None, None)]
#[case((4_000, 0), (0, 6_000), Some(6_000), None)]
#[case((0, 2_000), (1_000, 0), None, Some(6_000))]
fn heartbeat_negotiation(
    #[case] client: (u64, u64),
    #[case] broker: (u64, u64),
    #[case] write: Option<u64>,
    #[case] read: Option<u64>,
) {
    let intervals = HeartbeatIntervals::negotiate(
        HeartBeat::new(client.0, client.1),
        HeartBeat::new(broker.0, broker.1),
        3,
    );
    assert_eq!(intervals.write, write.map(Duration::from_millis));
    assert_eq!(intervals.read, read.map(Duration::from_millis));
}

#[test]
fn zero_multiplier_is_treated_as_one() {
    let intervals =
        HeartbeatIntervals::negotiate(HeartBeat::new(0, 1_000), HeartBeat::new(1_000, 0), 0);
    assert_eq!(intervals.read, Some(Duration::from_millis(1_000)));
    assert!(!intervals.is_disabled());
}

#[test]
fn session_kinds_differ_only_in_capabilities() {
    assert!(SessionKind::Client.notifies_client());
    assert!(!SessionKind::Client.awaits_delivery());
    assert!(!SessionKind::System.notifies_client());
    assert!(SessionKind::System.awaits_delivery());
}

#[tokio::test]
async fn client_forward_to_closed_session_is_dropped() {
    let (handle, _state) = handle("gone", 9);

    handle
        .forward(crate::frame::Frame::builder(StompCommand::Disconnect).build())
        .await
        .expect("dropped silently");
}

#[tokio::test]
async fn wait_for_returns_last_state_when_actor_exits() {
    let (handle, state) = handle("s1", 3);
    state.send_replace(SessionState::TcpConnected);
    drop(state);

    let observed = handle.wait_for(SessionState::is_stomp_connected).await;
    assert_eq!(observed, SessionState::TcpConnected);
    assert_eq!(SessionState::Closed.to_string(), "CLOSED");
}
