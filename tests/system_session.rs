//! Tests for the shared system session and broker availability.

mod common;

use std::time::Duration;

use common::{RelayHarness, default_config, wait_until_available};
use stomp_relay::{
    RelayError,
    session::SYSTEM_SESSION_ID,
    StompCommand,
    frame::{HEART_BEAT, LOGIN},
};
use stomp_relay_testing::{client_connect, client_send};

#[tokio::test]
async fn system_session_announces_itself_with_system_credentials() {
    let (transport, mut brokers) = stomp_relay_testing::mock_transport();
    let config = default_config()
        .system_credentials("sys", "sys-secret")
        .system_heartbeat(5_000, 0)
        .build()
        .expect("valid config");
    let (relay, _to_clients) = stomp_relay::StompBrokerRelay::with_transport(config, transport);
    relay.start();

    let mut system = brokers.accept().await;
    let connect = system.accept_connect("0,0").await;
    assert_eq!(connect.header(LOGIN), Some("sys"));
    assert_eq!(connect.header(HEART_BEAT), Some("5000,0"));
    wait_until_available(&relay, true).await;
    assert!(relay.session(SYSTEM_SESSION_ID).is_some());

    relay.shutdown().await;
}

#[tokio::test]
async fn session_less_send_uses_system_session() {
    let mut harness = RelayHarness::start(default_config()).await;

    harness
        .relay
        .handle_message(client_send(None, "/queue/server", "broadcast"))
        .await
        .expect("SEND written by the system session");

    let send = harness.system.expect_frame(StompCommand::Send).await;
    assert_eq!(send.destination(), Some("/queue/server"));
    assert_eq!(&send.body()[..], b"broadcast");
    assert_eq!(harness.relay.client_session_count(), 0);
}

#[tokio::test]
async fn lost_system_session_is_reestablished() {
    let mut harness = RelayHarness::start(default_config()).await;
    let mut events = harness.relay.subscribe_availability();
    events.borrow_and_update();

    harness.transport.refuse_connections(true);
    harness.system.close();
    wait_until_available(&harness.relay, false).await;

    let err = harness
        .relay
        .handle_message(client_connect("s1", "0,0"))
        .await
        .expect_err("broker unavailable");
    assert!(matches!(err, RelayError::BrokerUnavailable));
    let err = harness
        .relay
        .handle_message(client_send(None, "/queue/a", "x"))
        .await
        .expect_err("broker unavailable");
    assert!(matches!(err, RelayError::BrokerUnavailable));

    let refused_from = harness.transport.attempts();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.transport.attempts() > refused_from, "reconnect keeps retrying");

    harness.transport.refuse_connections(false);
    let mut system = harness.brokers.accept().await;
    system.accept_connect("0,0").await;
    wait_until_available(&harness.relay, true).await;

    assert!(events.has_changed().expect("relay alive"));
    assert!(events.borrow_and_update().available);
    harness
        .relay
        .handle_message(client_connect("s1", "0,0"))
        .await
        .expect("CONNECT accepted again");
}

#[tokio::test]
async fn lost_system_session_after_error_marks_broker_unavailable() {
    let harness = RelayHarness::start(default_config()).await;
    let RelayHarness {
        relay,
        mut system,
        transport,
        ..
    } = harness;
    transport.refuse_connections(true);

    system
        .send(
            &stomp_relay::Frame::builder(StompCommand::Error)
                .header("message", "access refused")
                .build(),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(relay.is_broker_available(), "an ERROR frame alone keeps the session");
    system.close();

    wait_until_available(&relay, false).await;
    assert!(!relay.is_broker_available());
    relay.shutdown().await;
}

#[tokio::test]
async fn client_cannot_claim_system_session_id() {
    let mut harness = RelayHarness::start(default_config()).await;
    let system_id = harness
        .relay
        .session(SYSTEM_SESSION_ID)
        .expect("system session registered")
        .connection_id();

    let err = harness
        .relay
        .handle_message(client_connect(SYSTEM_SESSION_ID, "0,0"))
        .await
        .expect_err("reserved session id");
    assert!(matches!(err, RelayError::ReservedSessionId { .. }));
    let err = harness
        .relay
        .handle_message(client_send(Some(SYSTEM_SESSION_ID), "/queue/a", "x"))
        .await
        .expect_err("reserved session id");
    assert!(matches!(err, RelayError::ReservedSessionId { .. }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.brokers.try_accept().is_none(), "no broker connection opened");
    assert!(harness.relay.is_broker_available());
    let current = harness
        .relay
        .session(SYSTEM_SESSION_ID)
        .expect("system session still registered");
    assert_eq!(current.connection_id(), system_id);
    assert_eq!(current.kind(), stomp_relay::SessionKind::System);
}
