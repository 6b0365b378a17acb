//! Unit tests for relay configuration, availability and routing guards.

use std::{io, time::Duration};

use async_trait::async_trait;
use rstest::{fixture, rstest};

use super::{system::system_connect_frame, *};
use crate::{
    codec::ProtocolError,
    frame::{DESTINATION, Frame, HEART_BEAT},
    transport::BoxedBrokerStream,
};

/// Transport whose broker is never reachable.
struct Unreachable;

#[async_trait]
impl Transport for Unreachable {
    async fn connect(&self) -> io::Result<BoxedBrokerStream> {
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, "unreachable"))
    }
}

#[fixture]
fn relay() -> StompBrokerRelay {
    let config = RelayConfig::builder()
        .destination_prefixes(["/queue/"])
        .build()
        .expect("valid config");
    StompBrokerRelay::with_transport(config, Unreachable).0
}

fn connect(session_id: &str) -> RelayMessage {
    RelayMessage::new(Frame::builder(StompCommand::Connect).build()).with_session_id(session_id)
}

fn send(destination: &str) -> RelayMessage {
    RelayMessage::new(
        Frame::builder(StompCommand::Send)
            .header(DESTINATION, destination)
            .build(),
    )
}

#[test]
fn config_defaults() {
    let config = RelayConfig::builder().build().expect("defaults are valid");
    assert_eq!(config.relay_host(), "127.0.0.1");
    assert_eq!(config.relay_port(), 61613);
    assert_eq!(config.client_login(), "guest");
    assert_eq!(config.system_passcode(), "guest");
    assert_eq!(config.system_heartbeat_send_interval(), 10_000);
    assert_eq!(config.system_heartbeat_receive_interval(), 10_000);
    assert_eq!(config.heartbeat_multiplier(), 3);
    assert_eq!(config.decoder_buffer_limit(), 64 * 1024);
    assert_eq!(config.connected_frame_timeout(), Duration::from_secs(60));
    assert_eq!(config.reconnect().interval, Duration::from_secs(5));
    assert_eq!(config, RelayConfig::default());
}

#[rstest]
#[case(RelayConfig::builder().relay_host("  "), ConfigError::EmptyHost)]
#[case(RelayConfig::builder().relay_port(0), ConfigError::ZeroPort)]
#[case(RelayConfig::builder().heartbeat_multiplier(0), ConfigError::ZeroHeartbeatMultiplier)]
#[case(RelayConfig::builder().decoder_buffer_limit(0), ConfigError::ZeroBufferLimit)]
#[case(RelayConfig::builder().client_outbound_capacity(0), ConfigError::ZeroOutboundCapacity)]
fn config_rejects_invalid_settings(#[case] builder: RelayConfigBuilder, #[case] expected: ConfigError) {
    assert_eq!(builder.build(), Err(expected));
}

#[test]
fn config_normalizes_reconnect_interval() {
    let config = RelayConfig::builder()
        .reconnect(ReconnectConfig::fixed(Duration::ZERO))
        .build()
        .expect("valid config");
    assert_eq!(config.reconnect().interval, Duration::from_millis(1));
}

#[rstest]
#[case(&[][..], "/anything", true)]
#[case(&["/queue/"][..], "/queue/a", true)]
#[case(&["/queue/"][..], "/topic/bar", false)]
#[case(&["/queue/", "/topic/"][..], "/topic/bar", true)]
fn destination_prefix_filter(
    #[case] prefixes: &[&str],
    #[case] destination: &str,
    #[case] accepted: bool,
) {
    let config = RelayConfig::builder()
        .destination_prefixes(prefixes.iter().copied())
        .build()
        .expect("valid config");
    assert_eq!(config.accepts_destination(destination), accepted);
}

#[test]
fn system_connect_uses_system_credentials_and_heartbeats() {
    let config = RelayConfig::builder()
        .system_credentials("sys", "secret")
        .client_credentials("client", "pw")
        .system_heartbeat(5_000, 0)
        .virtual_host(Some("vhost".to_owned()))
        .build()
        .expect("valid config");

    let frame = system_connect_frame(&config);

    assert_eq!(frame.command(), Some(StompCommand::Connect));
    assert_eq!(frame.header(LOGIN), Some("sys"));
    assert_eq!(frame.header(PASSCODE), Some("secret"));
    assert_eq!(frame.header(HEART_BEAT), Some("5000,0"));
    assert_eq!(frame.header(HOST), Some("vhost"));
}

#[test]
fn availability_publishes_only_changes() {
    let availability = BrokerAvailability::new();
    let mut events = availability.subscribe();

    assert!(!availability.publish(false));
    assert!(!events.has_changed().expect("sender alive"));

    assert!(availability.publish(true));
    assert!(!availability.publish(true));
    assert!(events.has_changed().expect("sender alive"));
    assert!(events.borrow_and_update().available);
    assert!(availability.is_available());
}

#[rstest]
#[tokio::test]
async fn connect_while_unavailable_is_rejected(relay: StompBrokerRelay) {
    let err = relay
        .handle_message(connect("s1"))
        .await
        .expect_err("broker unavailable");
    assert!(matches!(err, RelayError::BrokerUnavailable));
    assert_eq!(relay.stats().snapshot().connect, 0);
}

#[rstest]
#[tokio::test]
async fn session_less_while_unavailable_is_rejected(relay: StompBrokerRelay) {
    let err = relay
        .handle_message(send("/queue/a"))
        .await
        .expect_err("broker unavailable");
    assert!(matches!(err, RelayError::BrokerUnavailable));
}

#[rstest]
#[tokio::test]
async fn session_traffic_while_unavailable_is_dropped(relay: StompBrokerRelay) {
    relay
        .handle_message(send("/queue/a").with_session_id("s1"))
        .await
        .expect("dropped without error");
    assert!(relay.session("s1").is_none());
}

#[rstest]
#[tokio::test]
async fn invalid_frame_is_reported(relay: StompBrokerRelay) {
    relay.availability.publish(true);
    let message = RelayMessage::new(Frame::builder(StompCommand::Send).build()).with_session_id("s1");

    let err = relay.handle_message(message).await.expect_err("missing destination");
    assert!(matches!(
        err,
        RelayError::Protocol(ProtocolError::MissingHeader {
            header: DESTINATION,
            ..
        })
    ));
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn reserved_session_id_is_rejected(relay: StompBrokerRelay, #[case] available: bool) {
    relay.availability.publish(available);

    let err = relay
        .handle_message(connect(SYSTEM_SESSION_ID))
        .await
        .expect_err("reserved id");
    assert!(matches!(err, RelayError::ReservedSessionId { .. }), "{err}");
    assert_eq!(relay.stats().snapshot().connect, 0);
    assert!(relay.session(SYSTEM_SESSION_ID).is_none());
}

#[rstest]
#[tokio::test]
async fn client_session_count_skips_system_entry(relay: StompBrokerRelay) {
    assert_eq!(relay.client_session_count(), 0);
    relay.start();

    tokio::time::timeout(Duration::from_secs(1), async {
        while relay.session(SYSTEM_SESSION_ID).is_none() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("system session registered");
    assert_eq!(relay.client_session_count(), 0);
    relay.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn session_less_non_send_is_ignored(relay: StompBrokerRelay) {
    relay.availability.publish(true);
    let subscribe = RelayMessage::new(
        Frame::builder(StompCommand::Subscribe)
            .header(DESTINATION, "/queue/a")
            .header("id", "0")
            .build(),
    );

    relay.handle_message(subscribe).await.expect("ignored");
    assert_eq!(relay.client_session_count(), 0);
}

#[rstest]
#[tokio::test]
async fn unknown_session_is_ignored(relay: StompBrokerRelay) {
    relay.availability.publish(true);
    relay
        .handle_message(send("/queue/a").with_session_id("nobody"))
        .await
        .expect("ignored");
}

#[rstest]
#[tokio::test]
async fn shutdown_marks_relay_stopped(relay: StompBrokerRelay) {
    relay.start();
    assert!(relay.is_running());

    relay.shutdown().await;

    assert!(!relay.is_running());
    assert!(!relay.is_broker_available());
    relay.start();
    assert!(!relay.is_running(), "a stopped relay stays stopped");
}
