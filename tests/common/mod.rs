//! Shared fixtures for relay integration tests.
//!
//! [`RelayHarness`] starts a relay over an in-memory transport and completes
//! the system session handshake, so tests begin with the broker available.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::time::Duration;

use stomp_relay::{
    RelayConfig,
    RelayMessage,
    SessionState,
    StompBrokerRelay,
    relay::{ReconnectConfig, RelayConfigBuilder},
};
use stomp_relay_testing::{BrokerConnections, MockBroker, MockTransport, mock_transport, recv_expect};
use tokio::{sync::mpsc, time::timeout};

/// Running relay, its client channel and the broker side of its
/// connections.
pub struct RelayHarness {
    pub relay: StompBrokerRelay,
    pub to_clients: mpsc::Receiver<RelayMessage>,
    pub transport: MockTransport,
    pub brokers: BrokerConnections,
    pub system: MockBroker,
}

impl RelayHarness {
    /// Start a relay built from `builder` and connect its system session.
    pub async fn start(builder: RelayConfigBuilder) -> Self {
        let config = builder
            .reconnect(ReconnectConfig::fixed(Duration::from_millis(20)))
            .build()
            .expect("valid relay config");
        let (transport, mut brokers) = mock_transport();
        let (relay, to_clients) = StompBrokerRelay::with_transport(config, transport.clone());
        relay.start();

        let mut system = brokers.accept().await;
        system.accept_connect("0,0").await;
        wait_until_available(&relay, true).await;

        Self {
            relay,
            to_clients,
            transport,
            brokers,
            system,
        }
    }

    /// Open client session `session_id` and return its broker end once the
    /// client has seen `CONNECTED`.
    pub async fn connect_client(&mut self, session_id: &str) -> MockBroker {
        self.relay
            .handle_message(stomp_relay_testing::client_connect(session_id, "0,0"))
            .await
            .expect("CONNECT accepted");
        let mut broker = self.brokers.accept().await;
        broker.accept_connect("0,0").await;

        let connected = recv_expect!(self.to_clients.recv(), "CONNECTED for client");
        assert_eq!(connected.session_id(), Some(session_id));
        assert_eq!(connected.command(), Some(stomp_relay::StompCommand::Connected));
        broker
    }
}

/// Relay configuration used when a test has no special needs.
pub fn default_config() -> RelayConfigBuilder {
    RelayConfig::builder().client_credentials("relay-user", "relay-secret")
}

/// Wait up to one second for the relay to report `available`.
pub async fn wait_until_available(relay: &StompBrokerRelay, available: bool) {
    let mut events = relay.subscribe_availability();
    timeout(Duration::from_secs(1), events.wait_for(|e| e.available == available))
        .await
        .expect("availability did not change in time")
        .expect("relay dropped");
}

/// Wait up to one second for the session registered under `session_id` to
/// close.
pub async fn wait_until_closed(relay: &StompBrokerRelay, session_id: &str) {
    let Some(handle) = relay.session(session_id) else {
        return;
    };
    let state = timeout(Duration::from_secs(1), handle.wait_for(SessionState::is_closed))
        .await
        .expect("session did not close in time");
    assert_eq!(state, SessionState::Closed);
}
