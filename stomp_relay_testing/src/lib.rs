//! Utilities for driving a [`StompBrokerRelay`](stomp_relay::StompBrokerRelay)
//! against an in-memory broker during tests.
//!
//! [`mock_transport`] returns a [`Transport`](stomp_relay::Transport) that
//! hands the relay one end of a `tokio::io::duplex` pair per connection and
//! delivers the other end to the test as a scripted [`MockBroker`].
//!
//! ```rust,no_run
//! use stomp_relay::{RelayConfig, StompBrokerRelay};
//! use stomp_relay_testing::mock_transport;
//!
//! # async fn example() {
//! let (transport, mut brokers) = mock_transport();
//! let (relay, _to_clients) =
//!     StompBrokerRelay::with_transport(RelayConfig::default(), transport);
//! relay.start();
//! let mut system = brokers.accept().await;
//! system.accept_connect("0,0").await;
//! # }
//! ```

pub mod frames;
pub mod logging;
pub mod macros;
pub mod transport;

pub use frames::{
    broker_message,
    client_connect,
    client_disconnect,
    client_send,
    client_subscribe,
    connected_frame,
};
pub use logging::{LoggerHandle, logger};
pub use transport::{BrokerConnections, MockBroker, MockTransport, mock_transport};
