#![doc(html_root_url = "https://docs.rs/stomp-relay/latest")]
//! Public API for the `stomp-relay` library.
//!
//! This crate relays STOMP frames between many logical client sessions and
//! one message broker. Each client session gets its own broker connection;
//! a shared system connection tracks broker availability and carries
//! server-originated traffic. Broker bytes are decoded incrementally from
//! arbitrarily fragmented reads.

pub mod codec;
pub mod command;
pub mod frame;
pub mod message;
pub mod metrics;
pub mod relay;
pub mod session;
pub mod transport;

pub use codec::{BufferingStompDecoder, CodecError, StompDecoder, StompEncoder};
pub use command::{MessageType, StompCommand};
pub use frame::{Frame, FrameBuilder, HeaderMap, HeartBeat};
pub use message::RelayMessage;
pub use metrics::{BROKER_AVAILABLE, Direction, ERRORS_TOTAL, FRAMES_TOTAL, RelayStats, SESSIONS_ACTIVE};
pub use relay::{BrokerAvailabilityEvent, RelayConfig, RelayError, StompBrokerRelay};
pub use session::{ConnectionId, SessionHandle, SessionKind, SessionRegistry, SessionState};
pub use transport::{TcpTransport, Transport};
