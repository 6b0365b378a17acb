//! Errors surfaced to callers of the relay.

use std::io;

use thiserror::Error;

use super::config::ConfigError;
use crate::codec::ProtocolError;

/// Errors returned by [`StompBrokerRelay`](super::StompBrokerRelay) and
/// [`SessionHandle`](crate::session::SessionHandle).
///
/// Routing misses and destination filtering are not errors; those frames are
/// dropped and logged.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The system connection is down and the message could not be accepted.
    #[error("message broker is not available")]
    BrokerUnavailable,
    /// An application message used the session id reserved for the system
    /// connection.
    #[error("session id {session_id} is reserved for the system connection")]
    ReservedSessionId { session_id: String },
    /// A frame was sent through the system session before the broker
    /// answered its `CONNECT`.
    #[error("session {session_id} is not connected to the broker")]
    NotConnected { session_id: String },
    /// Writing a system-session frame to the broker failed.
    #[error("failed to deliver frame for session {session_id}")]
    Delivery {
        session_id: String,
        #[source]
        source: io::Error,
    },
    /// The application supplied a structurally invalid frame.
    #[error("invalid frame: {0}")]
    Protocol(#[from] ProtocolError),
    /// The relay configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
