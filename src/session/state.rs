//! Session lifecycle state.

use std::fmt;

/// Lifecycle of one broker-facing session.
///
/// States only move forward: `Unconnected` → `TcpConnected` →
/// `StompConnected` → `Closed`. Any state may jump straight to `Closed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created; the transport connection has been requested.
    #[default]
    Unconnected,
    /// Transport open and `CONNECT` sent; awaiting the broker's `CONNECTED`.
    TcpConnected,
    /// `CONNECTED` received. Frames may be forwarded.
    StompConnected,
    /// Terminal. The connection has been released.
    Closed,
}

impl SessionState {
    /// Returns `true` once the broker has accepted the `CONNECT`.
    #[must_use]
    pub const fn is_stomp_connected(self) -> bool { matches!(self, Self::StompConnected) }

    /// Returns `true` once the session has been torn down.
    #[must_use]
    pub const fn is_closed(self) -> bool { matches!(self, Self::Closed) }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconnected => "UNCONNECTED",
            Self::TcpConnected => "TCP_CONNECTED",
            Self::StompConnected => "STOMP_CONNECTED",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
