//! Per-session broker connections.
//!
//! Every logical client session is served by its own actor task that owns
//! one transport connection to the broker. The actor sends the session's
//! `CONNECT`, waits for `CONNECTED`, forwards frames in submission order,
//! keeps heartbeats flowing and tears the connection down on `DISCONNECT`,
//! transport failure or broker close. Application code talks to an actor
//! only through its cloneable [`SessionHandle`].
//!
//! The shared system session uses the same actor with
//! [`SessionKind::System`]: it has no client, so broker frames and failures
//! are never published to the client channel, and its forwards wait for the
//! write to complete.

mod actor;
mod counter;
mod heartbeat;
mod registry;
mod state;

#[cfg(test)]
mod tests;

use std::{fmt, sync::Arc};

pub(crate) use actor::{SessionExit, SessionSettings, SessionShared, SessionSpec, spawn_session};
pub use counter::active_session_count;
pub use heartbeat::HeartbeatIntervals;
use log::debug;
pub use registry::{ConnectionId, SessionRegistry};
pub use state::SessionState;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{frame::Frame, relay::RelayError};

/// Reserved session id of the shared system connection.
pub const SYSTEM_SESSION_ID: &str = "_system_";

/// The two flavours of broker session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Opened on behalf of a remote client's `CONNECT`.
    Client,
    /// The relay's own shared connection for server-originated traffic.
    System,
}

impl SessionKind {
    /// Whether failures are reported to a client with an `ERROR` frame.
    #[must_use]
    pub const fn notifies_client(self) -> bool { matches!(self, Self::Client) }

    /// Whether [`SessionHandle::forward`] waits for the broker write.
    #[must_use]
    pub const fn awaits_delivery(self) -> bool { matches!(self, Self::System) }
}

type ForwardReply = oneshot::Sender<Result<(), RelayError>>;

/// A frame queued for an actor, with an optional completion channel.
pub(crate) struct ForwardRequest {
    pub(crate) frame: Frame,
    pub(crate) reply: Option<ForwardReply>,
}

/// Cloneable handle to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: Arc<str>,
    kind: SessionKind,
    connection_id: ConnectionId,
    requests: mpsc::Sender<ForwardRequest>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: Arc<str>,
        kind: SessionKind,
        connection_id: ConnectionId,
        requests: mpsc::Sender<ForwardRequest>,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self {
            session_id,
            kind,
            connection_id,
            requests,
            state,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str { &self.session_id }

    #[must_use]
    pub fn kind(&self) -> SessionKind { self.kind }

    #[must_use]
    pub fn connection_id(&self) -> ConnectionId { self.connection_id }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState { *self.state.borrow() }

    /// Watch lifecycle transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> { self.state.clone() }

    /// Wait until the session reaches a state matching `predicate`.
    ///
    /// Returns the last observed state if the actor exits first.
    pub async fn wait_for(&self, predicate: impl Fn(SessionState) -> bool) -> SessionState {
        let mut state = self.state.clone();
        let reached = state
            .wait_for(|current| predicate(*current))
            .await
            .map(|current| *current);
        reached.unwrap_or_else(|_| *state.borrow())
    }

    /// Queue `frame` for the broker.
    ///
    /// Frames are written in the order they are queued. A client session
    /// that is not (or no longer) connected drops the frame and reports
    /// success, since its client is typically already going away. The
    /// system session waits for the write and reports any failure.
    ///
    /// # Errors
    ///
    /// System session only: [`RelayError::NotConnected`] before the broker
    /// accepted the connection or after it was lost, and
    /// [`RelayError::Delivery`] if the write failed.
    pub async fn forward(&self, frame: Frame) -> Result<(), RelayError> {
        if !self.kind.awaits_delivery() {
            let request = ForwardRequest { frame, reply: None };
            if self.requests.send(request).await.is_err() {
                debug!(
                    "session {} already closed; dropping forwarded frame",
                    self.session_id
                );
            }
            return Ok(());
        }

        let (reply, outcome) = oneshot::channel();
        let request = ForwardRequest {
            frame,
            reply: Some(reply),
        };
        let not_connected = || RelayError::NotConnected {
            session_id: self.session_id.to_string(),
        };
        self.requests
            .send(request)
            .await
            .map_err(|_| not_connected())?;
        outcome.await.map_err(|_| not_connected())?
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("kind", &self.kind)
            .field("connection_id", &self.connection_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
