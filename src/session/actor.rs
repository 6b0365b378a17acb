//! Session actor driving one broker connection.
//!
//! The actor polls a shutdown token, its forward queue, the broker socket
//! and three timers (`CONNECTED` deadline, read inactivity, write
//! inactivity) in a `tokio::select!` loop. The `biased` ordering lets
//! shutdown win over queued work and queued forwards win over broker reads.

use std::{sync::Arc, time::Duration};

use bytes::BytesMut;
use futures::SinkExt;
use log::{debug, error, info, trace, warn};
use tokio::{
    io::{AsyncReadExt, ReadHalf, WriteHalf, split},
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_util::{codec::FramedWrite, sync::CancellationToken, task::TaskTracker};

use super::{
    ConnectionId,
    ForwardReply,
    ForwardRequest,
    HeartbeatIntervals,
    SessionHandle,
    SessionKind,
    SessionRegistry,
    SessionState,
    counter::ActiveSession,
};
use crate::{
    codec::{BufferingStompDecoder, StompEncoder},
    command::StompCommand,
    frame::{Frame, MESSAGE, RECEIPT_ID},
    message::RelayMessage,
    metrics::{self, Direction, RelayStats},
    relay::RelayError,
    transport::{BoxedBrokerStream, Transport},
};

const READ_BUFFER_CAPACITY: usize = 8 * 1024;
const REQUEST_QUEUE_CAPACITY: usize = 256;

/// Per-session tuning shared by every actor of a relay.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionSettings {
    pub(crate) decoder_buffer_limit: usize,
    pub(crate) heartbeat_multiplier: u32,
    pub(crate) connected_frame_timeout: Duration,
}

/// State shared between the relay and all of its session actors.
pub(crate) struct SessionShared {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) registry: SessionRegistry,
    pub(crate) outbound: mpsc::Sender<RelayMessage>,
    pub(crate) stats: RelayStats,
    pub(crate) settings: SessionSettings,
}

/// What a new actor should connect as.
pub(crate) struct SessionSpec {
    pub(crate) session_id: String,
    pub(crate) kind: SessionKind,
    pub(crate) user: Option<String>,
    /// Fully rewritten `CONNECT` frame to send once the transport is open.
    pub(crate) connect_frame: Frame,
}

/// Why an actor stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SessionExit {
    /// `DISCONNECT` completed.
    Disconnected,
    /// Connect, read, write, decode or heartbeat failure.
    Failed,
    /// The broker closed the connection.
    BrokerClosed,
    /// Every handle was dropped, usually because a newer `CONNECT` replaced
    /// this session.
    Released,
    /// The relay is shutting down.
    Shutdown,
}

/// Register a handle for `spec` and spawn its actor on `tracker`.
///
/// The handle is in the registry before the actor can run, so the actor's
/// own teardown always finds the entry it must remove.
pub(crate) fn spawn_session(
    spec: SessionSpec,
    shared: &Arc<SessionShared>,
    tracker: &TaskTracker,
    shutdown: CancellationToken,
) -> (SessionHandle, JoinHandle<SessionExit>) {
    let (actor, handle) = SessionActor::new(spec, Arc::clone(shared), shutdown);
    if let Some(previous) = shared.registry.insert(handle.clone()) {
        debug!(
            "session {} replaced: {} -> {}",
            handle.session_id(),
            previous.connection_id(),
            handle.connection_id()
        );
    }
    let join = tracker.spawn(actor.run());
    (handle, join)
}

enum Event {
    Shutdown,
    Request(Option<ForwardRequest>),
    Read(std::io::Result<usize>),
    ConnectedTimeout,
    ReadIdle,
    WriteIdle,
}

/// Broker-side I/O owned by a connected actor. Dropping it closes the
/// connection.
struct BrokerIo {
    reader: ReadHalf<BoxedBrokerStream>,
    writer: FramedWrite<WriteHalf<BoxedBrokerStream>, StompEncoder>,
    decoder: BufferingStompDecoder,
    read_buf: BytesMut,
}

#[derive(Default)]
struct Timers {
    connected: Option<Instant>,
    read: Option<Instant>,
    write: Option<Instant>,
    intervals: HeartbeatIntervals,
}

impl Timers {
    fn arm(&mut self, intervals: HeartbeatIntervals) {
        let now = Instant::now();
        self.connected = None;
        self.intervals = intervals;
        self.read = intervals.read.map(|interval| now + interval);
        self.write = intervals.write.map(|interval| now + interval);
    }

    fn touch_read(&mut self) {
        if let Some(interval) = self.intervals.read {
            self.read = Some(Instant::now() + interval);
        }
    }

    fn touch_write(&mut self) {
        if let Some(interval) = self.intervals.write {
            self.write = Some(Instant::now() + interval);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn respond(reply: Option<ForwardReply>, outcome: Result<(), RelayError>) {
    if let Some(reply) = reply {
        // The caller may have given up waiting.
        let _ = reply.send(outcome);
    }
}

fn command_name(frame: &Frame) -> &'static str {
    frame.command().map_or("heartbeat", StompCommand::as_str)
}

fn millis(duration: Duration) -> u64 { u64::try_from(duration.as_millis()).unwrap_or(u64::MAX) }

pub(crate) struct SessionActor {
    session_id: Arc<str>,
    kind: SessionKind,
    connection_id: ConnectionId,
    user: Option<String>,
    connect_frame: Frame,
    requests: mpsc::Receiver<ForwardRequest>,
    state: watch::Sender<SessionState>,
    shared: Arc<SessionShared>,
    shutdown: CancellationToken,
    disconnect_receipt: Option<String>,
}

impl SessionActor {
    pub(crate) fn new(
        spec: SessionSpec,
        shared: Arc<SessionShared>,
        shutdown: CancellationToken,
    ) -> (Self, SessionHandle) {
        let SessionSpec {
            session_id,
            kind,
            user,
            connect_frame,
        } = spec;
        let session_id: Arc<str> = session_id.into();
        let connection_id = ConnectionId::next();
        let (requests_tx, requests) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (state, state_rx) = watch::channel(SessionState::Unconnected);
        let handle = SessionHandle::new(
            Arc::clone(&session_id),
            kind,
            connection_id,
            requests_tx,
            state_rx,
        );
        let actor = Self {
            session_id,
            kind,
            connection_id,
            user,
            connect_frame,
            requests,
            state,
            shared,
            shutdown,
            disconnect_receipt: None,
        };
        (actor, handle)
    }

    /// Run the actor to completion.
    pub(crate) async fn run(mut self) -> SessionExit {
        let _active = ActiveSession::new();
        let exit = self.drive().await;
        self.close();
        debug!("session {} finished: {exit:?}", self.session_id);
        exit
    }

    fn state(&self) -> SessionState { *self.state.borrow() }

    fn set_state(&self, state: SessionState) {
        trace!("session {} -> {state}", self.session_id);
        self.state.send_replace(state);
    }

    async fn drive(&mut self) -> SessionExit {
        let connected = tokio::select! {
            biased;

            () = self.shutdown.cancelled() => return SessionExit::Shutdown,
            res = self.shared.transport.connect() => res,
        };
        let stream = match connected {
            Ok(stream) => stream,
            Err(err) => {
                self.fail(&format!("Failed to connect: {err}")).await;
                return SessionExit::Failed;
            }
        };

        let (reader, writer) = split(stream);
        let mut io = BrokerIo {
            reader,
            writer: FramedWrite::new(writer, StompEncoder),
            decoder: BufferingStompDecoder::new(self.shared.settings.decoder_buffer_limit),
            read_buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
        };
        self.set_state(SessionState::TcpConnected);
        debug!("session {}: transport connected, sending CONNECT", self.session_id);

        if let Err(err) = io.writer.send(self.connect_frame.clone()).await {
            self.fail(&format!("Failed to send CONNECT: {err}")).await;
            return SessionExit::Failed;
        }
        metrics::inc_frames(Direction::Outbound);

        let mut timers = Timers {
            connected: Some(Instant::now() + self.shared.settings.connected_frame_timeout),
            ..Timers::default()
        };
        loop {
            let event = self.next_event(&mut io, &timers).await;
            if let Some(exit) = self.dispatch(event, &mut io, &mut timers).await {
                return exit;
            }
        }
    }

    async fn next_event(&mut self, io: &mut BrokerIo, timers: &Timers) -> Event {
        io.read_buf.reserve(READ_BUFFER_CAPACITY);

        tokio::select! {
            biased;

            () = self.shutdown.cancelled() => Event::Shutdown,
            req = self.requests.recv() => Event::Request(req),
            res = io.reader.read_buf(&mut io.read_buf) => Event::Read(res),
            () = wait_until(timers.connected) => Event::ConnectedTimeout,
            () = wait_until(timers.read) => Event::ReadIdle,
            () = wait_until(timers.write) => Event::WriteIdle,
        }
    }

    async fn dispatch(
        &mut self,
        event: Event,
        io: &mut BrokerIo,
        timers: &mut Timers,
    ) -> Option<SessionExit> {
        match event {
            Event::Shutdown => {
                debug!("session {} closing for relay shutdown", self.session_id);
                Some(SessionExit::Shutdown)
            }
            Event::Request(None) => {
                debug!("session {} released; closing broker connection", self.session_id);
                Some(SessionExit::Released)
            }
            Event::Request(Some(request)) => self.forward(request, io, timers).await,
            Event::Read(Ok(0)) => {
                debug!("broker closed the connection of session {}", self.session_id);
                self.shared.stats.inc_connection_closed();
                self.terminate("Connection to broker closed.").await;
                Some(SessionExit::BrokerClosed)
            }
            Event::Read(Ok(_)) => {
                timers.touch_read();
                let chunk = io.read_buf.split();
                match io.decoder.decode(chunk) {
                    Ok(frames) => {
                        for frame in frames {
                            if let Some(exit) = self.handle_inbound(frame, timers).await {
                                return Some(exit);
                            }
                        }
                        None
                    }
                    Err(err) => {
                        self.fail(&format!("Failed to decode broker data: {err}"))
                            .await;
                        Some(SessionExit::Failed)
                    }
                }
            }
            Event::Read(Err(err)) => {
                self.fail(&format!("Transport failure: {err}")).await;
                Some(SessionExit::Failed)
            }
            Event::ConnectedTimeout => {
                let timeout = millis(self.shared.settings.connected_frame_timeout);
                self.fail(&format!("No CONNECTED frame received in {timeout} ms."))
                    .await;
                Some(SessionExit::Failed)
            }
            Event::ReadIdle => {
                let interval = timers.intervals.read.map_or(0, millis);
                self.fail(&format!("No messages received in {interval} ms."))
                    .await;
                Some(SessionExit::Failed)
            }
            Event::WriteIdle => match io.writer.send(Frame::heartbeat()).await {
                Ok(()) => {
                    trace!("sent heartbeat in session {}", self.session_id);
                    metrics::inc_frames(Direction::Outbound);
                    timers.touch_write();
                    None
                }
                Err(err) => {
                    self.fail(&format!("Failed to send heartbeat: {err}")).await;
                    Some(SessionExit::Failed)
                }
            },
        }
    }

    async fn forward(
        &mut self,
        request: ForwardRequest,
        io: &mut BrokerIo,
        timers: &mut Timers,
    ) -> Option<SessionExit> {
        let ForwardRequest { frame, reply } = request;
        let command = frame.command();

        if !self.state().is_stomp_connected() {
            match self.kind {
                SessionKind::Client => {
                    debug!(
                        "session {} not connected to the broker ({}); dropping {}",
                        self.session_id,
                        self.state(),
                        command_name(&frame)
                    );
                    respond(reply, Ok(()));
                }
                SessionKind::System => {
                    warn!(
                        "system session not connected ({}); rejecting {}",
                        self.state(),
                        command_name(&frame)
                    );
                    respond(
                        reply,
                        Err(RelayError::NotConnected {
                            session_id: self.session_id.to_string(),
                        }),
                    );
                }
            }
            return None;
        }

        let receipt = frame.receipt().map(str::to_owned);
        match command {
            Some(
                StompCommand::Send
                | StompCommand::Subscribe
                | StompCommand::Unsubscribe
                | StompCommand::Disconnect,
            ) => debug!("forwarding {} in session {}", command_name(&frame), self.session_id),
            _ => trace!("forwarding {} in session {}", command_name(&frame), self.session_id),
        }

        let reason = format!("Failed to forward {}", command_name(&frame));
        if let Err(err) = io.writer.send(frame).await {
            let reason = format!("{reason}: {err}");
            respond(
                reply,
                Err(RelayError::Delivery {
                    session_id: self.session_id.to_string(),
                    source: err,
                }),
            );
            self.fail(&reason).await;
            return Some(SessionExit::Failed);
        }

        metrics::inc_frames(Direction::Outbound);
        timers.touch_write();
        respond(reply, Ok(()));

        if command == Some(StompCommand::Disconnect) {
            match receipt {
                Some(receipt) => self.disconnect_receipt = Some(receipt),
                None => {
                    debug!(
                        "session {} sent DISCONNECT without receipt; closing",
                        self.session_id
                    );
                    self.close();
                    return Some(SessionExit::Disconnected);
                }
            }
        }
        None
    }

    async fn handle_inbound(&mut self, frame: Frame, timers: &mut Timers) -> Option<SessionExit> {
        metrics::inc_frames(Direction::Inbound);

        match frame.command() {
            None => {
                trace!("received heartbeat in session {}", self.session_id);
                if self.kind.notifies_client() {
                    self.deliver(frame).await;
                }
            }
            Some(StompCommand::Connected) if self.state() == SessionState::TcpConnected => {
                let intervals = HeartbeatIntervals::negotiate(
                    self.connect_frame.heart_beat(),
                    frame.heart_beat(),
                    self.shared.settings.heartbeat_multiplier,
                );
                timers.arm(intervals);
                self.shared.stats.inc_connected();
                self.set_state(SessionState::StompConnected);
                match self.kind {
                    SessionKind::Client => {
                        debug!(
                            "session {} connected to the broker, heartbeats {intervals:?}",
                            self.session_id
                        );
                        self.deliver(frame).await;
                    }
                    SessionKind::System => {
                        info!("system session connected to the broker, heartbeats {intervals:?}");
                    }
                }
            }
            Some(StompCommand::Error) => {
                error!(
                    "received ERROR in session {}: {}",
                    self.session_id,
                    frame.header(MESSAGE).unwrap_or("(no message)")
                );
                if self.kind.notifies_client() {
                    self.deliver(frame).await;
                }
            }
            Some(StompCommand::Receipt)
                if self.disconnect_receipt.is_some()
                    && frame.header(RECEIPT_ID) == self.disconnect_receipt.as_deref() =>
            {
                debug!("session {} received DISCONNECT receipt", self.session_id);
                if self.kind.notifies_client() {
                    self.deliver(frame).await;
                }
                self.close();
                return Some(SessionExit::Disconnected);
            }
            Some(command) => {
                trace!("received {command} in session {}", self.session_id);
                if self.kind.notifies_client() {
                    self.deliver(frame).await;
                }
            }
        }
        None
    }

    /// Publish a broker frame to the client outbound channel.
    async fn deliver(&self, frame: Frame) {
        let mut message = RelayMessage::new(frame).with_session_id(&*self.session_id);
        if let Some(user) = &self.user {
            message = message.with_user(user.clone());
        }
        if self.shared.outbound.send(message).await.is_err() {
            debug!(
                "client outbound channel closed; dropping frame for session {}",
                self.session_id
            );
        }
    }

    /// Transport failure: log, count and tear down.
    pub(super) async fn fail(&mut self, reason: &str) {
        if self.state().is_closed() {
            return;
        }
        error!("session {} failed: {reason}", self.session_id);
        self.shared.stats.inc_transport_failure();
        metrics::inc_errors();
        self.terminate(reason).await;
    }

    /// Notify the client, if any, then close.
    async fn terminate(&mut self, reason: &str) {
        if self.state().is_closed() {
            return;
        }
        if self.kind.notifies_client() {
            let frame = Frame::builder(StompCommand::Error)
                .header(MESSAGE, reason)
                .build();
            self.deliver(frame).await;
        }
        self.close();
    }

    /// Mark the session closed and drop its registry entry.
    ///
    /// Returns `true` only on the first call.
    pub(super) fn close(&mut self) -> bool {
        if self.state().is_closed() {
            return false;
        }
        if self.kind.notifies_client()
            && self
                .shared
                .registry
                .remove(&self.session_id, self.connection_id)
        {
            debug!("removed session {} from the session table", self.session_id);
        }
        self.set_state(SessionState::Closed);
        true
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
