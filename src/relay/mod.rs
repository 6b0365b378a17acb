//! STOMP broker relay orchestration.
//!
//! [`StompBrokerRelay`] routes application messages, keyed by session id,
//! to per-session broker connections, and owns the shared system session
//! whose health decides whether the broker is considered available.
//! Broker frames come back on the channel returned by
//! [`StompBrokerRelay::new`], stamped with the session id they belong to.

mod availability;
mod config;
mod error;
mod reconnect;
mod system;

#[cfg(test)]
mod tests;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub use availability::BrokerAvailabilityEvent;
use availability::BrokerAvailability;
pub use config::{
    ConfigError,
    DEFAULT_HEARTBEAT_MULTIPLIER,
    DEFAULT_RELAY_PORT,
    DEFAULT_SYSTEM_HEARTBEAT_MS,
    RelayConfig,
    RelayConfigBuilder,
};
pub use error::RelayError;
use log::{debug, error, info, trace, warn};
pub use reconnect::ReconnectConfig;
use system::SystemSupervisor;
use tokio::{
    sync::{mpsc, watch},
    time::timeout,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    command::StompCommand,
    frame::{HOST, LOGIN, PASSCODE},
    message::RelayMessage,
    metrics::RelayStats,
    session::{
        SYSTEM_SESSION_ID,
        SessionHandle,
        SessionKind,
        SessionRegistry,
        SessionSettings,
        SessionShared,
        SessionSpec,
        active_session_count,
        spawn_session,
    },
    transport::{TcpTransport, Transport},
};

/// Relay between application sessions and one STOMP broker.
///
/// # Examples
///
/// ```no_run
/// use stomp_relay::relay::{RelayConfig, StompBrokerRelay};
///
/// # async fn demo() -> Result<(), stomp_relay::relay::RelayError> {
/// let config = RelayConfig::builder()
///     .destination_prefixes(["/topic/", "/queue/"])
///     .build()?;
/// let (relay, mut to_clients) = StompBrokerRelay::new(config);
/// relay.start();
/// while let Some(message) = to_clients.recv().await {
///     println!("{}", message.short_log());
/// }
/// relay.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct StompBrokerRelay {
    config: Arc<RelayConfig>,
    shared: Arc<SessionShared>,
    availability: Arc<BrokerAvailability>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    running: AtomicBool,
}

impl StompBrokerRelay {
    /// Create a relay that connects to the configured host over TCP.
    ///
    /// Returns the relay and the receiving end of the client outbound
    /// channel.
    #[must_use]
    pub fn new(config: RelayConfig) -> (Self, mpsc::Receiver<RelayMessage>) {
        let transport = TcpTransport::new(config.relay_host(), config.relay_port());
        Self::with_transport(config, transport)
    }

    /// Create a relay over a custom [`Transport`].
    #[must_use]
    pub fn with_transport(
        config: RelayConfig,
        transport: impl Transport,
    ) -> (Self, mpsc::Receiver<RelayMessage>) {
        let (outbound, to_clients) = mpsc::channel(config.client_outbound_capacity());
        let shared = Arc::new(SessionShared {
            transport: Arc::new(transport),
            registry: SessionRegistry::new(),
            outbound,
            stats: RelayStats::new(),
            settings: SessionSettings {
                decoder_buffer_limit: config.decoder_buffer_limit(),
                heartbeat_multiplier: config.heartbeat_multiplier(),
                connected_frame_timeout: config.connected_frame_timeout(),
            },
        });
        let relay = Self {
            config: Arc::new(config),
            shared,
            availability: Arc::new(BrokerAvailability::new()),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
        };
        (relay, to_clients)
    }

    /// Start the system session. Calling this again has no effect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        if self.shutdown.is_cancelled() || self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            "starting STOMP broker relay to {}:{}",
            self.config.relay_host(),
            self.config.relay_port()
        );
        let supervisor = SystemSupervisor {
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
            availability: Arc::clone(&self.availability),
            tracker: self.tracker.clone(),
            shutdown: self.shutdown.clone(),
        };
        self.tracker.spawn(supervisor.run());
    }

    #[must_use]
    pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

    /// Whether the system session is currently connected to the broker.
    #[must_use]
    pub fn is_broker_available(&self) -> bool { self.availability.is_available() }

    /// Observe broker availability changes.
    #[must_use]
    pub fn subscribe_availability(&self) -> watch::Receiver<BrokerAvailabilityEvent> {
        self.availability.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &RelayConfig { &self.config }

    #[must_use]
    pub fn stats(&self) -> &RelayStats { &self.shared.stats }

    /// Handle of the session registered under `session_id`.
    #[must_use]
    pub fn session(&self, session_id: &str) -> Option<SessionHandle> {
        self.shared.registry.get(session_id)
    }

    /// Number of client sessions in the table.
    #[must_use]
    pub fn client_session_count(&self) -> usize {
        self.shared
            .registry
            .session_ids()
            .iter()
            .filter(|id| id.as_str() != SYSTEM_SESSION_ID)
            .count()
    }

    /// Route one application message toward the broker.
    ///
    /// `CONNECT` opens a new broker connection for the message's session,
    /// using the relay's client credentials. Every other command is
    /// forwarded on the session's existing connection. A message without a
    /// session id must be a `SEND`; it travels over the system session.
    ///
    /// Frames for unknown sessions and frames whose destination lies outside
    /// the configured prefixes are dropped and logged. While the broker is
    /// unavailable, other traffic is dropped the same way.
    ///
    /// # Errors
    ///
    /// - [`RelayError::ReservedSessionId`] if the message claims the system
    ///   session's id.
    /// - [`RelayError::BrokerUnavailable`] for a `CONNECT` or a session-less
    ///   message while the broker is unavailable.
    /// - [`RelayError::Protocol`] if the frame lacks a header its command
    ///   requires.
    /// - [`RelayError::NotConnected`] or [`RelayError::Delivery`] if a
    ///   session-less `SEND` cannot be written through the system session.
    pub async fn handle_message(&self, message: RelayMessage) -> Result<(), RelayError> {
        let command = message.command();
        trace!("processing {}", message.short_log());

        if let Some(session_id) = message.session_id()
            && session_id == SYSTEM_SESSION_ID
        {
            return Err(RelayError::ReservedSessionId {
                session_id: session_id.to_owned(),
            });
        }

        if !self.is_broker_available() {
            if message.session_id().is_none() || command.is_some_and(StompCommand::is_connect) {
                return Err(RelayError::BrokerUnavailable);
            }
            debug!("message broker not available; dropping {}", message.short_log());
            return Ok(());
        }

        let session_id = match message.session_id() {
            Some(id) => id.to_owned(),
            None if command == Some(StompCommand::Send) => SYSTEM_SESSION_ID.to_owned(),
            None => {
                error!(
                    "only SEND is supported without a session id; ignoring {}",
                    message.short_log()
                );
                return Ok(());
            }
        };

        message.frame().validate()?;

        if let Some(command) = command
            && command.requires_destination()
            && let Some(destination) = message.destination()
            && !self.config.accepts_destination(destination)
        {
            debug!(
                "destination {destination} is outside the configured prefixes; dropping {}",
                message.short_log()
            );
            return Ok(());
        }

        match command {
            Some(command) if command.is_connect() => {
                self.open_client_session(session_id, message);
                Ok(())
            }
            Some(StompCommand::Disconnect) => {
                self.shared.stats.inc_disconnect();
                self.forward_to(&session_id, message).await
            }
            _ => self.forward_to(&session_id, message).await,
        }
    }

    fn open_client_session(&self, session_id: String, message: RelayMessage) {
        self.shared.stats.inc_connect();
        debug!("processing CONNECT in session {session_id}");

        let user = message.user().map(str::to_owned);
        let mut builder = message
            .into_frame()
            .into_builder()
            .set_header(LOGIN, self.config.client_login())
            .set_header(PASSCODE, self.config.client_passcode());
        if let Some(host) = self.config.virtual_host() {
            builder = builder.set_header(HOST, host);
        }

        let spec = SessionSpec {
            session_id,
            kind: SessionKind::Client,
            user,
            connect_frame: builder.build(),
        };
        spawn_session(spec, &self.shared, &self.tracker, self.shutdown.clone());
    }

    async fn forward_to(&self, session_id: &str, message: RelayMessage) -> Result<(), RelayError> {
        let Some(handle) = self.shared.registry.get(session_id) else {
            debug!(
                "no broker session for {session_id}; ignoring {}",
                message.short_log()
            );
            return Ok(());
        };
        handle.forward(message.into_frame()).await
    }

    /// Stop the relay.
    ///
    /// Publishes the broker as unavailable, closes every session and waits
    /// for them up to the configured shutdown timeout. A relay that has been
    /// shut down cannot be started again.
    pub async fn shutdown(&self) {
        info!("stopping STOMP broker relay");
        self.running.store(false, Ordering::Release);
        self.availability.publish(false);
        self.shutdown.cancel();
        self.tracker.close();

        let limit = self.config.shutdown_timeout();
        if timeout(limit, self.tracker.wait()).await.is_err() {
            warn!(
                "{} broker sessions still open after {limit:?}",
                active_session_count()
            );
        }
        let leftover = self.shared.registry.drain();
        if !leftover.is_empty() {
            debug!("discarded {} session entries at shutdown", leftover.len());
        }
        info!("STOMP broker relay stopped: {}", self.shared.stats);
    }
}
