//! Relay configuration and its builder.

use std::time::Duration;

use thiserror::Error;

use super::ReconnectConfig;
use crate::codec::DEFAULT_BUFFER_SIZE_LIMIT;

/// Default STOMP port of the broker.
pub const DEFAULT_RELAY_PORT: u16 = 61613;
/// Default system heartbeat interval in milliseconds, both directions.
pub const DEFAULT_SYSTEM_HEARTBEAT_MS: u64 = 10_000;
/// Default read-inactivity multiplier applied to negotiated heartbeats.
pub const DEFAULT_HEARTBEAT_MULTIPLIER: u32 = 3;

/// Errors reported by [`RelayConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("relay host must not be empty")]
    EmptyHost,
    #[error("relay port must not be zero")]
    ZeroPort,
    #[error("heartbeat multiplier must be at least 1")]
    ZeroHeartbeatMultiplier,
    #[error("decoder buffer limit must be greater than zero")]
    ZeroBufferLimit,
    #[error("client outbound capacity must be greater than zero")]
    ZeroOutboundCapacity,
}

/// Settings accepted by [`StompBrokerRelay`](super::StompBrokerRelay).
///
/// Build with [`RelayConfig::builder`]; [`RelayConfig::default`] yields the
/// builder defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    relay_host: String,
    relay_port: u16,
    client_login: String,
    client_passcode: String,
    system_login: String,
    system_passcode: String,
    system_heartbeat_send_interval: u64,
    system_heartbeat_receive_interval: u64,
    virtual_host: Option<String>,
    destination_prefixes: Vec<String>,
    decoder_buffer_limit: usize,
    heartbeat_multiplier: u32,
    connected_frame_timeout: Duration,
    reconnect: ReconnectConfig,
    shutdown_timeout: Duration,
    client_outbound_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_host: "127.0.0.1".to_owned(),
            relay_port: DEFAULT_RELAY_PORT,
            client_login: "guest".to_owned(),
            client_passcode: "guest".to_owned(),
            system_login: "guest".to_owned(),
            system_passcode: "guest".to_owned(),
            system_heartbeat_send_interval: DEFAULT_SYSTEM_HEARTBEAT_MS,
            system_heartbeat_receive_interval: DEFAULT_SYSTEM_HEARTBEAT_MS,
            virtual_host: None,
            destination_prefixes: Vec::new(),
            decoder_buffer_limit: DEFAULT_BUFFER_SIZE_LIMIT,
            heartbeat_multiplier: DEFAULT_HEARTBEAT_MULTIPLIER,
            connected_frame_timeout: Duration::from_secs(60),
            reconnect: ReconnectConfig::default(),
            shutdown_timeout: Duration::from_secs(5),
            client_outbound_capacity: 1024,
        }
    }
}

impl RelayConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> RelayConfigBuilder { RelayConfigBuilder::default() }

    #[must_use]
    pub fn relay_host(&self) -> &str { &self.relay_host }

    #[must_use]
    pub fn relay_port(&self) -> u16 { self.relay_port }

    #[must_use]
    pub fn client_login(&self) -> &str { &self.client_login }

    #[must_use]
    pub fn client_passcode(&self) -> &str { &self.client_passcode }

    #[must_use]
    pub fn system_login(&self) -> &str { &self.system_login }

    #[must_use]
    pub fn system_passcode(&self) -> &str { &self.system_passcode }

    /// Interval in milliseconds at which the system session sends heartbeats.
    #[must_use]
    pub fn system_heartbeat_send_interval(&self) -> u64 { self.system_heartbeat_send_interval }

    /// Interval in milliseconds at which the system session expects heartbeats.
    #[must_use]
    pub fn system_heartbeat_receive_interval(&self) -> u64 {
        self.system_heartbeat_receive_interval
    }

    /// `host` header stamped on every outbound `CONNECT`.
    #[must_use]
    pub fn virtual_host(&self) -> Option<&str> { self.virtual_host.as_deref() }

    /// Destinations the relay forwards. Empty means all.
    #[must_use]
    pub fn destination_prefixes(&self) -> &[String] { &self.destination_prefixes }

    #[must_use]
    pub fn decoder_buffer_limit(&self) -> usize { self.decoder_buffer_limit }

    #[must_use]
    pub fn heartbeat_multiplier(&self) -> u32 { self.heartbeat_multiplier }

    #[must_use]
    pub fn connected_frame_timeout(&self) -> Duration { self.connected_frame_timeout }

    #[must_use]
    pub fn reconnect(&self) -> ReconnectConfig { self.reconnect }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration { self.shutdown_timeout }

    #[must_use]
    pub fn client_outbound_capacity(&self) -> usize { self.client_outbound_capacity }

    /// Returns `true` if `destination` may be forwarded to the broker.
    #[must_use]
    pub fn accepts_destination(&self, destination: &str) -> bool {
        self.destination_prefixes.is_empty()
            || self
                .destination_prefixes
                .iter()
                .any(|prefix| destination.starts_with(prefix.as_str()))
    }
}

/// Builder for [`RelayConfig`].
///
/// ```
/// use stomp_relay::relay::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .relay_host("broker.internal")
///     .destination_prefixes(["/topic/", "/queue/"])
///     .build()
///     .expect("valid configuration");
/// assert!(config.accepts_destination("/topic/prices"));
/// assert!(!config.accepts_destination("/exchange/x"));
/// ```
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// Broker host name or address.
    #[must_use]
    pub fn relay_host(mut self, host: impl Into<String>) -> Self {
        self.config.relay_host = host.into();
        self
    }

    /// Broker STOMP port.
    #[must_use]
    pub fn relay_port(mut self, port: u16) -> Self {
        self.config.relay_port = port;
        self
    }

    /// Credentials used for every client session, replacing whatever the
    /// client sent.
    #[must_use]
    pub fn client_credentials(
        mut self,
        login: impl Into<String>,
        passcode: impl Into<String>,
    ) -> Self {
        self.config.client_login = login.into();
        self.config.client_passcode = passcode.into();
        self
    }

    /// Credentials used for the shared system session.
    #[must_use]
    pub fn system_credentials(
        mut self,
        login: impl Into<String>,
        passcode: impl Into<String>,
    ) -> Self {
        self.config.system_login = login.into();
        self.config.system_passcode = passcode.into();
        self
    }

    /// System session heartbeat intervals in milliseconds; zero disables a
    /// direction.
    #[must_use]
    pub fn system_heartbeat(mut self, send_interval: u64, receive_interval: u64) -> Self {
        self.config.system_heartbeat_send_interval = send_interval;
        self.config.system_heartbeat_receive_interval = receive_interval;
        self
    }

    #[must_use]
    pub fn virtual_host(mut self, host: Option<String>) -> Self {
        self.config.virtual_host = host;
        self
    }

    /// Restrict forwarded destinations to these prefixes.
    #[must_use]
    pub fn destination_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.destination_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Per-session decoder buffer limit in bytes.
    #[must_use]
    pub fn decoder_buffer_limit(mut self, limit: usize) -> Self {
        self.config.decoder_buffer_limit = limit;
        self
    }

    #[must_use]
    pub fn heartbeat_multiplier(mut self, multiplier: u32) -> Self {
        self.config.heartbeat_multiplier = multiplier;
        self
    }

    /// How long a session waits for `CONNECTED` after its transport opens.
    #[must_use]
    pub fn connected_frame_timeout(mut self, timeout: Duration) -> Self {
        self.config.connected_frame_timeout = timeout;
        self
    }

    #[must_use]
    pub fn reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.config.reconnect = reconnect;
        self
    }

    /// Upper bound on waiting for sessions during shutdown.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Capacity of the channel carrying broker frames back to clients.
    #[must_use]
    pub fn client_outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.client_outbound_capacity = capacity;
        self
    }

    /// Validate and finish the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid setting.
    pub fn build(self) -> Result<RelayConfig, ConfigError> {
        let mut config = self.config;
        if config.relay_host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if config.relay_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if config.heartbeat_multiplier == 0 {
            return Err(ConfigError::ZeroHeartbeatMultiplier);
        }
        if config.decoder_buffer_limit == 0 {
            return Err(ConfigError::ZeroBufferLimit);
        }
        if config.client_outbound_capacity == 0 {
            return Err(ConfigError::ZeroOutboundCapacity);
        }
        config.reconnect = config.reconnect.normalized();
        Ok(config)
    }
}
