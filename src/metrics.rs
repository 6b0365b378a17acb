//! Metric helpers for `stomp-relay`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. With the
//! `metrics` feature disabled the helpers compile to no-ops.
//!
//! [`RelayStats`] keeps plain atomic counters that are always available,
//! independent of any installed recorder.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking live broker sessions.
pub const SESSIONS_ACTIVE: &str = "stomp_relay_sessions_active";
/// Name of the counter tracking frames exchanged with the broker.
pub const FRAMES_TOTAL: &str = "stomp_relay_frames_total";
/// Name of the counter tracking session failures.
pub const ERRORS_TOTAL: &str = "stomp_relay_errors_total";
/// Name of the gauge reporting broker availability (1 or 0).
pub const BROKER_AVAILABLE: &str = "stomp_relay_broker_available";

/// Direction of a frame relative to the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames received from the broker.
    Inbound,
    /// Frames written to the broker.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the active sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a session failure.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}

/// Publish the broker availability flag.
pub fn set_broker_available(available: bool) {
    #[cfg(feature = "metrics")]
    gauge!(BROKER_AVAILABLE).set(if available { 1.0 } else { 0.0 });
    #[cfg(not(feature = "metrics"))]
    let _ = available;
}

/// Lifetime counters for one relay instance.
#[derive(Debug, Default)]
pub struct RelayStats {
    connect: AtomicU64,
    connected: AtomicU64,
    disconnect: AtomicU64,
    transport_failures: AtomicU64,
    connections_closed: AtomicU64,
}

impl RelayStats {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// A `CONNECT` was accepted for relaying.
    pub fn inc_connect(&self) { self.connect.fetch_add(1, Ordering::Relaxed); }

    /// The broker answered a `CONNECT` with `CONNECTED`.
    pub fn inc_connected(&self) { self.connected.fetch_add(1, Ordering::Relaxed); }

    /// A `DISCONNECT` was forwarded.
    pub fn inc_disconnect(&self) { self.disconnect.fetch_add(1, Ordering::Relaxed); }

    /// A session failed at the transport level.
    pub fn inc_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// The broker closed a session's connection.
    pub fn inc_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            connect: self.connect.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed),
            disconnect: self.disconnect.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Display for RelayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.snapshot().fmt(f) }
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub connect: u64,
    pub connected: u64,
    pub disconnect: u64,
    pub transport_failures: u64,
    pub connections_closed: u64,
}

impl fmt::Display for RelayStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed CONNECT({})-CONNECTED({})-DISCONNECT({}), transport failures: {}, \
             connections closed by broker: {}",
            self.connect,
            self.connected,
            self.disconnect,
            self.transport_failures,
            self.connections_closed
        )
    }
}
