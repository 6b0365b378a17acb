//! Reconnect policy for the system connection.

use std::time::Duration;

/// Fixed-interval reconnect policy for the system session.
///
/// Client sessions never reconnect; only the shared system connection is
/// re-established after it is lost.
///
/// # Default Values
/// - `interval`: 5 seconds
///
/// # Invariants
/// - `interval` must be at least 1 millisecond
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay between losing the system connection and the next attempt.
    pub interval: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl ReconnectConfig {
    /// Fixed delay of `interval` between attempts.
    #[must_use]
    pub const fn fixed(interval: Duration) -> Self { Self { interval } }

    /// Clamp the interval to at least one millisecond.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use stomp_relay::relay::ReconnectConfig;
    ///
    /// let cfg = ReconnectConfig::fixed(Duration::ZERO).normalized();
    /// assert_eq!(cfg.interval, Duration::from_millis(1));
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.interval = self.interval.max(Duration::from_millis(1));
        self
    }
}
