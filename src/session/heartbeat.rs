//! Heartbeat negotiation between the relay's `CONNECT` and the broker's
//! `CONNECTED`.

use std::time::Duration;

use crate::frame::HeartBeat;

/// Effective inactivity intervals for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeartbeatIntervals {
    /// Idle time after which the relay emits a heartbeat to the broker.
    pub write: Option<Duration>,
    /// Silence from the broker after which the connection is failed.
    pub read: Option<Duration>,
}

impl HeartbeatIntervals {
    /// Negotiate intervals from the `heart-beat` pair the relay sent and the
    /// pair the broker answered with.
    ///
    /// Each direction uses the larger of the two requested values and is only
    /// armed when both sides asked for it. The read interval is widened by
    /// `multiplier` to tolerate late heartbeats.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use stomp_relay::{frame::HeartBeat, session::HeartbeatIntervals};
    ///
    /// let intervals =
    ///     HeartbeatIntervals::negotiate(HeartBeat::new(10_000, 10_000), HeartBeat::new(5_000, 0), 3);
    /// assert_eq!(intervals.write, None);
    /// assert_eq!(intervals.read, Some(Duration::from_millis(30_000)));
    /// ```
    #[must_use]
    pub fn negotiate(client: HeartBeat, broker: HeartBeat, multiplier: u32) -> Self {
        let write = (client.send > 0 && broker.receive > 0)
            .then(|| Duration::from_millis(client.send.max(broker.receive)));
        let read = (client.receive > 0 && broker.send > 0).then(|| {
            Duration::from_millis(client.receive.max(broker.send))
                .saturating_mul(multiplier.max(1))
        });
        Self { write, read }
    }

    /// Returns `true` if neither timer is armed.
    #[must_use]
    pub const fn is_disabled(&self) -> bool { self.write.is_none() && self.read.is_none() }
}
