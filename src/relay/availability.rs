//! Broker availability tracking.

use log::info;
use tokio::sync::watch;

use crate::metrics;

/// Broker availability as last observed through the system session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrokerAvailabilityEvent {
    pub available: bool,
}

/// Publishes [`BrokerAvailabilityEvent`]s, only on change.
#[derive(Debug)]
pub(crate) struct BrokerAvailability {
    tx: watch::Sender<BrokerAvailabilityEvent>,
}

impl BrokerAvailability {
    /// Start out unavailable.
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(BrokerAvailabilityEvent::default());
        metrics::set_broker_available(false);
        Self { tx }
    }

    pub(crate) fn is_available(&self) -> bool { self.tx.borrow().available }

    /// Record the current availability. Returns `true` if it changed.
    pub(crate) fn publish(&self, available: bool) -> bool {
        let changed = self.tx.send_if_modified(|event| {
            if event.available == available {
                return false;
            }
            event.available = available;
            true
        });
        if changed {
            metrics::set_broker_available(available);
            if available {
                info!("broker available");
            } else {
                info!("broker not available");
            }
        }
        changed
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<BrokerAvailabilityEvent> {
        self.tx.subscribe()
    }
}
