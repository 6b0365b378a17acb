//! Supervision of the shared system session.
//!
//! The supervisor keeps exactly one system session alive for the lifetime of
//! the relay. Broker availability follows that session: available once it
//! receives `CONNECTED`, unavailable as soon as it is lost. A lost session is
//! re-established after the configured fixed interval until shutdown.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::time::sleep;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{BrokerAvailability, RelayConfig};
use crate::{
    command::StompCommand,
    frame::{ACCEPT_VERSION, Frame, HEART_BEAT, HOST, HeartBeat, LOGIN, PASSCODE},
    session::{SYSTEM_SESSION_ID, SessionExit, SessionKind, SessionShared, SessionSpec, spawn_session},
};

/// `CONNECT` frame for the system session.
pub(crate) fn system_connect_frame(config: &RelayConfig) -> Frame {
    let heart_beat = HeartBeat::new(
        config.system_heartbeat_send_interval(),
        config.system_heartbeat_receive_interval(),
    );
    let mut builder = Frame::builder(StompCommand::Connect)
        .header(ACCEPT_VERSION, "1.1,1.2")
        .header(LOGIN, config.system_login())
        .header(PASSCODE, config.system_passcode())
        .header(HEART_BEAT, heart_beat.to_string());
    if let Some(host) = config.virtual_host() {
        builder = builder.header(HOST, host);
    }
    builder.build()
}

pub(crate) struct SystemSupervisor {
    pub(crate) config: Arc<RelayConfig>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) availability: Arc<BrokerAvailability>,
    pub(crate) tracker: TaskTracker,
    pub(crate) shutdown: CancellationToken,
}

impl SystemSupervisor {
    pub(crate) async fn run(self) {
        let interval = self.config.reconnect().interval;
        loop {
            let exit = self.run_once().await;
            self.availability.publish(false);
            if exit == SessionExit::Shutdown || self.shutdown.is_cancelled() {
                break;
            }

            warn!("system session lost ({exit:?}); reconnecting in {interval:?}");
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,
                () = sleep(interval) => {}
            }
        }
        info!("system session supervisor stopped");
    }

    /// Run one system session to completion, publishing availability on
    /// `CONNECTED`.
    async fn run_once(&self) -> SessionExit {
        let spec = SessionSpec {
            session_id: SYSTEM_SESSION_ID.to_owned(),
            kind: SessionKind::System,
            user: None,
            connect_frame: system_connect_frame(&self.config),
        };
        let (handle, mut join) =
            spawn_session(spec, &self.shared, &self.tracker, self.shutdown.clone());
        let mut state = handle.subscribe_state();
        drop(handle);
        let mut watching = true;

        loop {
            tokio::select! {
                res = &mut join => {
                    return res.unwrap_or_else(|err| {
                        error!("system session task failed: {err}");
                        SessionExit::Failed
                    });
                }
                changed = state.changed(), if watching => match changed {
                    Ok(()) => {
                        if state.borrow_and_update().is_stomp_connected() {
                            self.availability.publish(true);
                        }
                    }
                    Err(_) => watching = false,
                },
            }
        }
    }
}
