//! `stomp-relay` binary.
//!
//! Starts the relay's system session against the configured broker and
//! reports broker availability until interrupted.

mod cli;

use std::time::Duration;

use clap::Parser;
use log::{debug, info};
use stomp_relay::relay::{ReconnectConfig, RelayConfig, RelayError, StompBrokerRelay};

fn config_from(cli: &cli::Cli) -> Result<RelayConfig, RelayError> {
    let config = RelayConfig::builder()
        .relay_host(cli.host.as_str())
        .relay_port(cli.port)
        .client_credentials(cli.client_login.as_str(), cli.client_passcode.as_str())
        .system_credentials(cli.system_login.as_str(), cli.system_passcode.as_str())
        .system_heartbeat(cli.system_heartbeat_send, cli.system_heartbeat_receive)
        .virtual_host(cli.virtual_host.clone())
        .destination_prefixes(cli.destination_prefixes.iter().cloned())
        .decoder_buffer_limit(cli.decoder_buffer_limit)
        .heartbeat_multiplier(cli.heartbeat_multiplier)
        .reconnect(ReconnectConfig::fixed(Duration::from_millis(
            cli.reconnect_interval_ms,
        )))
        .build()?;
    Ok(config)
}

#[cfg(feature = "metrics")]
fn install_metrics(cli: &cli::Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("serving metrics on {addr}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    #[cfg(feature = "metrics")]
    install_metrics(&cli)?;

    let (relay, mut to_clients) = StompBrokerRelay::new(config_from(&cli)?);
    let mut availability = relay.subscribe_availability();
    relay.start();

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.map_err(RelayError::Io)?;
                break;
            }
            changed = availability.changed() => {
                if changed.is_err() {
                    break;
                }
                let available = availability.borrow_and_update().available;
                info!("broker availability changed: available={available}");
            }
            Some(message) = to_clients.recv() => {
                debug!("broker frame for the application: {}", message.short_log());
            }
        }
    }

    relay.shutdown().await;
    Ok(())
}
