//! Command line interface for the `stomp-relay` binary.
//!
//! Kept free of crate imports so `build.rs` can include it to render the
//! man page.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `stomp-relay` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stomp-relay",
    version,
    about = "Relay STOMP sessions to a message broker"
)]
pub struct Cli {
    /// Broker host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Broker STOMP port.
    #[arg(long, default_value_t = 61613)]
    pub port: u16,

    /// Login used for every client session.
    #[arg(long, default_value = "guest")]
    pub client_login: String,

    /// Passcode used for every client session.
    #[arg(long, default_value = "guest")]
    pub client_passcode: String,

    /// Login used for the shared system session.
    #[arg(long, default_value = "guest")]
    pub system_login: String,

    /// Passcode used for the shared system session.
    #[arg(long, default_value = "guest")]
    pub system_passcode: String,

    /// System session heartbeat send interval in milliseconds (0 disables).
    #[arg(long, default_value_t = 10_000)]
    pub system_heartbeat_send: u64,

    /// System session heartbeat receive interval in milliseconds (0 disables).
    #[arg(long, default_value_t = 10_000)]
    pub system_heartbeat_receive: u64,

    /// `host` header to stamp on every CONNECT.
    #[arg(long)]
    pub virtual_host: Option<String>,

    /// Destination prefix to relay; repeat for several. None relays all.
    #[arg(long = "destination-prefix", value_name = "PREFIX")]
    pub destination_prefixes: Vec<String>,

    /// Maximum bytes buffered per session while decoding broker frames.
    #[arg(long, default_value_t = 64 * 1024)]
    pub decoder_buffer_limit: usize,

    /// Multiplier applied to the negotiated read heartbeat interval.
    #[arg(long, default_value_t = 3)]
    pub heartbeat_multiplier: u32,

    /// Delay between system session reconnect attempts in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub reconnect_interval_ms: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
