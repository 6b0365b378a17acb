//! Broker transport abstraction.
//!
//! A [`Transport`] knows how to open one byte stream to the broker. The
//! relay opens a fresh stream per client session plus one for the shared
//! system session, and layers STOMP framing, heartbeats and failure handling
//! on top.

use std::{fmt, io, pin::Pin};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

/// Trait alias for streams a transport may hand back.
pub trait BrokerStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}
impl<T> BrokerStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Type-erased broker stream.
pub type BoxedBrokerStream = Pin<Box<dyn BrokerStream>>;

/// Opens byte streams to the message broker.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a new connection to the broker.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the broker cannot be reached.
    async fn connect(&self) -> io::Result<BoxedBrokerStream>;
}

/// TCP transport to a fixed `host:port`.
#[derive(Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
}

impl TcpTransport {
    /// Create a transport targeting `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TcpTransport({}:{})", self.host, self.port)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> io::Result<BoxedBrokerStream> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        stream.set_nodelay(true)?;
        Ok(Box::pin(stream))
    }
}
