//! In-memory broker transport.

use std::{
    collections::VecDeque,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::BytesMut;
use stomp_relay::{
    BufferingStompDecoder,
    Frame,
    StompCommand,
    StompEncoder,
    Transport,
    transport::BoxedBrokerStream,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex},
    sync::mpsc,
    time::timeout,
};

use crate::frames::connected_frame;

const DUPLEX_CAPACITY: usize = 64 * 1024;
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Create a connected [`MockTransport`] and the receiver of the broker ends
/// it opens.
#[must_use]
pub fn mock_transport() -> (MockTransport, BrokerConnections) {
    let (accepted, rx) = mpsc::unbounded_channel();
    let transport = MockTransport {
        accepted,
        refuse: Arc::new(AtomicBool::new(false)),
        attempts: Arc::new(AtomicUsize::new(0)),
    };
    (transport, BrokerConnections { rx })
}

/// [`Transport`] that connects the relay to in-memory [`MockBroker`]s.
#[derive(Clone)]
pub struct MockTransport {
    accepted: mpsc::UnboundedSender<MockBroker>,
    refuse: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Refuse (or accept again) subsequent connection attempts.
    pub fn refuse_connections(&self, refuse: bool) { self.refuse.store(refuse, Ordering::SeqCst); }

    /// Number of connection attempts so far, refused ones included.
    #[must_use]
    pub fn attempts(&self) -> usize { self.attempts.load(Ordering::SeqCst) }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> io::Result<BoxedBrokerStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock broker refused the connection",
            ));
        }
        let (relay_end, broker_end) = duplex(DUPLEX_CAPACITY);
        self.accepted
            .send(MockBroker::new(broker_end))
            .map_err(|_| io::Error::new(io::ErrorKind::ConnectionRefused, "test dropped broker"))?;
        Ok(Box::pin(relay_end))
    }
}

/// Receives the broker side of every connection the relay opens, in order.
pub struct BrokerConnections {
    rx: mpsc::UnboundedReceiver<MockBroker>,
}

impl BrokerConnections {
    /// Wait up to one second for the next connection.
    ///
    /// # Panics
    ///
    /// Panics if no connection is opened in time.
    pub async fn accept(&mut self) -> MockBroker {
        timeout(ACCEPT_TIMEOUT, self.rx.recv())
            .await
            .expect("relay did not connect in time")
            .expect("transport dropped")
    }

    /// Return a connection only if one is already pending.
    pub fn try_accept(&mut self) -> Option<MockBroker> { self.rx.try_recv().ok() }
}

/// Scripted broker end of one relay connection.
pub struct MockBroker {
    stream: DuplexStream,
    decoder: BufferingStompDecoder,
    pending: VecDeque<Frame>,
}

impl MockBroker {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream,
            decoder: BufferingStompDecoder::new(DUPLEX_CAPACITY),
            pending: VecDeque::new(),
        }
    }

    /// Next frame written by the relay, or `None` once it closed the
    /// connection.
    ///
    /// # Panics
    ///
    /// Panics if the relay writes invalid STOMP.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(frame);
            }
            let mut buf = BytesMut::with_capacity(4096);
            match self.stream.read_buf(&mut buf).await {
                Ok(0) | Err(_) => return None,
                Ok(_) => self
                    .pending
                    .extend(self.decoder.decode(buf).expect("relay wrote invalid STOMP")),
            }
        }
    }

    /// Next frame, required to carry `command`.
    ///
    /// # Panics
    ///
    /// Panics on timeout, on close or if the command differs.
    pub async fn expect_frame(&mut self, command: StompCommand) -> Frame {
        let frame = timeout(ACCEPT_TIMEOUT, self.next_frame())
            .await
            .unwrap_or_else(|_| panic!("no {command} frame within {ACCEPT_TIMEOUT:?}"))
            .unwrap_or_else(|| panic!("connection closed while waiting for {command}"));
        assert_eq!(frame.command(), Some(command), "unexpected frame {frame:?}");
        frame
    }

    /// Returns `true` if the relay closes the connection within one second
    /// without writing another frame.
    pub async fn closed_without_frames(&mut self) -> bool {
        matches!(timeout(ACCEPT_TIMEOUT, self.next_frame()).await, Ok(None))
    }

    /// Read the `CONNECT` frame and answer with `CONNECTED`.
    pub async fn accept_connect(&mut self, heart_beat: &str) -> Frame {
        let connect = self.expect_frame(StompCommand::Connect).await;
        self.send(&connected_frame(heart_beat)).await;
        connect
    }

    /// Write a frame to the relay.
    ///
    /// # Panics
    ///
    /// Panics if the frame cannot be encoded or the relay end is gone.
    pub async fn send(&mut self, frame: &Frame) {
        let wire = StompEncoder::encode_frame(frame).expect("encodable frame");
        self.send_raw(&wire).await;
    }

    /// Write raw bytes to the relay.
    ///
    /// # Panics
    ///
    /// Panics if the relay end is gone.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream
            .write_all(bytes)
            .await
            .expect("relay end of the connection is gone");
    }

    /// Drop the connection.
    pub fn close(self) { drop(self); }
}
