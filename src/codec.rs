//! STOMP wire codec.
//!
//! The codec is split into a stateless single-pass parser ([`StompDecoder`]),
//! a chunk-buffering front end ([`BufferingStompDecoder`]) that preserves
//! partial frames across reads, and a [`StompEncoder`] usable directly or as
//! a `tokio_util` [`Encoder`](tokio_util::codec::Encoder).
//!
//! # Error Handling
//!
//! Decoding failures are reported through [`CodecError`]. Every decoding
//! error is fatal to the decoder that raised it; see the [`error`] module.

use bytes::BytesMut;

mod buffering;
mod decoder;
mod encoder;
pub mod error;

pub use buffering::{BufferingStompDecoder, DEFAULT_BUFFER_SIZE_LIMIT};
pub use decoder::StompDecoder;
pub use encoder::StompEncoder;
pub use error::{CodecError, FramingError, ProtocolError};

use crate::frame::{Frame, HeaderMap};

/// A single-pass frame parser driven by [`BufferingStompDecoder`].
///
/// Implementations consume every complete frame at the front of `buffer`
/// and leave any trailing partial frame in place. When they stop on a
/// partial frame, the complete header lines read so far are appended to
/// `partial_headers`.
pub trait FrameParser {
    /// Parse as many complete frames as `buffer` holds.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the input is not valid STOMP.
    fn parse(
        &mut self,
        buffer: &mut BytesMut,
        partial_headers: &mut HeaderMap,
    ) -> Result<Vec<Frame>, CodecError>;
}
