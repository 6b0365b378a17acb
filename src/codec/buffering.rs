//! Incremental decoding across arbitrarily fragmented reads.
//!
//! [`BufferingStompDecoder`] queues raw chunks as they arrive from the
//! transport and only hands them to the underlying [`FrameParser`] once a
//! decode has a chance of succeeding. When a partial frame has declared its
//! `content-length`, later calls skip parsing until at least that many bytes
//! are buffered.

use std::collections::VecDeque;

use bytes::BytesMut;

use super::{CodecError, FrameParser, StompDecoder};
use crate::frame::{CONTENT_LENGTH, Frame, HeaderMap};

/// Default limit on unparsed bytes held by a decoder (64 KiB).
pub const DEFAULT_BUFFER_SIZE_LIMIT: usize = 64 * 1024;

/// Chunk-accumulating wrapper around a single-pass frame parser.
///
/// An error returned from [`decode`](Self::decode) is fatal: the decoder's
/// state is unspecified afterwards and the owning connection must be closed.
#[derive(Debug)]
pub struct BufferingStompDecoder<P = StompDecoder> {
    parser: P,
    chunks: VecDeque<BytesMut>,
    buffer_size_limit: usize,
    expected_content_length: Option<usize>,
}

impl BufferingStompDecoder<StompDecoder> {
    /// Create a decoder over [`StompDecoder`] holding at most
    /// `buffer_size_limit` unparsed bytes.
    #[must_use]
    pub fn new(buffer_size_limit: usize) -> Self { Self::with_parser(StompDecoder, buffer_size_limit) }
}

impl<P: FrameParser> BufferingStompDecoder<P> {
    /// Create a decoder over a custom parser.
    #[must_use]
    pub fn with_parser(parser: P, buffer_size_limit: usize) -> Self {
        Self {
            parser,
            chunks: VecDeque::new(),
            buffer_size_limit,
            expected_content_length: None,
        }
    }

    /// Append `chunk` and return every frame that is now complete.
    ///
    /// Returns an empty list while more input is needed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ContentLengthExceeded`] if a pending frame has
    /// declared a body larger than the limit, [`CodecError::BufferLimitExceeded`]
    /// if the unparsed bytes exceed the limit, or any error raised by the
    /// parser.
    pub fn decode(&mut self, chunk: BytesMut) -> Result<Vec<Frame>, CodecError> {
        if !chunk.is_empty() {
            self.chunks.push_back(chunk);
        }
        self.check_buffer_limits()?;

        if let Some(expected) = self.expected_content_length
            && self.buffer_size() < expected
        {
            return Ok(Vec::new());
        }

        let mut buffer = self.assemble_chunks_and_reset();
        let mut partial_headers = HeaderMap::new();
        let frames = self.parser.parse(&mut buffer, &mut partial_headers)?;

        if !buffer.is_empty() {
            self.expected_content_length = partial_headers
                .get(CONTENT_LENGTH)
                .and_then(|value| value.trim().parse().ok());
            tracing::debug!(
                leftover = buffer.len(),
                expected_content_length = ?self.expected_content_length,
                "buffering partial STOMP frame"
            );
            self.chunks.push_back(buffer);
            self.check_buffer_limits()?;
        }
        Ok(frames)
    }

    /// Total number of unparsed bytes currently held.
    #[must_use]
    pub fn buffer_size(&self) -> usize { self.chunks.iter().map(BytesMut::len).sum() }

    /// Configured upper bound on unparsed bytes.
    #[must_use]
    pub const fn buffer_size_limit(&self) -> usize { self.buffer_size_limit }

    /// Body length declared by the pending partial frame, if known.
    #[must_use]
    pub const fn expected_content_length(&self) -> Option<usize> { self.expected_content_length }

    fn check_buffer_limits(&self) -> Result<(), CodecError> {
        if let Some(content_length) = self.expected_content_length
            && content_length > self.buffer_size_limit
        {
            return Err(CodecError::ContentLengthExceeded {
                content_length,
                limit: self.buffer_size_limit,
            });
        }
        let buffered = self.buffer_size();
        if buffered > self.buffer_size_limit {
            return Err(CodecError::BufferLimitExceeded {
                buffered,
                limit: self.buffer_size_limit,
            });
        }
        Ok(())
    }

    fn assemble_chunks_and_reset(&mut self) -> BytesMut {
        self.expected_content_length = None;
        if self.chunks.len() == 1 {
            return self.chunks.pop_front().unwrap_or_default();
        }
        let mut buffer = BytesMut::with_capacity(self.buffer_size());
        for chunk in self.chunks.drain(..) {
            buffer.extend_from_slice(&chunk);
        }
        buffer
    }
}

#[cfg(test)]
#[path = "buffering_tests.rs"]
mod tests;
