//! Error types for the STOMP codec layer.
//!
//! Errors are split by origin:
//!
//! - [`FramingError`]: the byte stream does not follow STOMP frame syntax (bad header lines,
//!   escapes, missing NUL terminators).
//! - [`ProtocolError`]: a syntactically complete frame violates a command's structural
//!   requirements.
//! - [`CodecError`]: top-level enum wrapping both, plus buffer limit violations and I/O errors.
//!
//! Every decoding error is fatal to the decoder instance that raised it: the
//! owning transport session must be closed.

use std::io;

use thiserror::Error;

use crate::command::{StompCommand, UnknownCommand};

/// Wire-level syntax errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// A header line has no `:` or an empty name.
    #[error("illegal header: {line:?}; a header must be of the form <name>:[<value>]")]
    MalformedHeader {
        /// The offending line, lossily decoded.
        line: String,
    },

    /// A header used a backslash escape STOMP does not define.
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),

    /// A header ended in the middle of a backslash escape.
    #[error("header ends with an incomplete escape sequence")]
    TruncatedEscape,

    /// A header or command line is not valid UTF-8.
    #[error("frame text is not valid UTF-8")]
    InvalidUtf8,

    /// The byte after a `content-length` sized body was not NUL.
    #[error("frame must be terminated with a null octet")]
    MissingNulTerminator,

    /// A carriage return was not followed by a line feed.
    #[error("'\\r' must be followed by '\\n'")]
    BareCarriageReturn,
}

/// Structural violations in an otherwise well-formed frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The command line does not name a STOMP verb.
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),

    /// A header the command requires is absent.
    #[error("{command} frame is missing required header {header:?}")]
    MissingHeader {
        /// Command of the offending frame.
        command: StompCommand,
        /// Name of the missing header.
        header: &'static str,
    },

    /// A `content-length` header could not be parsed.
    #[error("invalid content-length {value:?}")]
    InvalidContentLength {
        /// Raw header value.
        value: String,
    },

    /// The command does not permit a body but one was present.
    #[error("{command} shouldn't have a payload: length={len}")]
    BodyNotAllowed {
        /// Command of the offending frame.
        command: StompCommand,
        /// Body length in bytes.
        len: usize,
    },
}

/// Top-level codec error taxonomy.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Framing layer error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Protocol layer error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Unparsed bytes grew beyond what the decoder may hold.
    #[error("the configured STOMP buffer size limit of {limit} bytes has been exceeded ({buffered} buffered)")]
    BufferLimitExceeded {
        /// Bytes currently buffered.
        buffered: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A pending frame declared a body larger than the decoder may hold.
    #[error("content-length {content_length} exceeds the STOMP buffer size limit of {limit} bytes")]
    ContentLengthExceeded {
        /// Declared body length.
        content_length: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` for the two buffer-limit violations.
    #[must_use]
    pub fn is_limit_violation(&self) -> bool {
        matches!(
            self,
            Self::BufferLimitExceeded { .. } | Self::ContentLengthExceeded { .. }
        )
    }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"protocol"`, `"limit"`, or `"io"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::BufferLimitExceeded { .. } | Self::ContentLengthExceeded { .. } => "limit",
            Self::Io(_) => "io",
        }
    }
}

impl From<UnknownCommand> for CodecError {
    fn from(err: UnknownCommand) -> Self { Self::Protocol(err.into()) }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
