//! Unit tests for codec error types.

use std::io;

use super::{CodecError, FramingError, ProtocolError};
use crate::command::{StompCommand, UnknownCommand};

#[test]
fn limit_violations_are_classified() {
    let buffered = CodecError::BufferLimitExceeded {
        buffered: 70,
        limit: 64,
    };
    let declared = CodecError::ContentLengthExceeded {
        content_length: 100,
        limit: 64,
    };
    assert!(buffered.is_limit_violation());
    assert!(declared.is_limit_violation());
    assert_eq!(buffered.error_type(), "limit");
    assert_eq!(declared.error_type(), "limit");
}

#[test]
fn syntax_errors_are_not_limit_violations() {
    let err = CodecError::Framing(FramingError::MissingNulTerminator);
    assert!(!err.is_limit_violation());
    assert_eq!(err.error_type(), "framing");
}

#[test]
fn unknown_command_becomes_protocol_error() {
    let err = CodecError::from(UnknownCommand("PING".into()));
    assert_eq!(err.error_type(), "protocol");
    assert_eq!(err.to_string(), "protocol error: unknown STOMP command: \"PING\"");
}

#[test]
fn codec_error_converts_to_invalid_data() {
    let err: io::Error = CodecError::Protocol(ProtocolError::BodyNotAllowed {
        command: StompCommand::Ack,
        len: 3,
    })
    .into();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(err.to_string().contains("ACK shouldn't have a payload"));
}

#[test]
fn io_error_passes_through_unchanged() {
    let err: io::Error = CodecError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}

#[test]
fn limit_message_names_both_sizes() {
    let err = CodecError::ContentLengthExceeded {
        content_length: 100,
        limit: 64,
    };
    assert_eq!(
        err.to_string(),
        "content-length 100 exceeds the STOMP buffer size limit of 64 bytes"
    );
}
