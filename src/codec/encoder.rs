//! STOMP frame serialisation.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use super::{CodecError, ProtocolError};
use crate::{
    command::StompCommand,
    frame::{CONTENT_LENGTH, Frame},
};

/// Writes frames in STOMP 1.2 wire format.
///
/// Heartbeats are written as a single line feed. For commands that require a
/// `content-length`, the header is always computed from the body and any
/// caller-supplied value is discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct StompEncoder;

impl StompEncoder {
    /// Encode a single frame into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Protocol`] if the frame carries a body its
    /// command does not allow.
    pub fn encode_frame(frame: &Frame) -> Result<Bytes, CodecError> {
        let mut dst = BytesMut::new();
        write_frame(frame, &mut dst)?;
        Ok(dst.freeze())
    }
}

impl Encoder<Frame> for StompEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_frame(&item, dst).map_err(io::Error::from)
    }
}

fn write_frame(frame: &Frame, dst: &mut BytesMut) -> Result<(), CodecError> {
    let Some(command) = frame.command() else {
        dst.put_u8(b'\n');
        return Ok(());
    };
    let body = frame.body();
    if !body.is_empty() && !command.is_body_allowed() {
        return Err(ProtocolError::BodyNotAllowed {
            command,
            len: body.len(),
        }
        .into());
    }

    let escape = !matches!(
        command,
        StompCommand::Connect | StompCommand::Stomp | StompCommand::Connected
    );
    let headers_len: usize = frame
        .headers()
        .iter()
        .map(|(name, value)| name.len() + value.len() + 2)
        .sum();
    dst.reserve(command.as_str().len() + headers_len + body.len() + 32);

    dst.put_slice(command.as_str().as_bytes());
    dst.put_u8(b'\n');
    for (name, value) in frame.headers().iter() {
        if command.requires_content_length() && name == CONTENT_LENGTH {
            continue;
        }
        put_header_text(name, escape, dst);
        dst.put_u8(b':');
        put_header_text(value, escape, dst);
        dst.put_u8(b'\n');
    }
    if command.requires_content_length() {
        dst.put_slice(CONTENT_LENGTH.as_bytes());
        dst.put_u8(b':');
        dst.put_slice(body.len().to_string().as_bytes());
        dst.put_u8(b'\n');
    }
    dst.put_u8(b'\n');
    dst.put_slice(body);
    dst.put_u8(0);
    Ok(())
}

fn put_header_text(text: &str, escape: bool, dst: &mut BytesMut) {
    if !escape {
        dst.put_slice(text.as_bytes());
        return;
    }
    for b in text.bytes() {
        match b {
            b'\r' => dst.put_slice(b"\\r"),
            b'\n' => dst.put_slice(b"\\n"),
            b':' => dst.put_slice(b"\\c"),
            b'\\' => dst.put_slice(b"\\\\"),
            b => dst.put_u8(b),
        }
    }
}
