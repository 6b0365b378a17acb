//! Single-pass STOMP frame parser.
//!
//! [`StompDecoder`] consumes as many complete frames as a buffer holds and
//! leaves any trailing partial frame in place. When it stops on a partial
//! frame whose header block was already complete (or partly complete), the
//! headers seen so far are reported so the caller can learn the declared
//! `content-length` ahead of time.

use bytes::{Buf, BytesMut};

use super::{CodecError, FrameParser, FramingError};
use crate::{
    command::StompCommand,
    frame::{CONTENT_LENGTH, Frame, FrameBuilder, HeaderMap},
};

/// Stateless STOMP 1.2 frame parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct StompDecoder;

/// Outcome of one attempt to read a frame starting at a given offset.
enum Step {
    /// A frame ending `consumed` bytes after the start.
    Frame {
        command: StompCommand,
        headers: HeaderMap,
        body: std::ops::Range<usize>,
        consumed: usize,
    },
    /// Only line terminators up to the end of input.
    Heartbeat { consumed: usize },
    /// Not enough input; `headers` holds every complete header line seen.
    Incomplete { headers: HeaderMap },
}

impl FrameParser for StompDecoder {
    fn parse(
        &mut self,
        buffer: &mut BytesMut,
        partial_headers: &mut HeaderMap,
    ) -> Result<Vec<Frame>, CodecError> {
        let mut frames = Vec::new();
        while !buffer.is_empty() {
            match next_step(buffer)? {
                Step::Frame {
                    command,
                    headers,
                    body,
                    consumed,
                } => {
                    let chunk = buffer.split_to(consumed).freeze();
                    let frame = FrameBuilder::new(command)
                        .headers(headers)
                        .body(chunk.slice(body))
                        .build();
                    frame.validate()?;
                    tracing::trace!(command = %command, "decoded frame");
                    frames.push(frame);
                    skip_eol(buffer);
                }
                Step::Heartbeat { consumed } => {
                    buffer.advance(consumed);
                    frames.push(Frame::heartbeat());
                }
                Step::Incomplete { headers } => {
                    partial_headers.extend_from(&headers);
                    break;
                }
            }
        }
        Ok(frames)
    }
}

/// Consume line terminators left after a frame's NUL octet.
fn skip_eol(buffer: &mut BytesMut) {
    let mut skip = 0;
    loop {
        match &buffer[skip..] {
            [b'\n', ..] => skip += 1,
            [b'\r', b'\n', ..] => skip += 2,
            _ => break,
        }
    }
    buffer.advance(skip);
}

/// Find the next line starting at `pos`, returning the line without its
/// terminator and the offset just past the terminator.
fn read_line(input: &[u8], pos: usize) -> Result<Option<(&[u8], usize)>, FramingError> {
    let Some(rel) = input[pos..].iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };
    let mut line = &input[pos..pos + rel];
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    if line.contains(&b'\r') {
        return Err(FramingError::BareCarriageReturn);
    }
    Ok(Some((line, pos + rel + 1)))
}

fn next_step(input: &[u8]) -> Result<Step, CodecError> {
    // Leading line terminators (and stray NULs) are keep-alives.
    let mut pos = 0;
    while pos < input.len() {
        match &input[pos..] {
            [b'\n' | 0, ..] => pos += 1,
            [b'\r', b'\n', ..] => pos += 2,
            [b'\r'] => {
                return Ok(Step::Incomplete {
                    headers: HeaderMap::new(),
                });
            }
            _ => break,
        }
    }
    if pos == input.len() {
        return Ok(Step::Heartbeat { consumed: pos });
    }

    let Some((command_line, mut pos)) = read_line(input, pos)? else {
        return Ok(Step::Incomplete {
            headers: HeaderMap::new(),
        });
    };
    let command: StompCommand = utf8(command_line)?.parse()?;
    let unescape = !matches!(
        command,
        StompCommand::Connect | StompCommand::Stomp | StompCommand::Connected
    );

    let mut headers = HeaderMap::new();
    loop {
        let Some((line, next)) = read_line(input, pos)? else {
            return Ok(Step::Incomplete { headers });
        };
        pos = next;
        if line.is_empty() {
            break;
        }
        let (name, value) = split_header(line)?;
        if unescape {
            headers.append(unescape_header(name)?, unescape_header(value)?);
        } else {
            headers.append(name, value);
        }
    }

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.trim().parse::<usize>().ok());
    match content_length {
        Some(len) => {
            // Body plus the terminating NUL.
            if input.len() - pos <= len {
                return Ok(Step::Incomplete { headers });
            }
            if input[pos + len] != 0 {
                return Err(FramingError::MissingNulTerminator.into());
            }
            Ok(Step::Frame {
                command,
                headers,
                body: pos..pos + len,
                consumed: pos + len + 1,
            })
        }
        None => match input[pos..].iter().position(|&b| b == 0) {
            Some(rel) => Ok(Step::Frame {
                command,
                headers,
                body: pos..pos + rel,
                consumed: pos + rel + 1,
            }),
            None => Ok(Step::Incomplete { headers }),
        },
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, FramingError> {
    std::str::from_utf8(bytes).map_err(|_| FramingError::InvalidUtf8)
}

fn split_header(line: &[u8]) -> Result<(&str, &str), FramingError> {
    let text = utf8(line)?;
    match text.find(':') {
        Some(colon) if colon > 0 => Ok((&text[..colon], &text[colon + 1..])),
        _ => Err(FramingError::MalformedHeader {
            line: text.to_owned(),
        }),
    }
}

/// Reverse STOMP 1.2 header escaping.
pub(crate) fn unescape_header(raw: &str) -> Result<String, FramingError> {
    if !raw.contains('\\') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(FramingError::InvalidEscape(other)),
            None => return Err(FramingError::TruncatedEscape),
        }
    }
    Ok(out)
}
