//! Immutable STOMP frame values.
//!
//! A [`Frame`] is never mutated in place. Rewriting headers on the way
//! through the relay goes through [`Frame::to_builder`], which yields a
//! [`FrameBuilder`] whose [`build`](FrameBuilder::build) produces a fresh
//! frame. Heartbeats are frames without a command.

mod headers;

use bytes::Bytes;
pub use headers::{
    ACCEPT_VERSION,
    CONTENT_LENGTH,
    CONTENT_TYPE,
    DESTINATION,
    HEART_BEAT,
    HOST,
    HeaderMap,
    HeartBeat,
    ID,
    LOGIN,
    MESSAGE,
    PASSCODE,
    RECEIPT,
    RECEIPT_ID,
    SUBSCRIPTION,
};

use crate::{codec::ProtocolError, command::StompCommand};

/// A decoded STOMP unit: command, headers and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    command: Option<StompCommand>,
    headers: HeaderMap,
    body: Bytes,
}

impl Frame {
    /// Start building a frame for `command`.
    #[must_use]
    pub fn builder(command: StompCommand) -> FrameBuilder { FrameBuilder::new(command) }

    /// A keep-alive frame.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self {
            command: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Command verb, or `None` for a heartbeat.
    #[must_use]
    pub const fn command(&self) -> Option<StompCommand> { self.command }

    /// Returns `true` if this frame is a heartbeat.
    #[must_use]
    pub const fn is_heartbeat(&self) -> bool { self.command.is_none() }

    /// Borrow the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap { &self.headers }

    /// Borrow the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes { &self.body }

    /// First value of header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }

    #[must_use]
    pub fn destination(&self) -> Option<&str> { self.header(DESTINATION) }

    #[must_use]
    pub fn receipt(&self) -> Option<&str> { self.header(RECEIPT) }

    /// Subscription identifier, read from `subscription` on `MESSAGE` and
    /// from `id` elsewhere.
    #[must_use]
    pub fn subscription_id(&self) -> Option<&str> {
        match self.command {
            Some(StompCommand::Message) => self.header(SUBSCRIPTION),
            _ => self.header(ID),
        }
    }

    /// Parsed `content-length`, if present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.header(CONTENT_LENGTH)
            .and_then(|value| value.trim().parse().ok())
    }

    /// Parsed `heart-beat` header, zero when absent.
    #[must_use]
    pub fn heart_beat(&self) -> HeartBeat {
        self.header(HEART_BEAT)
            .map(HeartBeat::parse)
            .unwrap_or_default()
    }

    /// Copy this frame into a builder for rewriting.
    #[must_use]
    pub fn to_builder(&self) -> FrameBuilder { self.clone().into_builder() }

    /// Turn this frame into a builder for rewriting.
    #[must_use]
    pub fn into_builder(self) -> FrameBuilder {
        FrameBuilder {
            command: self.command,
            headers: self.headers,
            body: self.body,
        }
    }

    /// Check the structural requirements of the frame's command.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] naming the first violated requirement.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let Some(command) = self.command else {
            return Ok(());
        };
        if command.requires_destination() && self.destination().is_none() {
            return Err(ProtocolError::MissingHeader {
                command,
                header: DESTINATION,
            });
        }
        if command.requires_subscription_id() && self.subscription_id().is_none() {
            let header = if command == StompCommand::Message {
                SUBSCRIPTION
            } else {
                ID
            };
            return Err(ProtocolError::MissingHeader { command, header });
        }
        if command.requires_content_length()
            && self.headers.contains(CONTENT_LENGTH)
            && self.content_length().is_none()
        {
            return Err(ProtocolError::InvalidContentLength {
                value: self.header(CONTENT_LENGTH).unwrap_or_default().to_owned(),
            });
        }
        if !self.body.is_empty() && !command.is_body_allowed() {
            return Err(ProtocolError::BodyNotAllowed {
                command,
                len: self.body.len(),
            });
        }
        Ok(())
    }
}

/// One-shot builder producing an immutable [`Frame`].
#[derive(Clone, Debug)]
pub struct FrameBuilder {
    command: Option<StompCommand>,
    headers: HeaderMap,
    body: Bytes,
}

impl FrameBuilder {
    /// Start a frame for `command` with no headers and an empty body.
    #[must_use]
    pub fn new(command: StompCommand) -> Self {
        Self {
            command: Some(command),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header value, keeping earlier values for the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace all values of a header.
    #[must_use]
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Drop all values of a header.
    #[must_use]
    pub fn remove_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Replace the full header map.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Finish the frame.
    #[must_use]
    pub fn build(self) -> Frame {
        Frame {
            command: self.command,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests;
