//! Typed messages exchanged with the application.
//!
//! A [`RelayMessage`] pairs a STOMP [`Frame`] with the routing metadata the
//! relay needs: the logical client session it belongs to and the
//! authenticated user, if any. Messages travelling from the broker back to
//! clients carry the session id of the connection they arrived on.

use crate::{
    command::{MessageType, StompCommand},
    frame::{Frame, HeartBeat},
};

/// A frame plus its session routing metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayMessage {
    session_id: Option<String>,
    user: Option<String>,
    frame: Frame,
}

impl RelayMessage {
    /// Wrap `frame` with no session or user.
    #[must_use]
    pub fn new(frame: Frame) -> Self {
        Self {
            session_id: None,
            user: None,
            frame,
        }
    }

    /// Attach a session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach a user principal name.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Replace the frame, keeping the routing metadata.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> { self.session_id.as_deref() }

    #[must_use]
    pub fn user(&self) -> Option<&str> { self.user.as_deref() }

    #[must_use]
    pub const fn frame(&self) -> &Frame { &self.frame }

    /// Consume the message, returning its frame.
    #[must_use]
    pub fn into_frame(self) -> Frame { self.frame }

    #[must_use]
    pub const fn command(&self) -> Option<StompCommand> { self.frame.command() }

    /// Generic message type; heartbeats map to [`MessageType::Heartbeat`].
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.frame
            .command()
            .map_or(MessageType::Heartbeat, StompCommand::message_type)
    }

    #[must_use]
    pub fn destination(&self) -> Option<&str> { self.frame.destination() }

    #[must_use]
    pub fn receipt(&self) -> Option<&str> { self.frame.receipt() }

    #[must_use]
    pub fn heart_beat(&self) -> HeartBeat { self.frame.heart_beat() }

    #[must_use]
    pub fn payload(&self) -> &[u8] { self.frame.body() }

    /// One-line summary for logs: command, session, destination and size.
    #[must_use]
    pub fn short_log(&self) -> String {
        let command = self
            .command()
            .map_or("HEARTBEAT", StompCommand::as_str);
        let mut out = format!("{command} session={}", self.session_id().unwrap_or("-"));
        if let Some(destination) = self.destination() {
            out.push_str(" destination=");
            out.push_str(destination);
        }
        if !self.payload().is_empty() {
            out.push_str(&format!(" payload={}B", self.payload().len()));
        }
        out
    }
}

impl From<Frame> for RelayMessage {
    fn from(frame: Frame) -> Self { Self::new(frame) }
}

#[cfg(test)]
mod tests {
    use super::RelayMessage;
    use crate::{
        command::{MessageType, StompCommand},
        frame::{DESTINATION, Frame},
    };

    #[test]
    fn heartbeat_has_heartbeat_type() {
        let message = RelayMessage::new(Frame::heartbeat()).with_session_id("s1");
        assert_eq!(message.message_type(), MessageType::Heartbeat);
        assert_eq!(message.short_log(), "HEARTBEAT session=s1");
    }

    #[test]
    fn short_log_summarises_destination_and_size() {
        let frame = Frame::builder(StompCommand::Send)
            .header(DESTINATION, "/queue/a")
            .body("hello")
            .build();
        let message = RelayMessage::from(frame);
        assert_eq!(message.message_type(), MessageType::Message);
        assert_eq!(
            message.short_log(),
            "SEND session=- destination=/queue/a payload=5B"
        );
    }
}
