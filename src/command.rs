//! STOMP command verbs and their structural requirements.
//!
//! Each [`StompCommand`] carries a fixed set of predicates describing which
//! headers a frame with that command must carry and whether it may have a
//! body. The predicates are consulted both when decoding frames from the
//! broker and when deciding whether an application frame may be forwarded.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Generic message classification shared by all messaging protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Session establishment (`CONNECT`, `STOMP`).
    Connect,
    /// Application payload (`SEND`, `MESSAGE`).
    Message,
    /// Subscription request.
    Subscribe,
    /// Subscription removal.
    Unsubscribe,
    /// Session termination.
    Disconnect,
    /// Keep-alive with no command.
    Heartbeat,
    /// Any other verb.
    Other,
}

/// STOMP 1.2 command verbs sent by clients and servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StompCommand {
    // client
    Connect,
    Stomp,
    Disconnect,
    Subscribe,
    Unsubscribe,
    Send,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    // server
    Connected,
    Message,
    Receipt,
    Error,
}

#[derive(Clone, Copy)]
struct Traits {
    message_type: MessageType,
    destination: bool,
    subscription_id: bool,
    content_length: bool,
    body: bool,
}

impl Traits {
    const fn of(message_type: MessageType) -> Self {
        Self {
            message_type,
            destination: false,
            subscription_id: false,
            content_length: false,
            body: false,
        }
    }

    const fn destination(mut self) -> Self {
        self.destination = true;
        self
    }

    const fn subscription_id(mut self) -> Self {
        self.subscription_id = true;
        self
    }

    const fn payload(mut self) -> Self {
        self.content_length = true;
        self.body = true;
        self
    }
}

impl StompCommand {
    /// Every command, client verbs first.
    pub const ALL: [StompCommand; 15] = [
        Self::Connect,
        Self::Stomp,
        Self::Disconnect,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::Send,
        Self::Ack,
        Self::Nack,
        Self::Begin,
        Self::Commit,
        Self::Abort,
        Self::Connected,
        Self::Message,
        Self::Receipt,
        Self::Error,
    ];

    const fn traits(self) -> Traits {
        match self {
            Self::Connect | Self::Stomp => Traits::of(MessageType::Connect),
            Self::Disconnect => Traits::of(MessageType::Disconnect),
            Self::Subscribe => Traits::of(MessageType::Subscribe)
                .destination()
                .subscription_id(),
            Self::Unsubscribe => Traits::of(MessageType::Unsubscribe).subscription_id(),
            Self::Send => Traits::of(MessageType::Message).destination().payload(),
            Self::Message => Traits::of(MessageType::Message)
                .destination()
                .subscription_id()
                .payload(),
            Self::Error => Traits::of(MessageType::Other).payload(),
            Self::Ack
            | Self::Nack
            | Self::Begin
            | Self::Commit
            | Self::Abort
            | Self::Connected
            | Self::Receipt => Traits::of(MessageType::Other),
        }
    }

    /// Generic message type this command maps to.
    #[must_use]
    pub const fn message_type(self) -> MessageType { self.traits().message_type }

    /// Whether frames with this command must carry a `destination` header.
    #[must_use]
    pub const fn requires_destination(self) -> bool { self.traits().destination }

    /// Whether frames with this command must carry a subscription `id`.
    #[must_use]
    pub const fn requires_subscription_id(self) -> bool { self.traits().subscription_id }

    /// Whether a `content-length` header must be resolvable for this command.
    #[must_use]
    pub const fn requires_content_length(self) -> bool { self.traits().content_length }

    /// Whether frames with this command may carry a body.
    #[must_use]
    pub const fn is_body_allowed(self) -> bool { self.traits().body }

    /// Returns `true` for `CONNECT` and its `STOMP` alias.
    #[must_use]
    pub const fn is_connect(self) -> bool {
        matches!(self.message_type(), MessageType::Connect)
    }

    /// Returns `true` for verbs only a server may send.
    #[must_use]
    pub const fn is_server_command(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::Message | Self::Receipt | Self::Error
        )
    }

    /// The verb as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Disconnect => "DISCONNECT",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Send => "SEND",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Connected => "CONNECTED",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Error returned when a command line does not name a STOMP verb.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown STOMP command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for StompCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_owned()))
    }
}
