//! Builders for the frames and messages tests exchange with the relay.

use stomp_relay::{
    Frame,
    RelayMessage,
    StompCommand,
    frame::{ACCEPT_VERSION, DESTINATION, HEART_BEAT, ID, LOGIN, PASSCODE, SUBSCRIPTION},
};

/// Client `CONNECT` for `session_id`, carrying the client's own credentials.
#[must_use]
pub fn client_connect(session_id: &str, heart_beat: &str) -> RelayMessage {
    let frame = Frame::builder(StompCommand::Connect)
        .header(ACCEPT_VERSION, "1.2")
        .header(LOGIN, "client-user")
        .header(PASSCODE, "client-secret")
        .header(HEART_BEAT, heart_beat)
        .build();
    RelayMessage::new(frame)
        .with_session_id(session_id)
        .with_user("user-".to_owned() + session_id)
}

#[must_use]
pub fn client_subscribe(session_id: &str, destination: &str, id: &str) -> RelayMessage {
    let frame = Frame::builder(StompCommand::Subscribe)
        .header(DESTINATION, destination)
        .header(ID, id)
        .build();
    RelayMessage::new(frame).with_session_id(session_id)
}

/// `SEND` to `destination`; pass `None` for a server-originated message.
#[must_use]
pub fn client_send(session_id: Option<&str>, destination: &str, body: &str) -> RelayMessage {
    let frame = Frame::builder(StompCommand::Send)
        .header(DESTINATION, destination)
        .body(body.to_owned())
        .build();
    let message = RelayMessage::new(frame);
    match session_id {
        Some(id) => message.with_session_id(id),
        None => message,
    }
}

#[must_use]
pub fn client_disconnect(session_id: &str) -> RelayMessage {
    RelayMessage::new(Frame::builder(StompCommand::Disconnect).build()).with_session_id(session_id)
}

/// Broker `CONNECTED` answering with `heart_beat`.
#[must_use]
pub fn connected_frame(heart_beat: &str) -> Frame {
    Frame::builder(StompCommand::Connected)
        .header("version", "1.2")
        .header(HEART_BEAT, heart_beat)
        .build()
}

/// Broker `MESSAGE` for a subscription.
#[must_use]
pub fn broker_message(destination: &str, subscription: &str, body: &str) -> Frame {
    Frame::builder(StompCommand::Message)
        .header(DESTINATION, destination)
        .header(SUBSCRIPTION, subscription)
        .header("message-id", "m-1")
        .body(body.to_owned())
        .build()
}
