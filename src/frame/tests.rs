//! Tests for frame values, header maps and heartbeat parsing.

use rstest::rstest;

use super::{DESTINATION, Frame, HeaderMap, HeartBeat, ID, SUBSCRIPTION};
use crate::{codec::ProtocolError, command::StompCommand};

#[test]
fn header_map_returns_first_value_for_repeated_names() {
    let mut headers = HeaderMap::new();
    headers.append("foo", "one");
    headers.append("bar", "x");
    headers.append("foo", "two");

    assert_eq!(headers.get("foo"), Some("one"));
    assert_eq!(headers.get_all("foo").collect::<Vec<_>>(), ["one", "two"]);
    assert_eq!(headers.len(), 3);
}

#[test]
fn header_map_set_collapses_repeats_in_place() {
    let mut headers: HeaderMap = [("a", "1"), ("login", "client"), ("b", "2"), ("login", "again")]
        .into_iter()
        .collect();

    headers.set("login", "relay");

    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        [("a", "1"), ("login", "relay"), ("b", "2")]
    );
}

#[test]
fn header_map_remove_returns_first_value() {
    let mut headers: HeaderMap = [("k", "v1"), ("k", "v2")].into_iter().collect();
    assert_eq!(headers.remove("k").as_deref(), Some("v1"));
    assert!(headers.is_empty());
    assert_eq!(headers.remove("k"), None);
}

#[rstest]
#[case("10000,5000", HeartBeat::new(10000, 5000))]
#[case(" 0 , 250 ", HeartBeat::new(0, 250))]
#[case("garbage", HeartBeat::new(0, 0))]
#[case("100", HeartBeat::new(100, 0))]
fn parses_heart_beat_values(#[case] raw: &str, #[case] expected: HeartBeat) {
    assert_eq!(HeartBeat::parse(raw), expected);
}

#[test]
fn heart_beat_renders_as_header_value() {
    assert_eq!(HeartBeat::new(10, 20).to_string(), "10,20");
}

#[test]
fn builder_rewrite_produces_new_frame() {
    let original = Frame::builder(StompCommand::Connect)
        .header("login", "client")
        .build();
    let rewritten = original.to_builder().set_header("login", "relay").build();

    assert_eq!(original.header("login"), Some("client"));
    assert_eq!(rewritten.header("login"), Some("relay"));
}

#[test]
fn subscription_id_depends_on_command() {
    let message = Frame::builder(StompCommand::Message)
        .header(SUBSCRIPTION, "sub-1")
        .header(ID, "ignored")
        .build();
    let subscribe = Frame::builder(StompCommand::Subscribe)
        .header(ID, "sub-2")
        .build();

    assert_eq!(message.subscription_id(), Some("sub-1"));
    assert_eq!(subscribe.subscription_id(), Some("sub-2"));
}

#[test]
fn validate_requires_destination() {
    let frame = Frame::builder(StompCommand::Send).body("x").build();
    assert_eq!(
        frame.validate(),
        Err(ProtocolError::MissingHeader {
            command: StompCommand::Send,
            header: DESTINATION,
        })
    );
}

#[test]
fn validate_requires_subscription_id() {
    let frame = Frame::builder(StompCommand::Subscribe)
        .header(DESTINATION, "/topic/a")
        .build();
    assert_eq!(
        frame.validate(),
        Err(ProtocolError::MissingHeader {
            command: StompCommand::Subscribe,
            header: ID,
        })
    );
}

#[test]
fn validate_rejects_body_on_bodiless_command() {
    let frame = Frame::builder(StompCommand::Ack)
        .header(ID, "1")
        .body("nope")
        .build();
    assert!(matches!(
        frame.validate(),
        Err(ProtocolError::BodyNotAllowed { len: 4, .. })
    ));
}

#[test]
fn validate_rejects_unparsable_content_length() {
    let frame = Frame::builder(StompCommand::Send)
        .header(DESTINATION, "/queue/a")
        .header("content-length", "ten")
        .build();
    assert!(matches!(
        frame.validate(),
        Err(ProtocolError::InvalidContentLength { .. })
    ));
}

#[test]
fn heartbeats_are_always_valid() {
    let frame = Frame::heartbeat();
    assert!(frame.is_heartbeat());
    assert_eq!(frame.validate(), Ok(()));
}
