//! Ordered multi-valued header storage for STOMP frames.
//!
//! A header name may repeat. Lookups return the first occurrence, which
//! STOMP treats as the authoritative value.

use std::fmt;

/// `content-length` header name.
pub const CONTENT_LENGTH: &str = "content-length";
/// `content-type` header name.
pub const CONTENT_TYPE: &str = "content-type";
/// `destination` header name.
pub const DESTINATION: &str = "destination";
/// Subscription identifier on `SUBSCRIBE` and `UNSUBSCRIBE`.
pub const ID: &str = "id";
/// Subscription identifier on `MESSAGE`.
pub const SUBSCRIPTION: &str = "subscription";
/// Receipt requested by a client frame.
pub const RECEIPT: &str = "receipt";
/// Receipt acknowledged by a `RECEIPT` frame.
pub const RECEIPT_ID: &str = "receipt-id";
/// `login` header name.
pub const LOGIN: &str = "login";
/// `passcode` header name.
pub const PASSCODE: &str = "passcode";
/// Virtual host on `CONNECT`.
pub const HOST: &str = "host";
/// Heartbeat negotiation header.
pub const HEART_BEAT: &str = "heart-beat";
/// Versions offered by the client.
pub const ACCEPT_VERSION: &str = "accept-version";
/// Human-readable error summary on `ERROR`.
pub const MESSAGE: &str = "message";

/// Header name/value pairs in wire order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// First value recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value recorded for `name`, in wire order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if at least one value exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    /// Append a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every value for `name` with a single value.
    ///
    /// The new value takes the position of the first existing occurrence so
    /// the header order on the wire stays stable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter().position(|(key, _)| *key == name) {
            Some(index) => {
                self.entries[index].1 = value;
                let mut seen = false;
                self.entries.retain(|(key, _)| {
                    if *key != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Remove every value for `name`, returning the first one.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_owned);
        self.entries.retain(|(key, _)| key != name);
        first
    }

    /// Copy every entry from `other` onto the end of this map.
    pub fn extend_from(&mut self, other: &HeaderMap) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Remove all entries.
    pub fn clear(&mut self) { self.entries.clear(); }

    /// Iterate over all entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of entries, counting repeated names.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Heartbeat intervals in milliseconds as carried by the `heart-beat` header.
///
/// `send` is how often the sender of the header promises to emit heartbeats;
/// `receive` is how often it wants to receive them. Zero disables a
/// direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeartBeat {
    /// Outgoing interval in milliseconds.
    pub send: u64,
    /// Incoming interval in milliseconds.
    pub receive: u64,
}

impl HeartBeat {
    /// Create a new interval pair.
    #[must_use]
    pub const fn new(send: u64, receive: u64) -> Self { Self { send, receive } }

    /// Parse a `cx,cy` header value.
    ///
    /// Missing or malformed fields read as zero.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(',').map(|part| part.trim().parse::<u64>().unwrap_or(0));
        let send = parts.next().unwrap_or(0);
        let receive = parts.next().unwrap_or(0);
        Self { send, receive }
    }
}

impl fmt::Display for HeartBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.send, self.receive)
    }
}
