//! Frame classification and correlation-entry parsing.
//!
//! The remote speaks single-character-tagged text frames: `o` acknowledges
//! the open handshake, `a` carries a JSON array of correlation strings, and
//! `c` announces close. Each correlation string is `"<identity>,<nanos>"`,
//! both integer-valued; a broadcast remote may tag several clients' pings
//! inside one array.

use std::time::Duration;

use crate::error::{Error, Result};

/// One correlation entry inside a message frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Correlation key of the client the entry answers.
    pub identity: u64,
    /// Send timestamp embedded by that client, nanoseconds since the epoch.
    pub timestamp_ns: u64,
}

impl Entry {
    /// Parse a `"<identity>,<timestamp>"` correlation string.
    ///
    /// Returns `None` for malformed or non-numeric entries; callers skip
    /// those rather than failing the frame.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (identity, timestamp) = raw.split_once(',')?;
        Some(Self {
            identity: identity.parse().ok()?,
            timestamp_ns: timestamp.parse().ok()?,
        })
    }

    /// Round-trip time of this entry relative to `now_ns`.
    ///
    /// Saturates to zero if the embedded timestamp is in the future
    /// (clock skew between peers).
    #[must_use]
    pub fn rtt(&self, now_ns: u64) -> Duration {
        Duration::from_nanos(now_ns.saturating_sub(self.timestamp_ns))
    }
}

/// One decoded unit of the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Handshake acknowledgement; must be the first frame after connecting.
    Open,
    /// Correlation entries, malformed members already skipped.
    Message(Vec<Entry>),
    /// Remote terminated the stream.
    Close,
}

impl Frame {
    /// Classify and parse a raw frame.
    ///
    /// Payloads of `o` and `c` frames are ignored. The `a` payload must be a
    /// JSON array of strings; individual entries that fail to parse are
    /// dropped silently, but an unparseable array body is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for an empty frame, an unrecognized type
    /// byte, or a message frame whose body is not a JSON string array.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let (&tag, body) = raw
            .split_first()
            .ok_or_else(|| Error::Decode("empty frame".into()))?;
        match tag {
            b'o' => Ok(Frame::Open),
            b'c' => Ok(Frame::Close),
            b'a' => {
                let strings: Vec<String> = serde_json::from_slice(body)
                    .map_err(|e| Error::Decode(format!("message payload: {e}")))?;
                let entries = strings.iter().filter_map(|s| Entry::parse(s)).collect();
                Ok(Frame::Message(entries))
            }
            other => Err(Error::Decode(format!(
                "unrecognized frame type byte {other:#04x}"
            ))),
        }
    }

    /// Short name of the frame kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Open => "open",
            Frame::Message(_) => "message",
            Frame::Close => "close",
        }
    }
}

/// Encode an outgoing ping: a JSON array literal with exactly one
/// `"<identity>,<nanos>"` string. Deterministic, no side effects.
#[must_use]
pub fn encode_ping(identity: u64, timestamp_ns: u64) -> String {
    format!("[\"{identity},{timestamp_ns}\"]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open() {
        assert_eq!(Frame::decode(b"o").unwrap(), Frame::Open);
        // Payload after the tag is ignored.
        assert_eq!(Frame::decode(b"open").unwrap(), Frame::Open);
    }

    #[test]
    fn test_decode_close() {
        assert_eq!(Frame::decode(b"c").unwrap(), Frame::Close);
        assert_eq!(Frame::decode(b"c[3000,\"done\"]").unwrap(), Frame::Close);
    }

    #[test]
    fn test_decode_empty_frame() {
        assert!(matches!(Frame::decode(b""), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_tag() {
        let err = Frame::decode(b"x").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().contains("0x78"));
    }

    #[test]
    fn test_decode_single_entry() {
        let frame = Frame::decode(b"a[\"42,1000000\"]").unwrap();
        assert_eq!(
            frame,
            Frame::Message(vec![Entry {
                identity: 42,
                timestamp_ns: 1_000_000,
            }])
        );
    }

    #[test]
    fn test_decode_multiple_entries() {
        let frame = Frame::decode(b"a[\"1,10\",\"2,20\",\"3,30\"]").unwrap();
        let Frame::Message(entries) = frame else {
            panic!("expected message frame");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].identity, 1);
        assert_eq!(entries[2].timestamp_ns, 30);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        // Missing comma, non-numeric identity, non-numeric timestamp, empty.
        let frame =
            Frame::decode(b"a[\"nocomma\",\"abc,10\",\"7,xyz\",\"\",\"9,90\"]").unwrap();
        assert_eq!(
            frame,
            Frame::Message(vec![Entry {
                identity: 9,
                timestamp_ns: 90,
            }])
        );
    }

    #[test]
    fn test_invalid_json_body_is_fatal() {
        assert!(Frame::decode(b"a{not json").is_err());
        assert!(Frame::decode(b"a[1,2,3]").is_err());
    }

    #[test]
    fn test_decode_empty_array() {
        assert_eq!(Frame::decode(b"a[]").unwrap(), Frame::Message(vec![]));
    }

    #[test]
    fn test_encode_ping_shape() {
        assert_eq!(encode_ping(42, 1_000_000), "[\"42,1000000\"]");
    }

    #[test]
    fn test_encoded_ping_survives_message_decode() {
        // The remote tags pings back verbatim inside message frames; a
        // synthetic message built from our own encoding must reproduce the
        // exact pair.
        let ping = encode_ping(987_654, 123_456_789);
        let frame = Frame::decode(format!("a{ping}").as_bytes()).unwrap();
        assert_eq!(
            frame,
            Frame::Message(vec![Entry {
                identity: 987_654,
                timestamp_ns: 123_456_789,
            }])
        );
    }

    #[test]
    fn test_entry_rtt() {
        let entry = Entry {
            identity: 1,
            timestamp_ns: 1_000,
        };
        assert_eq!(entry.rtt(3_500), Duration::from_nanos(2_500));
        // Future timestamp saturates instead of underflowing.
        assert_eq!(entry.rtt(500), Duration::ZERO);
    }

    #[test]
    fn test_frame_kind() {
        assert_eq!(Frame::Open.kind(), "open");
        assert_eq!(Frame::Message(vec![]).kind(), "message");
        assert_eq!(Frame::Close.kind(), "close");
    }
}
