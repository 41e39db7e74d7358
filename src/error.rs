//! Error types for the load harness.
//!
//! Every session-level failure is folded into one of these variants and
//! carried inside the session's terminal result; errors never unwind across
//! task boundaries.

use thiserror::Error;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Run configuration rejected before anything was spawned.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The transport connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The remote violated the protocol at open.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Transport read or write failure mid-session.
    #[error("I/O error: {0}")]
    Io(String),

    /// The frame could not be decoded (unrecognized type byte or
    /// unparseable message payload).
    #[error("frame decode failed: {0}")]
    Decode(String),

    /// Connect + handshake did not complete within the configured bound.
    #[error("timed out establishing session")]
    Timeout,
}

/// Coarse failure classification used for per-ramp breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    Config,
    Connect,
    Handshake,
    Io,
    Decode,
    Timeout,
}

impl Error {
    /// The failure class of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Config(_) => FailureKind::Config,
            Error::Connect(_) => FailureKind::Connect,
            Error::Handshake(_) => FailureKind::Handshake,
            Error::Io(_) => FailureKind::Io,
            Error::Decode(_) => FailureKind::Decode,
            Error::Timeout => FailureKind::Timeout,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Config => "config",
            FailureKind::Connect => "connect",
            FailureKind::Handshake => "handshake",
            FailureKind::Io => "io",
            FailureKind::Decode => "decode",
            FailureKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Handshake("expected open frame, got close".into());
        assert_eq!(
            err.to_string(),
            "handshake failed: expected open frame, got close"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), FailureKind::Io);
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(Error::Timeout.kind(), FailureKind::Timeout);
        assert_eq!(Error::Connect("refused".into()).kind(), FailureKind::Connect);
        assert_eq!(Error::Decode("bad byte".into()).kind(), FailureKind::Decode);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Handshake.to_string(), "handshake");
        assert_eq!(FailureKind::Io.to_string(), "io");
    }

    #[test]
    fn test_error_clone() {
        let err = Error::Timeout;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
