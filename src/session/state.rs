//! Session lifecycle state machine.

/// Lifecycle state of a client session.
///
/// A session always moves forward:
/// `Connecting → AwaitingHandshake → Active → Closing → Done`, with failure
/// shortcuts straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Transport connection being established.
    #[default]
    Connecting,
    /// Connected; waiting for the remote's open frame.
    AwaitingHandshake,
    /// Ping/pong exchange in progress.
    Active,
    /// Draining and releasing the transport.
    Closing,
    /// Terminal; the session result has been produced.
    Done,
}

impl SessionState {
    /// Whether the session has produced its terminal result.
    #[must_use]
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done)
    }

    /// Whether the session may emit pings in this state.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Connecting => "Connecting",
            SessionState::AwaitingHandshake => "AwaitingHandshake",
            SessionState::Active => "Active",
            SessionState::Closing => "Closing",
            SessionState::Done => "Done",
        };
        f.write_str(name)
    }
}
