//! Per-session statistics and the terminal session result.

use std::time::{Duration, Instant};

use crate::error::Error;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Ran to its deadline, finish signal, or a remote close.
    Completed,
    /// Aborted by the contained error.
    Failed(Error),
}

impl SessionStatus {
    /// Whether the session failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, SessionStatus::Failed(_))
    }

    /// The failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Error> {
        match self {
            SessionStatus::Completed => None,
            SessionStatus::Failed(err) => Some(err),
        }
    }
}

/// One session's complete measurement record.
///
/// Created when the session goes active, mutated only by its owning session,
/// and immutable once emitted to the ramp controller. Every spawned session
/// emits exactly one of these, failed or not.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// When the session entered its active exchange phase.
    pub started_at: Instant,
    /// When the session reached its terminal state.
    pub finished_at: Instant,
    /// Pings emitted.
    pub sent: u64,
    /// Correlation entries matched to this session's own identity.
    pub recv: u64,
    /// Fastest observed round trip. Stays at the [`Duration::MAX`] sentinel
    /// until the first pong is matched.
    pub min_rtt: Duration,
    /// Slowest observed round trip; zero until the first pong is matched.
    pub max_rtt: Duration,
    /// Smoothed round trip: `avg = (avg + delta) / 2` per matched pong.
    /// An exponential half-weight smoothing, not a true mean; consumers of
    /// the metric rely on exactly this shape.
    pub avg_rtt: Duration,
    /// Terminal status.
    pub status: SessionStatus,
}

impl SessionResult {
    /// Start a measurement record with sentinel latencies.
    pub(crate) fn begin() -> Self {
        let now = Instant::now();
        Self {
            started_at: now,
            finished_at: now,
            sent: 0,
            recv: 0,
            min_rtt: Duration::MAX,
            max_rtt: Duration::ZERO,
            avg_rtt: Duration::ZERO,
            status: SessionStatus::Completed,
        }
    }

    pub(crate) fn record_sent(&mut self) {
        self.sent += 1;
    }

    /// Fold one matched pong into the latency bounds.
    pub(crate) fn record_pong(&mut self, delta: Duration) {
        if delta < self.min_rtt {
            self.min_rtt = delta;
        }
        if delta > self.max_rtt {
            self.max_rtt = delta;
        }
        self.avg_rtt = (self.avg_rtt + delta) / 2;
        self.recv += 1;
    }

    /// Seal the record with its terminal status and end timestamp.
    pub(crate) fn finish(mut self, status: SessionStatus) -> Self {
        self.finished_at = Instant::now();
        self.status = status;
        self
    }

    /// Length of the active measurement window.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    /// Whether any pong was matched (the latency fields are meaningful).
    #[must_use]
    pub const fn has_latency(&self) -> bool {
        self.recv > 0
    }
}
