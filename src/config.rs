//! Run configuration.
//!
//! A [`RunConfig`] is constructed once (by the CLI front end or a test),
//! validated, and passed read-only into the ramp controller. Nothing in the
//! harness mutates configuration after startup.

use std::time::Duration;

use crate::error::{Error, Result};

/// Concurrency levels used when none are specified.
pub const DEFAULT_RAMPS: [usize; 9] = [5, 25, 50, 100, 150, 200, 300, 500, 1000];

/// How sessions generate their send cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Each session emits its next ping as soon as the previous pong is
    /// matched, until the duration elapses.
    SelfPaced {
        /// Wall-clock window each session keeps sending for.
        session_duration: Duration,
    },
    /// A shared pacer triggers sends across all sessions at an aggregate
    /// target rate, up to a total message budget.
    Driven {
        /// Target aggregate message rate, messages per second.
        rate: u32,
        /// Total number of pings issued across the whole level.
        total_messages: u64,
    },
}

/// Immutable configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Concurrency levels, ascending. One ramp is executed per level.
    pub ramps: Vec<usize>,

    /// Send cadence mode shared by every session in the run.
    pub pacing: Pacing,

    /// Pause between ramp levels so residual load from one level does not
    /// contaminate the next measurement.
    pub settle_delay: Duration,

    /// Bound on connect + handshake per session. The active loop itself is
    /// never timed out.
    pub connect_timeout: Duration,

    /// Worker threads for the runtime built by the binary front end.
    pub worker_threads: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ramps: DEFAULT_RAMPS.to_vec(),
            pacing: Pacing::SelfPaced {
                session_duration: Duration::from_secs(10),
            },
            settle_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            worker_threads: 1,
        }
    }
}

impl RunConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the ramp list is empty, contains a zero
    /// level, is not strictly ascending, or if the pacing parameters are
    /// degenerate (zero duration, zero rate, zero worker threads).
    pub fn validate(&self) -> Result<()> {
        if self.ramps.is_empty() {
            return Err(Error::Config("ramp list is empty".into()));
        }
        if self.ramps.contains(&0) {
            return Err(Error::Config("ramp levels must be positive".into()));
        }
        if self.ramps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config("ramp levels must be strictly ascending".into()));
        }
        match self.pacing {
            Pacing::SelfPaced { session_duration } => {
                if session_duration.is_zero() {
                    return Err(Error::Config("session duration must be non-zero".into()));
                }
            }
            Pacing::Driven { rate, .. } => {
                if rate == 0 {
                    return Err(Error::Config("message rate must be positive".into()));
                }
            }
        }
        if self.worker_threads == 0 {
            return Err(Error::Config("worker thread count must be positive".into()));
        }
        Ok(())
    }
}
