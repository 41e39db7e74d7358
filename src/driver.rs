//! External pacing for driven sessions.
//!
//! One pacer per ramp level round-robins send triggers across every active
//! session at a target aggregate rate, then signals finish so sessions drain
//! and report.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::session::SessionCommand;

/// Issues timed [`SessionCommand`]s to a set of driven sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    rate: u32,
    total: u64,
}

impl Pacer {
    /// A pacer targeting `rate` messages per second in aggregate, for a
    /// budget of `total` messages.
    #[must_use]
    pub const fn new(rate: u32, total: u64) -> Self {
        Self { rate, total }
    }

    /// Target interval between consecutive triggers.
    #[must_use]
    pub fn interval(&self) -> Duration {
        if self.rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(self.rate))
        }
    }

    /// Round-robin the message budget across `sessions`, then signal finish
    /// to every one of them.
    ///
    /// The sleep between triggers is feedback-corrected: each iteration
    /// measures the actually elapsed time and adjusts the next sleep by the
    /// deviation from the target interval, so the loop converges on the
    /// target rate instead of drifting the way a fixed sleep does under
    /// load. Sends to sessions that already terminated are ignored.
    pub async fn drive(&self, sessions: &[mpsc::Sender<SessionCommand>]) {
        if !sessions.is_empty() && self.total > 0 {
            let target = self.interval();
            let mut sleep_for = target;
            let mut mark = Instant::now();

            tracing::debug!(rate = self.rate, total = self.total, "pacing started");

            for n in 0..self.total {
                let slot = (n % sessions.len() as u64) as usize;
                let _ = sessions[slot].send(SessionCommand::Send).await;

                tokio::time::sleep(sleep_for).await;
                let actual = mark.elapsed();
                mark = Instant::now();
                sleep_for = if actual > target {
                    sleep_for.saturating_sub(actual - target)
                } else {
                    sleep_for + (target - actual)
                };
            }
        }

        for session in sessions {
            let _ = session.send(SessionCommand::Finish).await;
        }
    }
}
