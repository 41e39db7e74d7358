//! Population-level reduction of session results.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::FailureKind;
use crate::session::SessionResult;

/// Aggregate outcome of one ramp level.
///
/// Produced once per level by [`RampResult::reduce`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RampResult {
    /// Number of sessions spawned at this level.
    pub concurrency: usize,
    /// Sum of per-session send rates, messages per second.
    pub sent_rate: f64,
    /// Sum of per-session receive rates, messages per second.
    pub recv_rate: f64,
    /// Fastest round trip across all latency-bearing sessions; stays at the
    /// [`Duration::MAX`] sentinel when no session matched a pong.
    pub min_rtt: Duration,
    /// Slowest round trip across all latency-bearing sessions.
    pub max_rtt: Duration,
    /// Population latency figure: the per-session spread `max − min` summed
    /// and divided by the concurrency level. An approximation inherited
    /// from the aggregation policy, not a per-pair mean.
    pub avg_rtt: Duration,
    /// Sessions that ended `Failed`.
    pub error_count: usize,
    /// Failure counts broken down by kind; empty on a clean level.
    pub failures: BTreeMap<FailureKind, usize>,
}

impl RampResult {
    /// Reduce one level's session results into population numbers.
    ///
    /// Failed sessions are excluded from the rate and latency reductions
    /// and tallied into `error_count`/`failures`. Sessions that never
    /// matched a pong keep their latency sentinels and are excluded from
    /// the min/max/avg fold. A session with a zero-length measurement
    /// window contributes no rate.
    #[must_use]
    pub fn reduce(concurrency: usize, results: &[SessionResult]) -> Self {
        let mut sent_rate = 0.0;
        let mut recv_rate = 0.0;
        let mut min_rtt = Duration::MAX;
        let mut max_rtt = Duration::ZERO;
        let mut spread = Duration::ZERO;
        let mut error_count = 0;
        let mut failures: BTreeMap<FailureKind, usize> = BTreeMap::new();

        for result in results {
            if let Some(err) = result.status.failure() {
                error_count += 1;
                *failures.entry(err.kind()).or_default() += 1;
                continue;
            }

            let secs = result.duration().as_secs_f64();
            if secs > 0.0 {
                sent_rate += result.sent as f64 / secs;
                recv_rate += result.recv as f64 / secs;
            }

            if result.has_latency() {
                min_rtt = min_rtt.min(result.min_rtt);
                max_rtt = max_rtt.max(result.max_rtt);
                spread += result.max_rtt - result.min_rtt;
            }
        }

        let avg_rtt = if concurrency > 0 {
            spread / concurrency as u32
        } else {
            Duration::ZERO
        };

        Self {
            concurrency,
            sent_rate,
            recv_rate,
            min_rtt,
            max_rtt,
            avg_rtt,
            error_count,
            failures,
        }
    }

    /// Whether any session at this level matched a pong.
    #[must_use]
    pub fn has_latency(&self) -> bool {
        self.min_rtt != Duration::MAX
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl fmt::Display for RampResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_ms = if self.has_latency() { millis(self.min_rtt) } else { 0.0 };
        write!(
            f,
            "clients: {}, sent: {:.2}/s, recv: {:.2}/s, min_ping: {:.3}ms, max_ping: {:.3}ms, avg_ping: {:.3}ms, errors: {}",
            self.concurrency,
            self.sent_rate,
            self.recv_rate,
            min_ms,
            millis(self.max_rtt),
            millis(self.avg_rtt),
            self.error_count,
        )?;
        if !self.failures.is_empty() {
            write!(f, " [")?;
            for (i, (kind, count)) in self.failures.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{kind}: {count}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
