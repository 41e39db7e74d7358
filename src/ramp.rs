//! Ramp controller: runs the configured concurrency levels in order.
//!
//! For each level it fans out one task per session, gathers exactly one
//! result per task over a shared channel, reduces them into a [`RampResult`]
//! and hands that to the observer. Session tasks can fail; they can never
//! fail to report.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{Pacing, RunConfig};
use crate::connect::Connect;
use crate::driver::Pacer;
use crate::error::Result;
use crate::session::{
    ClientIdentity, ClientSession, SessionCommand, SessionResult, SessionStatus,
};
use crate::stats::RampResult;

/// Trigger backlog allowed per driven session before the pacer blocks.
const COMMAND_BUFFER: usize = 64;

/// Orchestrates a full run across all configured concurrency levels.
pub struct RampController<C> {
    connector: C,
    config: RunConfig,
}

impl<C: Connect> RampController<C> {
    /// Build a controller for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is rejected by [`RunConfig::validate`].
    pub fn new(connector: C, config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { connector, config })
    }

    /// Run every ramp level and return the per-level results.
    pub async fn run(self) -> Vec<RampResult> {
        self.run_with(|_| {}).await
    }

    /// Run every ramp level, invoking `observe` with each level's result as
    /// soon as it is reduced.
    pub async fn run_with<F>(self, mut observe: F) -> Vec<RampResult>
    where
        F: FnMut(&RampResult),
    {
        let mut all = Vec::with_capacity(self.config.ramps.len());
        for (i, &clients) in self.config.ramps.iter().enumerate() {
            tracing::info!(clients, "ramp level starting");
            let ramp = self.run_level(clients).await;
            tracing::info!(clients, errors = ramp.error_count, "ramp level finished");
            observe(&ramp);
            all.push(ramp);

            // Let residual load from this level die down before the next
            // one is measured.
            if i + 1 < self.config.ramps.len() && !self.config.settle_delay.is_zero() {
                tokio::time::sleep(self.config.settle_delay).await;
            }
        }
        all
    }

    async fn run_level(&self, clients: usize) -> RampResult {
        let (results_tx, mut results_rx) = mpsc::channel::<SessionResult>(clients.max(1));

        match self.config.pacing {
            Pacing::SelfPaced { session_duration } => {
                for _ in 0..clients {
                    let connector = self.connector.clone();
                    let results = results_tx.clone();
                    let connect_timeout = self.config.connect_timeout;
                    tokio::spawn(async move {
                        let result =
                            echo_session(connector, session_duration, connect_timeout).await;
                        let _ = results.send(result).await;
                    });
                }
            }
            Pacing::Driven {
                rate,
                total_messages,
            } => {
                let (ready_tx, mut ready_rx) = mpsc::channel::<()>(clients.max(1));
                let mut triggers = Vec::with_capacity(clients);
                for _ in 0..clients {
                    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
                    triggers.push(cmd_tx);
                    let connector = self.connector.clone();
                    let results = results_tx.clone();
                    let ready = ready_tx.clone();
                    let connect_timeout = self.config.connect_timeout;
                    tokio::spawn(async move {
                        let result =
                            driven_session(connector, cmd_rx, ready, connect_timeout).await;
                        let _ = results.send(result).await;
                    });
                }
                drop(ready_tx);

                // Rendezvous: pacing must not race pings against sessions
                // whose handshake is still in flight.
                for _ in 0..clients {
                    let _ = ready_rx.recv().await;
                }
                Pacer::new(rate, total_messages).drive(&triggers).await;
            }
        }
        drop(results_tx);

        // Blocking gather: exactly one result per spawned session, failed
        // or not, before anything is reduced.
        let mut results = Vec::with_capacity(clients);
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }
        debug_assert_eq!(results.len(), clients);
        RampResult::reduce(clients, &results)
    }
}

async fn echo_session<C: Connect>(
    connector: C,
    duration: Duration,
    connect_timeout: Duration,
) -> SessionResult {
    let identity = ClientIdentity::random();
    match ClientSession::establish(&connector, identity, connect_timeout).await {
        Ok(session) => session.run_echo(duration).await,
        Err(err) => {
            tracing::debug!(%identity, error = %err, "session failed before going active");
            SessionResult::begin().finish(SessionStatus::Failed(err))
        }
    }
}

async fn driven_session<C: Connect>(
    connector: C,
    commands: mpsc::Receiver<SessionCommand>,
    ready: mpsc::Sender<()>,
    connect_timeout: Duration,
) -> SessionResult {
    let identity = ClientIdentity::random();
    let session = ClientSession::establish(&connector, identity, connect_timeout).await;
    // Readiness is reported on failure too; the controller counts reports,
    // not successes.
    let _ = ready.send(()).await;
    match session {
        Ok(session) => session.run_driven(commands).await,
        Err(err) => {
            tracing::debug!(%identity, error = %err, "session failed before going active");
            SessionResult::begin().finish(SessionStatus::Failed(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FailureKind};
    use std::future::Future;
    use std::io;

    #[derive(Clone)]
    struct RefuseConnect;

    impl Connect for RefuseConnect {
        type Transport = tokio::io::DuplexStream;

        fn connect(
            &self,
        ) -> impl Future<Output = io::Result<tokio::io::DuplexStream>> + Send {
            async {
                Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))
            }
        }
    }

    fn config(ramps: Vec<usize>, pacing: Pacing) -> RunConfig {
        RunConfig {
            ramps,
            pacing,
            settle_delay: Duration::ZERO,
            connect_timeout: Duration::from_millis(200),
            worker_threads: 1,
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let bad = config(
            vec![],
            Pacing::SelfPaced {
                session_duration: Duration::from_secs(1),
            },
        );
        assert!(matches!(
            RampController::new(RefuseConnect, bad),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_remote_yields_all_failures() {
        let controller = RampController::new(
            RefuseConnect,
            config(
                vec![4],
                Pacing::SelfPaced {
                    session_duration: Duration::from_millis(10),
                },
            ),
        )
        .unwrap();

        let ramps = controller.run().await;
        assert_eq!(ramps.len(), 1);
        assert_eq!(ramps[0].concurrency, 4);
        assert_eq!(ramps[0].error_count, 4);
        assert_eq!(ramps[0].failures[&FailureKind::Connect], 4);
        assert!(!ramps[0].has_latency());
    }

    #[tokio::test]
    async fn test_driven_level_does_not_hang_on_dead_sessions() {
        // Every session fails before readiness; the rendezvous must still
        // complete and the pacer must shrug off the dead trigger channels.
        let controller = RampController::new(
            RefuseConnect,
            config(
                vec![3],
                Pacing::Driven {
                    rate: 1000,
                    total_messages: 30,
                },
            ),
        )
        .unwrap();

        let ramps = controller.run().await;
        assert_eq!(ramps[0].error_count, 3);
        assert_eq!(ramps[0].sent_rate, 0.0);
    }

    #[tokio::test]
    async fn test_observer_sees_every_level() {
        let controller = RampController::new(
            RefuseConnect,
            config(
                vec![1, 2],
                Pacing::SelfPaced {
                    session_duration: Duration::from_millis(10),
                },
            ),
        )
        .unwrap();

        let mut seen = Vec::new();
        let ramps = controller.run_with(|r| seen.push(r.concurrency)).await;
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(ramps.len(), 2);
    }
}
