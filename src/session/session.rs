//! The client session itself: handshake, exchange loop, teardown.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::connect::Connect;
use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameCodec};
use crate::session::{ClientIdentity, SessionResult, SessionState, SessionStatus};

/// Trigger issued to an externally-paced session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Emit one ping now.
    Send,
    /// Stop sending, drain in-flight pings, then terminate.
    Finish,
}

/// The single in-flight ping of a self-paced session.
///
/// Created when a ping is written, consumed when a matching pong arrives;
/// the session never sends while one exists.
struct PendingPing {
    timestamp_ns: u64,
}

/// One logical client connection, from handshake to teardown.
///
/// Obtained through [`ClientSession::establish`] (or [`ClientSession::open`]
/// for an already-connected transport) and consumed by one of the run
/// methods, each of which always yields exactly one [`SessionResult`].
#[derive(Debug)]
pub struct ClientSession<T> {
    codec: FrameCodec<T>,
    identity: ClientIdentity,
    state: SessionState,
}

impl<T> ClientSession<T> {
    /// This session's correlation key.
    #[must_use]
    pub const fn identity(&self) -> ClientIdentity {
        self.identity
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> ClientSession<T> {
    /// Connect and handshake, bounded by `limit`.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] if the transport cannot be established,
    /// [`Error::Handshake`] if the first frame is not an open frame,
    /// [`Error::Timeout`] if the whole phase exceeds `limit`.
    pub async fn establish<C>(
        connector: &C,
        identity: ClientIdentity,
        limit: Duration,
    ) -> Result<Self>
    where
        C: Connect<Transport = T>,
    {
        let setup = async {
            let io = connector
                .connect()
                .await
                .map_err(|e| Error::Connect(e.to_string()))?;
            Self::open(io, identity).await
        };
        match tokio::time::timeout(limit, setup).await {
            Ok(session) => session,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Handshake over an already-open transport: read exactly one frame,
    /// which must be the open acknowledgement.
    ///
    /// # Errors
    ///
    /// [`Error::Handshake`] on any other frame, decode failure, or read
    /// failure before the open frame.
    pub async fn open(io: T, identity: ClientIdentity) -> Result<Self> {
        let mut codec = FrameCodec::new(io);
        match codec.read_frame().await {
            Ok(Frame::Open) => {}
            Ok(frame) => {
                return Err(Error::Handshake(format!(
                    "expected open frame, got {}",
                    frame.kind()
                )));
            }
            Err(err) => return Err(Error::Handshake(err.to_string())),
        }
        Ok(Self {
            codec,
            identity,
            state: SessionState::Active,
        })
    }

    /// Self-paced exchange: ping, await the matching pong, repeat until the
    /// duration elapses. Always returns a result; failures are folded into
    /// its status.
    pub async fn run_echo(mut self, duration: Duration) -> SessionResult {
        let mut result = SessionResult::begin();
        let status = match self.echo_loop(&mut result, duration).await {
            Ok(()) => SessionStatus::Completed,
            Err(err) => SessionStatus::Failed(err),
        };
        self.close().await;
        result.finish(status)
    }

    /// Externally-paced exchange: react to [`SessionCommand`]s while
    /// continuously receiving, then drain in-flight pings on finish. Always
    /// returns a result; failures are folded into its status.
    pub async fn run_driven(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> SessionResult {
        let mut result = SessionResult::begin();
        let status = match self.driven_loop(&mut result, &mut commands).await {
            Ok(()) => SessionStatus::Completed,
            Err(err) => SessionStatus::Failed(err),
        };
        self.close().await;
        result.finish(status)
    }

    async fn echo_loop(&mut self, result: &mut SessionResult, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let identity = self.identity.get();

        while Instant::now() < deadline {
            debug_assert!(self.state.can_send());
            let ts = unix_nanos();
            self.codec.send_ping(identity, ts).await?;
            result.record_sent();
            let mut pending = Some(PendingPing { timestamp_ns: ts });

            // Block until the current ping is answered. Entries tagged for
            // other clients in the same broadcast frame are ignored; a stray
            // open frame mid-stream is ignored too.
            while pending.is_some() {
                match self.codec.read_frame().await? {
                    Frame::Message(entries) => {
                        let now = unix_nanos();
                        let mut matched = false;
                        for entry in entries.iter().filter(|e| e.identity == identity) {
                            result.record_pong(entry.rtt(now));
                            matched = true;
                        }
                        if matched {
                            pending = None;
                        }
                    }
                    Frame::Close => {
                        if let Some(ping) = pending.take() {
                            tracing::debug!(
                                identity = %self.identity,
                                age_ns = unix_nanos().saturating_sub(ping.timestamp_ns),
                                "remote closed with a ping in flight"
                            );
                        }
                        return Ok(());
                    }
                    Frame::Open => {}
                }
            }
        }
        Ok(())
    }

    async fn driven_loop(
        &mut self,
        result: &mut SessionResult,
        commands: &mut mpsc::Receiver<SessionCommand>,
    ) -> Result<()> {
        let identity = self.identity.get();
        let mut outstanding: u64 = 0;
        let mut finishing = false;

        loop {
            // In-flight pings are drained before terminating so the final
            // statistics are not truncated.
            if finishing && outstanding == 0 {
                return Ok(());
            }

            tokio::select! {
                cmd = commands.recv(), if !finishing => {
                    match cmd {
                        Some(SessionCommand::Send) => {
                            debug_assert!(self.state.can_send());
                            let ts = unix_nanos();
                            self.codec.send_ping(identity, ts).await?;
                            result.record_sent();
                            outstanding += 1;
                        }
                        Some(SessionCommand::Finish) | None => finishing = true,
                    }
                }
                frame = self.codec.read_frame() => {
                    match frame? {
                        Frame::Message(entries) => {
                            let now = unix_nanos();
                            for entry in entries.iter().filter(|e| e.identity == identity) {
                                result.record_pong(entry.rtt(now));
                                outstanding = outstanding.saturating_sub(1);
                            }
                        }
                        // Normal termination even with pings in flight.
                        Frame::Close => return Ok(()),
                        Frame::Open => {}
                    }
                }
            }
        }
    }

    /// Release the transport, best effort.
    async fn close(&mut self) {
        self.state = SessionState::Closing;
        if let Err(err) = self.codec.shutdown().await {
            tracing::debug!(identity = %self.identity, error = %err, "transport release failed");
        }
        self.state = SessionState::Done;
    }
}

/// Wall-clock nanoseconds since the epoch, as embedded in ping payloads.
fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
