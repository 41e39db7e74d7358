//! # pushbench - Concurrency-Ramp Load Harness
//!
//! `pushbench` load-tests push-messaging echo/broadcast servers that speak a
//! minimal tagged text-frame protocol. It opens many simultaneous client
//! sessions, drives each through a ping/pong exchange correlated by an
//! embedded identity key, and aggregates throughput and latency per
//! concurrency level.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pushbench::{Pacing, RampController, RunConfig, TcpConnect};
//!
//! let config = RunConfig {
//!     ramps: vec![5, 25, 50],
//!     pacing: Pacing::SelfPaced {
//!         session_duration: std::time::Duration::from_secs(10),
//!     },
//!     ..RunConfig::default()
//! };
//! let controller = RampController::new(TcpConnect::new(addr), config)?;
//! let ramps = controller.run_with(|ramp| println!("{ramp}")).await;
//! ```

pub mod config;
pub mod connect;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod ramp;
pub mod session;
pub mod stats;

pub use config::{Pacing, RunConfig, DEFAULT_RAMPS};
pub use connect::{Connect, TcpConnect};
pub use driver::Pacer;
pub use error::{Error, FailureKind, Result};
pub use protocol::{encode_ping, Entry, Frame, FrameCodec};
pub use ramp::RampController;
pub use session::{
    ClientIdentity, ClientSession, SessionCommand, SessionResult, SessionState, SessionStatus,
};
pub use stats::RampResult;
