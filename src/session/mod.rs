//! Client session: one simulated client's connect-through-teardown lifecycle.

mod identity;
mod result;
#[allow(clippy::module_inception)]
mod session;
mod state;

pub use identity::ClientIdentity;
pub use result::{SessionResult, SessionStatus};
pub use session::{ClientSession, SessionCommand};
pub use state::SessionState;
