//! Transport establishment seam.
//!
//! Sessions and the ramp controller are generic over [`Connect`] so the same
//! machinery runs against a live TCP endpoint or an in-process stand-in.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Produces fresh duplex transports, one per session.
///
/// Implementations are cloned into every session task, so they must be cheap
/// to clone and safe to share.
pub trait Connect: Clone + Send + Sync + 'static {
    /// The duplex stream this connector yields.
    type Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Establish one new transport connection.
    fn connect(&self) -> impl Future<Output = io::Result<Self::Transport>> + Send;
}

/// Connects to a TCP endpoint, one stream per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConnect {
    addr: SocketAddr,
}

impl TcpConnect {
    /// Connector for the given remote address.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// The remote address this connector dials.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Connect for TcpConnect {
    type Transport = TcpStream;

    fn connect(&self) -> impl Future<Output = io::Result<TcpStream>> + Send {
        let addr = self.addr;
        async move {
            let stream = TcpStream::connect(addr).await?;
            // Latency measurements would otherwise be dominated by Nagle.
            stream.set_nodelay(true)?;
            Ok(stream)
        }
    }
}
