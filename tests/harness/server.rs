//! Mock remote for end-to-end scenarios.
//!
//! Speaks newline-delimited tagged frames: `o` on accept, `a<json array>`
//! answers, `c` to close. Behaviors cover the echo path, handshake
//! violations, immediate closes and broadcast fan-out.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the mock remote does with each connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Greet with `o`, then tag every received ping back as a message frame.
    Echo,
    /// Greet with `x` instead of the open frame, then hold the connection.
    BadGreeting,
    /// Greet with `o`, immediately send `c`, then hold the connection.
    CloseAfterOpen,
    /// Greet `clients` connections, collect one ping from each, then send a
    /// single combined message frame carrying every entry to all of them.
    Broadcast {
        /// Connections to expect before broadcasting.
        clients: usize,
    },
}

/// Mock remote listening on an ephemeral local port.
pub struct TestServer {
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn the server and return it with its bound address.
    pub async fn spawn(behavior: Behavior) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(accept_loop(listener, behavior));
        (Self { handle }, addr)
    }

    /// Stop accepting and tear down all connection tasks.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn accept_loop(listener: TcpListener, behavior: Behavior) {
    if let Behavior::Broadcast { clients } = behavior {
        broadcast_round(&listener, clients).await;
        return;
    }

    loop {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        tokio::spawn(async move {
            match behavior {
                Behavior::Echo => echo_connection(stream).await,
                Behavior::BadGreeting => greet_and_hold(stream, b"x\n").await,
                Behavior::CloseAfterOpen => greet_and_hold(stream, b"o\nc\n").await,
                Behavior::Broadcast { .. } => unreachable!(),
            }
        });
    }
}

async fn echo_connection(stream: TcpStream) {
    let (read, mut write) = stream.into_split();
    if write.write_all(b"o\n").await.is_err() {
        return;
    }
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let frame = format!("a{line}\n");
        if write.write_all(frame.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn greet_and_hold(mut stream: TcpStream, greeting: &[u8]) {
    if stream.write_all(greeting).await.is_err() {
        return;
    }
    // Hold the connection open so the client reads the greeting rather than
    // a reset; the task dies with the server.
    std::future::pending::<()>().await;
}

/// Accept `clients` connections, read one ping from each, then fan the
/// combined entries out to everyone in a single message frame.
async fn broadcast_round(listener: &TcpListener, clients: usize) {
    let mut readers = Vec::with_capacity(clients);
    let mut writers = Vec::with_capacity(clients);
    for _ in 0..clients {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let (read, mut write) = stream.into_split();
        if write.write_all(b"o\n").await.is_err() {
            return;
        }
        readers.push(BufReader::new(read).lines());
        writers.push(write);
    }

    let mut entries: Vec<String> = Vec::with_capacity(clients);
    for lines in &mut readers {
        let Ok(Some(line)) = lines.next_line().await else {
            return;
        };
        let strings: Vec<String> = serde_json::from_str(&line).unwrap();
        entries.extend(strings);
    }

    let frame = format!("a{}\n", serde_json::to_string(&entries).unwrap());
    for write in &mut writers {
        let _ = write.write_all(frame.as_bytes()).await;
    }

    // Keep the connections open while the sessions drain and close.
    std::future::pending::<()>().await;
}
