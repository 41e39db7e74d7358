//! Newline-framed transport codec.
//!
//! Frames travel as newline-delimited text records over the duplex byte
//! stream. Reads accumulate into a [`BytesMut`] and split on `'\n'`; writes
//! append the delimiter and flush.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::{encode_ping, Frame};

/// Frames larger than this abort the session rather than growing the buffer.
const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

/// Framed codec over an async duplex stream.
#[derive(Debug)]
pub struct FrameCodec<T> {
    io: T,
    read_buf: BytesMut,
    max_frame_size: usize,
}

impl<T> FrameCodec<T> {
    /// Wrap a stream with the default frame size limit.
    #[must_use]
    pub fn new(io: T) -> Self {
        Self::with_max_frame_size(io, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Wrap a stream with a custom frame size limit.
    #[must_use]
    pub fn with_max_frame_size(io: T, max_frame_size: usize) -> Self {
        Self {
            io,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            max_frame_size,
        }
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> FrameCodec<T> {
    /// Read and decode the next frame.
    ///
    /// Cancellation-safe: partially received data stays buffered and the
    /// next call resumes from it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] on transport failure or end-of-stream before a
    /// delimiter, [`Error::Decode`] on an undecodable or oversized frame.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') {
                let mut line = self.read_buf.split_to(pos + 1);
                line.truncate(pos);
                return Frame::decode(&line);
            }

            if self.read_buf.len() > self.max_frame_size {
                return Err(Error::Decode(format!(
                    "frame exceeds maximum size: {} bytes (max: {})",
                    self.read_buf.len(),
                    self.max_frame_size
                )));
            }

            self.read_buf.reserve(READ_CHUNK);
            let n = self.io.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::Io("unexpected end of stream".into()));
            }
        }
    }

    /// Encode and send one ping frame, flushing the stream.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] on transport failure.
    pub async fn send_ping(&mut self, identity: u64, timestamp_ns: u64) -> Result<()> {
        let mut line = encode_ping(identity, timestamp_ns).into_bytes();
        line.push(b'\n');
        self.io.write_all(&line).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Shut down the write half of the transport.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the shutdown itself fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}
