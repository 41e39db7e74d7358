//! Minimal wire protocol: frame classification and the framed transport codec.

mod codec;
mod frame;

pub use codec::FrameCodec;
pub use frame::{encode_ping, Entry, Frame};
