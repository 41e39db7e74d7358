//! Test harness utilities for end-to-end harness scenarios.
//!
//! Provides a mock remote speaking the tagged text-frame protocol, spawned
//! on an ephemeral port so scenarios run hermetically.

mod server;

pub use server::{Behavior, TestServer};
