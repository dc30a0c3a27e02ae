//! Networking: TCP transport and the line-oriented wire protocol
//!
//! This module provides:
//! - A TCP server for hosting games (well-known port 5555)
//! - A TCP client for joining games by address
//! - Newline-framed UTF-8 text protocol with buffered carry-over framing
//!
//! Each connection gets a reader thread and a writer thread; the rest of
//! the program talks to them through channels and never blocks on a
//! socket.

pub mod client;
pub mod peer;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use server::{Server, ServerEvent, DEFAULT_PORT};
