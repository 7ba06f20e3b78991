//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - One thread per connection, bounded by `max_connections`
//! - Commands routed through Engine
//! - `RemoteExecutor` on the client side: one round-trip per procedure

mod client;
mod connection;
mod server;

pub use client::{Client, RemoteExecutor};
pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
