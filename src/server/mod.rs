//! Relay server
//!
//! The server side of the relay: listening endpoint with a bounded port
//! fallback, the accept loop, per-connection handlers, and configuration.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use connection::{Connection, ConnectionPhase};
pub use listener::RelayServer;
