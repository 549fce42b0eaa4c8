//! Relay client
//!
//! Client-side agent for the relay protocol: connect, register into a VLAN,
//! send application payloads, and drain inbound payloads on a concurrent
//! receive path.

pub mod agent;
pub mod config;

pub use agent::{ClientEvent, RelayClient};
pub use config::ClientConfig;
