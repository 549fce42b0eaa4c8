//! VLAN-style group broadcast relay
//!
//! Clients register into named groups ("VLANs") over persistent TCP
//! connections; any message one member sends is relayed to every other
//! member of the same VLAN. The wire format is newline-delimited JSON: the
//! first frame on a connection is a registration declaring `client_id` and
//! `vlan_id`, and every frame after it is an opaque application payload
//! forwarded verbatim to the sender's VLAN peers.
//!
//! # Server
//!
//! ```no_run
//! use vlan_rs::{RelayServer, ServerConfig};
//!
//! # async fn example() -> vlan_rs::error::Result<()> {
//! let server = RelayServer::bind(ServerConfig::default()).await?;
//! server.run().await
//! # }
//! ```
//!
//! # Client
//!
//! ```no_run
//! use vlan_rs::client::{ClientConfig, RelayClient};
//!
//! # async fn example() -> vlan_rs::error::Result<()> {
//! let (mut client, mut events) = RelayClient::connect(
//!     ClientConfig::new("node-1", "floor1"),
//! )
//! .await?;
//!
//! client.send(&serde_json::json!({ "msg": "hi" })).await?;
//! if let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Delivery is best-effort: there is no persistence, no acknowledgement,
//! and no ordering guarantee across senders.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use client::{ClientConfig, ClientEvent, RelayClient};
pub use error::{Error, Result};
pub use protocol::Registration;
pub use registry::VlanRegistry;
pub use server::{RelayServer, ServerConfig};
pub use stats::{RelayStats, StatsSnapshot};
