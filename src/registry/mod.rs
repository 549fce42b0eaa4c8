//! VLAN registry for group-broadcast routing
//!
//! The registry is the only shared mutable state in the relay. It tracks two
//! maps under a single lock: client id → connection entry, and VLAN id → the
//! set of member client ids. Keeping both maps in one mutual-exclusion
//! domain guarantees a membership snapshot never names a client whose entry
//! was already removed.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<VlanRegistry>
//!                 ┌─────────────────────────────┐
//!                 │ clients: HashMap<ClientId,  │
//!                 │   ClientEntry { outbox }>   │
//!                 │ vlans: HashMap<VlanId,      │
//!                 │   HashSet<ClientId>>        │
//!                 └──────────────┬──────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!       [Sender]            [Member]            [Member]
//!       broadcast()         outbox.recv()       outbox.recv()
//!            │                   │                   │
//!            └──► snapshot ──► outbox.send() ──► TCP write
//! ```
//!
//! Dispatch clones [`bytes::Bytes`] payloads, so fan-out to N members shares
//! one allocation.

pub mod entry;
pub mod store;

pub use entry::ClientEntry;
pub use store::VlanRegistry;
