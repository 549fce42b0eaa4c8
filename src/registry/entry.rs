//! Per-client registry entry

use bytes::Bytes;
use tokio::sync::mpsc;

/// Entry for a single registered client
///
/// The outbox sender is the dispatch handle for this client; the matching
/// receiver is owned by the client's connection task, which performs all
/// writes to the socket. Dropping the last sender closes the outbox and
/// shuts the owning connection down.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    /// VLAN the client belongs to, fixed at registration
    pub vlan_id: String,

    /// Id of the connection that owns this entry
    pub session_id: u64,

    /// Outbound dispatch handle
    pub(super) outbox: mpsc::Sender<Bytes>,
}

impl ClientEntry {
    /// Create a new entry
    pub fn new(vlan_id: impl Into<String>, session_id: u64, outbox: mpsc::Sender<Bytes>) -> Self {
        Self {
            vlan_id: vlan_id.into(),
            session_id,
            outbox,
        }
    }
}
