//! Wire message types

use serde::{Deserialize, Serialize};

/// Registration message, the first frame on every connection
///
/// Declares the connection's client identifier and the VLAN it joins. Both
/// are fixed for the lifetime of the connection. The server sends no
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Client identifier, unique per active connection
    pub client_id: String,

    /// VLAN the client joins
    pub vlan_id: String,
}

impl Registration {
    /// Create a new registration message
    pub fn new(client_id: impl Into<String>, vlan_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            vlan_id: vlan_id.into(),
        }
    }
}
