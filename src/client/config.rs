//! Client configuration

use crate::protocol::codec::DEFAULT_MAX_FRAME_LEN;
use crate::server::config::DEFAULT_PORT;

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client identifier sent in the registration frame
    pub client_id: String,

    /// VLAN to join
    pub vlan_id: String,

    /// Relay server host
    pub host: String,

    /// Relay server port
    pub port: u16,

    /// Maximum length of a single inbound frame in bytes
    pub max_frame_len: usize,
}

impl ClientConfig {
    /// Create a new config for the given identity and VLAN
    pub fn new(client_id: impl Into<String>, vlan_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            vlan_id: vlan_id.into(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The server address as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
