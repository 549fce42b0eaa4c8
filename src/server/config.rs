//! Server configuration

use std::time::Duration;

use crate::protocol::codec::DEFAULT_MAX_FRAME_LEN;

/// Default listening port; `port + 1` is tried once if it is taken
pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to; on failure the next port is tried exactly once
    pub port: u16,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Registration must arrive within this time of the connection opening
    pub registration_timeout: Duration,

    /// Per-client outbox depth; dispatch to a client with a full outbox
    /// waits until the client's writer drains it
    pub outbox_capacity: usize,

    /// Maximum length of a single frame in bytes
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tcp_nodelay: true, // Important for small relay payloads
            registration_timeout: Duration::from_secs(10),
            outbox_capacity: 64,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    /// Create a new config with a custom host and port
    pub fn with_addr(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the registration timeout
    pub fn registration_timeout(mut self, timeout: Duration) -> Self {
        self.registration_timeout = timeout;
        self
    }

    /// Set the per-client outbox capacity
    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }

    /// Set the maximum frame length
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// The configured bind address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The fallback bind address tried once if the configured port is taken
    pub fn fallback_addr(&self) -> String {
        format!("{}:{}", self.host, self.port.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.tcp_nodelay);
        assert_eq!(config.registration_timeout, Duration::from_secs(10));
        assert_eq!(config.outbox_capacity, 64);
        assert_eq!(config.max_frame_len, DEFAULT_MAX_FRAME_LEN);
    }

    #[test]
    fn test_with_addr() {
        let config = ServerConfig::with_addr("127.0.0.1", 6000);

        assert_eq!(config.bind_addr(), "127.0.0.1:6000");
        assert_eq!(config.fallback_addr(), "127.0.0.1:6001");
    }

    #[test]
    fn test_builder_chaining() {
        let config = ServerConfig::default()
            .host("127.0.0.1")
            .port(7000)
            .registration_timeout(Duration::from_secs(3))
            .outbox_capacity(16)
            .max_frame_len(1024);

        assert_eq!(config.bind_addr(), "127.0.0.1:7000");
        assert_eq!(config.registration_timeout, Duration::from_secs(3));
        assert_eq!(config.outbox_capacity, 16);
        assert_eq!(config.max_frame_len, 1024);
    }

    #[test]
    fn test_outbox_capacity_floor() {
        let config = ServerConfig::default().outbox_capacity(0);

        assert_eq!(config.outbox_capacity, 1);
    }
}
