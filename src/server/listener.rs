//! Relay server listener
//!
//! Handles the TCP accept loop and spawns one connection handler per
//! accepted connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::registry::VlanRegistry;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::stats::RelayStats;

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    listener: TcpListener,
    registry: Arc<VlanRegistry>,
    stats: Arc<RelayStats>,
    next_session_id: AtomicU64,
}

impl RelayServer {
    /// Bind the listening endpoint
    ///
    /// Attempts the configured port; if that fails, tries the next port
    /// exactly once. A second failure is fatal and aborts startup.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = match TcpListener::bind(config.bind_addr()).await {
            Ok(listener) => listener,
            Err(e) => {
                let fallback = config.fallback_addr();
                tracing::warn!(
                    addr = %config.bind_addr(),
                    error = %e,
                    "Bind failed, trying next port"
                );
                TcpListener::bind(&fallback)
                    .await
                    .map_err(|source| Error::Bind {
                        addr: fallback,
                        source,
                    })?
            }
        };

        tracing::info!(addr = %listener.local_addr()?, "Relay server listening");

        Ok(Self {
            config,
            listener,
            registry: Arc::new(VlanRegistry::new()),
            stats: Arc::new(RelayStats::new()),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Get a reference to the VLAN registry
    pub fn registry(&self) -> &Arc<VlanRegistry> {
        &self.registry
    }

    /// Get a reference to the relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Get the bound address, including any fallback port that was taken
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server
    ///
    /// Accepts connections until the process shuts down. Accept errors are
    /// logged and do not stop the loop.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.run() => result,
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        self.stats.connection_opened();

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let mut connection = Connection::new(
                session_id,
                peer_addr,
                config,
                registry,
                Arc::clone(&stats),
            );

            if let Err(e) = connection.run(socket).await {
                tracing::debug!(
                    session = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            stats.connection_closed();
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }
}
