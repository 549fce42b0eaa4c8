//! Relay connection handler
//!
//! Owns one accepted connection for its full lifetime: the registration
//! handshake, the relay loop, and cleanup. Cleanup runs on every exit path
//! (normal close, protocol violation, or I/O error) so a dying connection
//! never strands its registry entry.
//!
//! Reads and writes are split: the handler task reads inbound frames and
//! hands them to the registry dispatcher, while a spawned writer task drains
//! the client's outbox to the socket. The outbox closing (registration
//! superseded, or the registry entry removed) stops the writer, which in
//! turn stops the handler.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::codec::{decode, read_frame, write_frame};
use crate::protocol::message::Registration;
use crate::registry::VlanRegistry;
use crate::server::config::ServerConfig;
use crate::stats::RelayStats;

/// Lifecycle phase of a relay connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Waiting for the registration frame
    AwaitingRegistration,
    /// Registered; relaying application payloads
    Relaying,
    /// Terminal; cleanup has run and the connection is closed
    Closed,
}

impl ConnectionPhase {
    /// Check whether the connection has terminated
    pub fn is_terminal(self) -> bool {
        self == ConnectionPhase::Closed
    }
}

/// Handler for one accepted relay connection
pub struct Connection {
    session_id: u64,
    peer_addr: SocketAddr,
    config: ServerConfig,
    registry: Arc<VlanRegistry>,
    stats: Arc<RelayStats>,
    phase: ConnectionPhase,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        session_id: u64,
        peer_addr: SocketAddr,
        config: ServerConfig,
        registry: Arc<VlanRegistry>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            session_id,
            peer_addr,
            config,
            registry,
            stats,
            phase: ConnectionPhase::AwaitingRegistration,
        }
    }

    /// Get the connection's lifecycle phase
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Run the connection to completion
    ///
    /// The socket closes when both halves drop.
    pub async fn run(&mut self, socket: TcpStream) -> Result<()> {
        let (read_half, write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);

        let registration = match self.await_registration(&mut reader).await {
            Ok(registration) => registration,
            Err(e) => {
                // Never registered, so there is nothing to clean up
                self.phase = ConnectionPhase::Closed;
                tracing::debug!(
                    session = self.session_id,
                    peer = %self.peer_addr,
                    error = %e,
                    "Connection closed before registration"
                );
                return Err(e);
            }
        };

        let (outbox_tx, outbox_rx) = mpsc::channel(self.config.outbox_capacity);
        self.registry
            .register(
                &registration.client_id,
                &registration.vlan_id,
                self.session_id,
                outbox_tx,
            )
            .await;
        self.stats.registration();
        self.phase = ConnectionPhase::Relaying;

        let mut writer_task = tokio::spawn(drain_outbox(
            write_half,
            outbox_rx,
            registration.client_id.clone(),
        ));

        let result = self
            .relay_loop(&mut reader, &registration, &mut writer_task)
            .await;

        // Closed: exactly one unregister, on every exit path of the loop.
        // If this registration was superseded, the session id check inside
        // makes this a no-op.
        self.registry
            .unregister(
                &registration.client_id,
                &registration.vlan_id,
                self.session_id,
            )
            .await;
        self.phase = ConnectionPhase::Closed;

        tracing::debug!(
            session = self.session_id,
            client = %registration.client_id,
            vlan = %registration.vlan_id,
            "Connection closed"
        );

        result
    }

    /// Read and decode the registration frame
    ///
    /// EOF, a malformed frame, and an expired timeout all refuse the
    /// connection.
    async fn await_registration<R>(&self, reader: &mut R) -> Result<Registration>
    where
        R: AsyncBufRead + Unpin,
    {
        let read = timeout(
            self.config.registration_timeout,
            read_frame(reader, self.config.max_frame_len),
        )
        .await
        .map_err(|_| ProtocolError::RegistrationTimeout)?
        .map_err(Error::from_read)?;

        let frame = read.ok_or(Error::Protocol(ProtocolError::ConnectionClosed))?;
        let registration: Registration = decode(&frame).map_err(Error::Protocol)?;

        tracing::info!(
            session = self.session_id,
            peer = %self.peer_addr,
            client = %registration.client_id,
            vlan = %registration.vlan_id,
            "Registration received"
        );

        Ok(registration)
    }

    /// Relay inbound frames until the peer closes, a frame is malformed, or
    /// the writer stops
    ///
    /// The writer-stop arm is the only branch that can cancel an in-flight
    /// read, and it terminates the connection; a partially buffered frame is
    /// never dropped and then read past.
    async fn relay_loop<R>(
        &self,
        reader: &mut R,
        registration: &Registration,
        writer_task: &mut JoinHandle<()>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            select! {
                inbound = read_frame(reader, self.config.max_frame_len) => {
                    match inbound {
                        Ok(Some(frame)) => {
                            // A relayed payload must at least be one JSON
                            // document; its contents are opaque and are
                            // forwarded verbatim.
                            decode::<serde::de::IgnoredAny>(&frame).map_err(Error::Protocol)?;

                            let (delivered, failed) = self
                                .registry
                                .broadcast(
                                    &registration.vlan_id,
                                    &registration.client_id,
                                    frame,
                                )
                                .await;
                            self.stats.message_relayed(delivered, failed);
                        }
                        Ok(None) => {
                            tracing::debug!(
                                client = %registration.client_id,
                                "Peer closed connection"
                            );
                            return Ok(());
                        }
                        Err(e) => return Err(Error::from_read(e)),
                    }
                }
                _ = &mut *writer_task => {
                    // Writer stopped: the outbox was closed (registration
                    // superseded) or a write failed. Either way this
                    // connection is done.
                    tracing::debug!(
                        client = %registration.client_id,
                        "Writer stopped, terminating connection"
                    );
                    return Ok(());
                }
            }
        }
    }
}

/// Drain a client's outbox to its socket
///
/// Runs as its own task so dispatch to this client never blocks on the
/// client's read loop. Exits when the outbox closes or a write fails.
async fn drain_outbox(
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::Receiver<Bytes>,
    client_id: String,
) {
    while let Some(payload) = outbox.recv().await {
        if let Err(e) = write_frame(&mut writer, &payload).await {
            tracing::warn!(client = %client_id, error = %e, "Write failed, dropping connection");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_terminality() {
        assert!(!ConnectionPhase::AwaitingRegistration.is_terminal());
        assert!(!ConnectionPhase::Relaying.is_terminal());
        assert!(ConnectionPhase::Closed.is_terminal());
    }
}
