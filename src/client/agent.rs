//! Relay client agent
//!
//! Connects to a relay server, registers into a VLAN, and then runs two
//! independent paths: `send` writes application payloads at any time, while
//! a spawned receive task continuously reads inbound payloads and surfaces
//! them as [`ClientEvent`]s until the connection closes.

use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::protocol::codec::{decode, encode, read_frame, write_frame};
use crate::protocol::message::Registration;

use super::config::ClientConfig;

/// Events from the relay client's receive path
#[derive(Debug)]
pub enum ClientEvent {
    /// An application payload relayed from a VLAN peer
    Message(serde_json::Value),

    /// The connection closed; no further events follow
    Disconnected,
}

/// Relay client
///
/// # Example
/// ```no_run
/// use vlan_rs::client::{ClientConfig, RelayClient};
///
/// # async fn example() -> vlan_rs::error::Result<()> {
/// let config = ClientConfig::new("node-1", "floor1").port(5000);
/// let (mut client, mut events) = RelayClient::connect(config).await?;
///
/// tokio::spawn(async move {
///     while let Some(event) = events.recv().await {
///         println!("Event: {:?}", event);
///     }
/// });
///
/// client.send(&serde_json::json!({ "msg": "hi" })).await?;
/// # Ok(())
/// # }
/// ```
pub struct RelayClient {
    config: ClientConfig,
    writer: OwnedWriteHalf,
    receive_task: JoinHandle<()>,
}

impl RelayClient {
    /// Connect to the relay server and register.
    ///
    /// Returns the client and a receiver for inbound events. The server
    /// sends no registration acknowledgement, so a successful return means
    /// the registration frame was written, not that the server accepted it.
    pub async fn connect(config: ClientConfig) -> Result<(Self, mpsc::Receiver<ClientEvent>)> {
        let socket = TcpStream::connect(config.addr()).await?;
        let (read_half, write_half) = socket.into_split();
        let mut writer = write_half;

        let registration = encode(&Registration::new(&config.client_id, &config.vlan_id))
            .map_err(Error::Protocol)?;
        write_frame(&mut writer, &registration).await?;

        tracing::info!(
            client = %config.client_id,
            vlan = %config.vlan_id,
            addr = %config.addr(),
            "Connected to relay"
        );

        let (event_tx, event_rx) = mpsc::channel(256);
        let receive_task = tokio::spawn(receive_loop(
            read_half,
            event_tx,
            config.max_frame_len,
            config.client_id.clone(),
        ));

        let client = Self {
            config,
            writer,
            receive_task,
        };

        Ok((client, event_rx))
    }

    /// Send one application payload to the VLAN.
    pub async fn send<T>(&mut self, message: &T) -> Result<()>
    where
        T: Serialize,
    {
        let payload = encode(message).map_err(Error::Protocol)?;
        write_frame(&mut self.writer, &payload).await?;
        Ok(())
    }

    /// Get the client identifier
    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Get the VLAN identifier
    pub fn vlan_id(&self) -> &str {
        &self.config.vlan_id
    }

    /// Close the connection and wait for the receive path to finish.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        let _ = self.receive_task.await;
        Ok(())
    }
}

/// Receive path: read inbound payloads until the connection closes
async fn receive_loop(
    read_half: OwnedReadHalf,
    events: mpsc::Sender<ClientEvent>,
    max_frame_len: usize,
    client_id: String,
) {
    let mut reader = BufReader::new(read_half);

    loop {
        match read_frame(&mut reader, max_frame_len).await {
            Ok(Some(frame)) => match decode::<serde_json::Value>(&frame) {
                Ok(message) => {
                    if events.send(ClientEvent::Message(message)).await.is_err() {
                        // Receiver dropped; nobody is listening anymore
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(client = %client_id, error = %e, "Malformed inbound payload");
                    break;
                }
            },
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(client = %client_id, error = %e, "Receive path closed");
                break;
            }
        }
    }

    let _ = events.send(ClientEvent::Disconnected).await;
}
