//! Relay client demo
//!
//! Run with: cargo run --example relay_client <CLIENT_ID> <VLAN_ID> [SERVER_ADDR]
//!
//! Examples:
//!   cargo run --example relay_client alice floor1
//!   cargo run --example relay_client bob floor1 127.0.0.1:6000
//!
//! Every line typed on stdin is sent to the VLAN; messages from VLAN peers
//! are printed as they arrive.

use tokio::io::{AsyncBufReadExt, BufReader};

use vlan_rs::client::{ClientConfig, ClientEvent, RelayClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let client_id = args.next().expect("usage: relay_client <CLIENT_ID> <VLAN_ID> [ADDR]");
    let vlan_id = args.next().expect("usage: relay_client <CLIENT_ID> <VLAN_ID> [ADDR]");

    let mut config = ClientConfig::new(&client_id, &vlan_id);
    if let Some(addr) = args.next() {
        let (host, port) = addr.split_once(':').expect("ADDR must be host:port");
        config = config.host(host).port(port.parse()?);
    }

    let (mut client, mut events) = RelayClient::connect(config).await?;
    println!("connected as {client_id} on vlan {vlan_id}; type to broadcast");

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::Message(message) => println!("<< {message}"),
                ClientEvent::Disconnected => {
                    println!("disconnected");
                    std::process::exit(0);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        client
            .send(&serde_json::json!({ "from": client_id, "msg": text }))
            .await?;
    }

    client.close().await?;
    Ok(())
}
