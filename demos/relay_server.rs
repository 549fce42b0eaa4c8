//! Relay server demo
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                 # binds to 0.0.0.0:5000
//!   cargo run --example relay_server localhost       # binds to 127.0.0.1:5000
//!   cargo run --example relay_server 127.0.0.1:6000  # binds to 127.0.0.1:6000
//!
//! If the port is taken, the next port is tried once before giving up.
//!
//! Talk to it with the relay_client example, or with netcat:
//!   nc localhost 5000
//!   {"client_id":"nc-1","vlan_id":"floor1"}
//!   {"msg":"hello floor1"}

use std::sync::Arc;
use std::time::Duration;

use vlan_rs::{RelayServer, ServerConfig};

fn parse_config(arg: Option<String>) -> ServerConfig {
    match arg.as_deref() {
        None => ServerConfig::default(),
        Some("localhost") => ServerConfig::default().host("127.0.0.1"),
        Some(addr) => match addr.split_once(':') {
            Some((host, port)) => {
                let port = port.parse().expect("invalid port");
                ServerConfig::with_addr(host, port)
            }
            None => ServerConfig::default().host(addr),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = parse_config(std::env::args().nth(1));
    let server = RelayServer::bind(config).await?;

    let stats = Arc::clone(server.stats());
    let registry = Arc::clone(server.registry());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(10));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = stats.snapshot();
            let vlans = registry.vlan_count().await;
            tracing::info!(
                active = snapshot.active_connections,
                vlans,
                relayed = snapshot.messages_relayed,
                failed = snapshot.delivery_failures,
                "Relay stats"
            );
        }
    });

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
